use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sharecycle_core::{
    CatalogSnapshot, Donation, ItemCategory, NewDonation, NewRequest, Request,
};

use crate::StoreError;

/// Largest photo accepted inline as a data URL, in decoded bytes.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Browse criteria for donations: an optional category and a
/// case-insensitive description substring. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationFilter {
    pub category: Option<ItemCategory>,
    pub search: String,
}

impl DonationFilter {
    pub fn new(category: Option<ItemCategory>, search: impl Into<String>) -> Self {
        Self {
            category,
            search: search.into(),
        }
    }

    pub fn matches(&self, donation: &Donation) -> bool {
        if self.category.is_some_and(|c| c != donation.category) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || donation.description.to_lowercase().contains(&needle)
    }
}

/// Read/write access to donations and requests.
///
/// The matching engine never touches a repository; it only sees the
/// [`CatalogSnapshot`] a pass takes from one.
pub trait CatalogRepository: Send + Sync {
    /// All donations, newest first.
    fn list_donations(&self) -> Result<Vec<Donation>, StoreError>;

    /// All requests, newest first.
    fn list_requests(&self) -> Result<Vec<Request>, StoreError>;

    /// Donations passing `filter`, newest first.
    fn find_donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>, StoreError> {
        let mut donations = self.list_donations()?;
        donations.retain(|d| filter.matches(d));
        Ok(donations)
    }

    /// Validate and store a donor submission, assigning its id and timestamp.
    fn add_donation(&self, draft: NewDonation) -> Result<Donation, StoreError>;

    /// Validate and store a requester submission, assigning its id and timestamp.
    fn add_request(&self, draft: NewRequest) -> Result<Request, StoreError>;

    /// Counter bumped by every mutation.
    fn revision(&self) -> Result<u64, StoreError>;

    /// Consistent point-in-time copy of both lists and the revision.
    fn snapshot(&self) -> Result<CatalogSnapshot, StoreError>;
}

/// In-memory catalog state shared by the store implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub donations: Vec<Donation>,
    #[serde(default)]
    pub requests: Vec<Request>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.donations.is_empty() && self.requests.is_empty()
    }

    pub fn donations_newest_first(&self) -> Vec<Donation> {
        let mut out = self.donations.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn requests_newest_first(&self) -> Vec<Request> {
        let mut out = self.requests.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(
            self.donations_newest_first(),
            self.requests_newest_first(),
            self.revision,
        )
    }

    pub fn insert_donation(
        &mut self,
        draft: NewDonation,
        now: DateTime<Utc>,
    ) -> Result<Donation, StoreError> {
        require("description", &draft.description)?;
        require("photo", &draft.photo)?;
        check_photo_size(&draft.photo)?;
        require("donor name", &draft.donor_name)?;
        require_email(&draft.donor_email)?;
        require("donor phone", &draft.donor_phone)?;
        require("donor location", &draft.donor_location)?;

        let taken: HashSet<&str> = self.donations.iter().map(|d| d.id.as_str()).collect();
        let id = next_id('d', now, &taken);
        let donation = draft.into_donation(id, now);
        self.donations.push(donation.clone());
        self.revision += 1;
        Ok(donation)
    }

    pub fn insert_request(
        &mut self,
        draft: NewRequest,
        now: DateTime<Utc>,
    ) -> Result<Request, StoreError> {
        require("description", &draft.description)?;
        require("requester name", &draft.requester_name)?;
        require_email(&draft.requester_email)?;
        require("requester phone", &draft.requester_phone)?;
        require("requester location", &draft.requester_location)?;

        let taken: HashSet<&str> = self.requests.iter().map(|r| r.id.as_str()).collect();
        let id = next_id('r', now, &taken);
        let request = draft.into_request(id, now);
        self.requests.push(request.clone());
        self.revision += 1;
        Ok(request)
    }
}

fn require(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Invalid(format!("{field} is required")));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), StoreError> {
    require("email", value)?;
    if !value.contains('@') {
        return Err(StoreError::Invalid(format!("not an email address: {value}")));
    }
    Ok(())
}

/// Only inline data URLs are measured; linked images are not fetched.
fn check_photo_size(photo: &str) -> Result<(), StoreError> {
    let Some(rest) = photo.trim().strip_prefix("data:") else {
        return Ok(());
    };
    let Some((meta, payload)) = rest.split_once(',') else {
        return Err(StoreError::Invalid("photo data URL has no payload".into()));
    };
    let bytes = if meta.ends_with(";base64") {
        let padding = payload.bytes().rev().take_while(|&b| b == b'=').count();
        (payload.len() * 3 / 4).saturating_sub(padding)
    } else {
        payload.len()
    };
    if bytes > MAX_PHOTO_BYTES {
        return Err(StoreError::Invalid(format!(
            "photo is {bytes} bytes; the limit is {MAX_PHOTO_BYTES}"
        )));
    }
    Ok(())
}

/// `<prefix><unix-millis>`, bumped past any id already in use.
fn next_id(prefix: char, now: DateTime<Utc>, taken: &HashSet<&str>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let id = format!("{prefix}{millis}");
        if !taken.contains(id.as_str()) {
            return id;
        }
        millis += 1;
    }
}
