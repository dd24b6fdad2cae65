//! Catalog records: donated items and the requests they may satisfy.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Electronics,
    Furniture,
    Clothing,
    Books,
    Kitchenware,
    Other,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 6] = [
        Self::Electronics,
        Self::Furniture,
        Self::Clothing,
        Self::Books,
        Self::Kitchenware,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Electronics => "Electronics",
            Self::Furniture => "Furniture",
            Self::Clothing => "Clothing",
            Self::Books => "Books",
            Self::Kitchenware => "Kitchenware",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::new("category", s))
    }
}

/// Physical condition of a donated item, as stated by the donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCondition {
    New,
    #[serde(rename = "Like New")]
    LikeNew,
    Good,
    Fair,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 4] = [Self::New, Self::LikeNew, Self::Good, Self::Fair];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "Like New",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

impl fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCondition {
    type Err = ParseError;

    /// Accepts the display form ("Like New") as well as "like-new" / "likenew".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().replace(' ', "").to_ascii_lowercase() == folded)
            .ok_or_else(|| ParseError::new("condition", s))
    }
}

/// A listed item available for transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,
    pub category: ItemCategory,
    pub description: String,
    pub condition: ItemCondition,
    /// Image reference: a URL or a base64 data URL.
    pub photo: String,
    pub created_at: DateTime<Utc>,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: String,
    pub donor_location: String,
}

/// A stated need for an item of a given category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub category: ItemCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub requester_name: String,
    pub requester_email: String,
    pub requester_phone: String,
    pub requester_location: String,
}

/// Donor submission. The repository assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDonation {
    pub category: ItemCategory,
    pub description: String,
    pub condition: ItemCondition,
    pub photo: String,
    pub donor_name: String,
    pub donor_email: String,
    pub donor_phone: String,
    pub donor_location: String,
}

impl NewDonation {
    pub fn into_donation(self, id: String, created_at: DateTime<Utc>) -> Donation {
        Donation {
            id,
            category: self.category,
            description: self.description,
            condition: self.condition,
            photo: self.photo,
            created_at,
            donor_name: self.donor_name,
            donor_email: self.donor_email,
            donor_phone: self.donor_phone,
            donor_location: self.donor_location,
        }
    }
}

/// Requester submission. The repository assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRequest {
    pub category: ItemCategory,
    pub description: String,
    pub requester_name: String,
    pub requester_email: String,
    pub requester_phone: String,
    pub requester_location: String,
}

impl NewRequest {
    pub fn into_request(self, id: String, created_at: DateTime<Utc>) -> Request {
        Request {
            id,
            category: self.category,
            description: self.description,
            created_at,
            requester_name: self.requester_name,
            requester_email: self.requester_email,
            requester_phone: self.requester_phone,
            requester_location: self.requester_location,
        }
    }
}
