//! Point-in-time view of the catalog for one matching pass.

use chrono::{DateTime, Utc};

use crate::model::{Donation, Request};

/// Immutable donations and requests as of `taken_at`.
///
/// `revision` is the repository revision the snapshot was read at; a pass
/// compares it against the live revision before reconciling.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub donations: Vec<Donation>,
    pub requests: Vec<Request>,
    pub revision: u64,
    pub taken_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(donations: Vec<Donation>, requests: Vec<Request>, revision: u64) -> Self {
        Self {
            donations,
            requests,
            revision,
            taken_at: Utc::now(),
        }
    }

    /// Matching needs at least one donation and one request.
    pub fn is_matchable(&self) -> bool {
        !self.donations.is_empty() && !self.requests.is_empty()
    }

    pub fn donation(&self, id: &str) -> Option<&Donation> {
        self.donations.iter().find(|d| d.id == id)
    }

    pub fn request(&self, id: &str) -> Option<&Request> {
        self.requests.iter().find(|r| r.id == id)
    }
}
