//! Core domain types and the pure matching engine: catalog records, snapshots,
//! candidate reconciliation, and summary counters. No IO.

pub mod matching;
pub mod model;
pub mod reconcile;
pub mod snapshot;
pub mod summary;

pub use matching::{
    CandidatePairing, Confidence, MatchResult, REASON_DEMOTED, REASON_NO_CANDIDATE,
};
pub use model::{
    Donation, ItemCategory, ItemCondition, NewDonation, NewRequest, ParseError, Request,
};
pub use reconcile::{ReconcileStats, reconcile, reconcile_with_stats};
pub use snapshot::CatalogSnapshot;
pub use summary::{Summary, summarize};
