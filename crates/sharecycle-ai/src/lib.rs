//! Scoring layer: turns a catalog snapshot into candidate pairings.
//!
//! The [`Scorer`] capability is the boundary between semantic judgement and
//! the reconciliation engine. Implementations may disagree with each other and
//! may return conflicting or incomplete candidates; the engine copes with both.

mod error;
mod gemini;
mod keyword;
mod parse;
mod prompt;

pub use error::ScoringError;
pub use gemini::{DEFAULT_MODEL, GeminiScorer, ScoringConfig};
pub use keyword::KeywordScorer;
pub use parse::parse_candidates;
pub use prompt::{build_prompt, response_schema};

use async_trait::async_trait;
use sharecycle_core::{CandidatePairing, Donation, Request};

/// Produces candidate request→donation pairings, best first.
///
/// The order of the returned list is significant: when two candidates name
/// the same donation, the earlier one wins.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Short identifier used in logs and audit records.
    fn name(&self) -> &str;

    async fn score(
        &self,
        donations: &[Donation],
        requests: &[Request],
    ) -> Result<Vec<CandidatePairing>, ScoringError>;
}
