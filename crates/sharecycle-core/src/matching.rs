//! Candidate pairings (scorer output) and match results (engine output).
//!
//! Both serialize with the camelCase field names the scoring collaborator
//! speaks: `requestId`, `donationId`, `confidence`, `reasoning`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ParseError;

/// Reasoning attached to a request whose candidate donation was already
/// claimed by a candidate earlier in the list.
pub const REASON_DEMOTED: &str = "a potential item was matched with a higher-priority request";

/// Reasoning attached to a request the scorer produced nothing for.
pub const REASON_NO_CANDIDATE: &str = "no suitable donation found in the current inventory.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseError::new("confidence", s)),
        }
    }
}

/// An unverified suggestion linking a request to a donation.
///
/// Untrusted: the same donation may be suggested for several requests, some
/// requests may have no pairing, and ids may not exist in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePairing {
    pub request_id: String,
    #[serde(default)]
    pub donation_id: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl CandidatePairing {
    pub fn suggest(
        request_id: impl Into<String>,
        donation_id: impl Into<String>,
        confidence: Confidence,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            donation_id: Some(donation_id.into()),
            confidence: Some(confidence),
            reasoning: Some(reasoning.into()),
        }
    }

    /// An explicit "nothing fits" answer for a request.
    pub fn no_suggestion(request_id: impl Into<String>, reasoning: Option<String>) -> Self {
        Self {
            request_id: request_id.into(),
            donation_id: None,
            confidence: None,
            reasoning,
        }
    }
}

/// Final outcome for one request: matched to a donation or explicitly unmatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub request_id: String,
    pub donation_id: Option<String>,
    pub confidence: Option<Confidence>,
    pub reasoning: String,
}

impl MatchResult {
    pub fn matched(
        request_id: impl Into<String>,
        donation_id: impl Into<String>,
        confidence: Option<Confidence>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            donation_id: Some(donation_id.into()),
            confidence,
            reasoning: reasoning.into(),
        }
    }

    pub fn unmatched(request_id: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            donation_id: None,
            confidence: None,
            reasoning: reasoning.into(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.donation_id.is_some()
    }
}
