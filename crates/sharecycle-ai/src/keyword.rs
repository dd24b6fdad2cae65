//! Rule-based scorer: category gate plus keyword overlap on descriptions.
//!
//! Each request is scored independently against every donation in its
//! category and proposes its single best fit. Two requests may therefore
//! propose the same donation; the candidate list is ordered best score
//! first so reconciliation awards contested items to the stronger fit.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sharecycle_core::{CandidatePairing, Confidence, Donation, Request};
use tracing::debug;

use crate::{Scorer, ScoringError};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "be", "but", "for", "from", "have", "i", "in", "is", "it",
    "looking", "my", "need", "needs", "of", "old", "on", "or", "the", "to", "upcoming", "with",
    "would", "appreciated", "do", "some", "something", "start", "this", "that",
];

/// Similarity at or above which a fit is reported as high confidence.
pub const HIGH_THRESHOLD: f32 = 0.5;
/// Similarity at or above which a fit is reported as medium confidence.
pub const MEDIUM_THRESHOLD: f32 = 0.2;

#[derive(Debug, Clone, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    pub fn new() -> Self {
        Self
    }
}

/// One request's best same-category donation.
struct Fit<'a> {
    request: &'a Request,
    donation: &'a Donation,
    score: f32,
    shared: Vec<String>,
}

#[async_trait]
impl Scorer for KeywordScorer {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn score(
        &self,
        donations: &[Donation],
        requests: &[Request],
    ) -> Result<Vec<CandidatePairing>, ScoringError> {
        Ok(score_catalog(donations, requests))
    }
}

fn score_catalog(donations: &[Donation], requests: &[Request]) -> Vec<CandidatePairing> {
    let donation_terms: Vec<BTreeSet<String>> =
        donations.iter().map(|d| terms(&d.description)).collect();

    let mut fits = Vec::new();
    let mut unfit = Vec::new();

    for request in requests {
        let wanted = terms(&request.description);
        let best = donations
            .iter()
            .zip(&donation_terms)
            .filter(|(d, _)| d.category == request.category)
            .map(|(d, offered)| (d, dice(&wanted, offered), shared(&wanted, offered)))
            // Keep the first donation on ties.
            .fold(None::<(&Donation, f32, Vec<String>)>, |best, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });

        match best {
            Some((donation, score, shared)) => fits.push(Fit {
                request,
                donation,
                score,
                shared,
            }),
            None => unfit.push(CandidatePairing::no_suggestion(
                &request.id,
                Some(format!("no {} donations are listed", request.category)),
            )),
        }
    }

    // Stable: equal scores keep request order.
    fits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    debug!(fits = fits.len(), unfit = unfit.len(), "keyword scoring complete");

    fits.into_iter()
        .map(|fit| {
            let reasoning = if fit.shared.is_empty() {
                format!("same category ({}), no shared keywords", fit.request.category)
            } else {
                format!(
                    "same category ({}), shared keywords: {}",
                    fit.request.category,
                    fit.shared.join(", ")
                )
            };
            CandidatePairing::suggest(
                &fit.request.id,
                &fit.donation.id,
                confidence_for(fit.score),
                reasoning,
            )
        })
        .chain(unfit)
        .collect()
}

fn confidence_for(score: f32) -> Confidence {
    if score >= HIGH_THRESHOLD {
        Confidence::High
    } else if score >= MEDIUM_THRESHOLD {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Lowercased content words with a naive plural strip ("works" → "work").
fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .map(|w| match w.strip_suffix('s') {
            Some(stem) if stem.len() > 2 && !stem.ends_with('s') => stem.to_string(),
            _ => w,
        })
        .collect()
}

/// Sørensen–Dice coefficient of two term sets.
fn dice(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let common = a.intersection(b).count();
    2.0 * common as f32 / (a.len() + b.len()) as f32
}

fn shared(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Vec<String> {
    a.intersection(b).cloned().collect()
}
