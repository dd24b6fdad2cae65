//! Reconciliation of untrusted candidate pairings into a final assignment.
//!
//! The output holds exactly one [`MatchResult`] per distinct request id and
//! never assigns the same donation twice, whatever the candidate list holds.
//!
//! # Algorithm
//!
//! 1. Walk the candidates in the order the scorer returned them. That order
//!    is the scorer's own priority ranking, so the first claim on a donation wins.
//! 2. A candidate naming an unclaimed donation is accepted and claims it.
//!    One naming a claimed donation demotes its request to unmatched.
//! 3. A candidate with no donation passes through as unmatched.
//! 4. Requests that received no entry are appended as unmatched, in request order.
//!
//! Candidates for request ids outside `requests`, and repeat candidates for a
//! request already handled, are skipped without claiming their donation.

use std::collections::HashSet;

use tracing::debug;

use crate::matching::{CandidatePairing, MatchResult, REASON_DEMOTED, REASON_NO_CANDIDATE};
use crate::model::Request;

/// Counters describing how the candidate list was resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Candidates whose donation was accepted.
    pub accepted: usize,
    /// Candidates demoted because their donation was already claimed.
    pub demoted: usize,
    /// Candidates that carried no donation.
    pub declined: usize,
    /// Requests with no candidate at all.
    pub unsuggested: usize,
    /// Candidates naming a request id not in the snapshot.
    pub ignored_unknown: usize,
    /// Repeat candidates for a request id already handled.
    pub ignored_duplicate: usize,
}

/// Reconcile candidates against the authoritative request list.
pub fn reconcile(requests: &[Request], candidates: &[CandidatePairing]) -> Vec<MatchResult> {
    reconcile_with_stats(requests, candidates).0
}

/// [`reconcile`], also returning resolution counters.
pub fn reconcile_with_stats(
    requests: &[Request],
    candidates: &[CandidatePairing],
) -> (Vec<MatchResult>, ReconcileStats) {
    let known: HashSet<&str> = requests.iter().map(|r| r.id.as_str()).collect();
    let mut handled: HashSet<&str> = HashSet::with_capacity(known.len());
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut results = Vec::with_capacity(known.len());
    let mut stats = ReconcileStats::default();

    for candidate in candidates {
        let request_id = candidate.request_id.as_str();
        if !known.contains(request_id) {
            stats.ignored_unknown += 1;
            continue;
        }
        if !handled.insert(request_id) {
            stats.ignored_duplicate += 1;
            continue;
        }

        match candidate.donation_id.as_deref() {
            Some(donation_id) if claimed.insert(donation_id) => {
                stats.accepted += 1;
                results.push(MatchResult::matched(
                    request_id,
                    donation_id,
                    candidate.confidence,
                    candidate.reasoning.clone().unwrap_or_default(),
                ));
            }
            Some(_) => {
                stats.demoted += 1;
                results.push(MatchResult::unmatched(request_id, REASON_DEMOTED));
            }
            None => {
                stats.declined += 1;
                let reasoning = candidate
                    .reasoning
                    .clone()
                    .unwrap_or_else(|| REASON_NO_CANDIDATE.to_string());
                results.push(MatchResult::unmatched(request_id, reasoning));
            }
        }
    }

    for request in requests {
        if handled.insert(request.id.as_str()) {
            stats.unsuggested += 1;
            results.push(MatchResult::unmatched(&request.id, REASON_NO_CANDIDATE));
        }
    }

    debug_assert_eq!(results.len(), known.len());
    debug!(
        requests = known.len(),
        candidates = candidates.len(),
        accepted = stats.accepted,
        demoted = stats.demoted,
        declined = stats.declined,
        unsuggested = stats.unsuggested,
        ignored_unknown = stats.ignored_unknown,
        ignored_duplicate = stats.ignored_duplicate,
        "reconciled candidate pairings"
    );

    (results, stats)
}
