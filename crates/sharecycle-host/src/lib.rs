//! Matching pass coordinator: snapshot, scoring under a deadline, reconciliation.
//!
//! A [`MatchingHost`] owns the only suspension point of a pass (the scorer
//! call) and the guards around it:
//!
//! - one outstanding pass per host (busy flag, cleared on every exit path)
//! - a wall-clock deadline on scoring
//! - a revision check so a snapshot that went stale while the scorer was
//!   thinking is never reconciled
//!
//! Failures are all-or-nothing: a pass either returns a complete
//! [`PassOutcome`] or a [`PassError`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sharecycle_ai::{Scorer, ScoringError};
use sharecycle_core::{
    CandidatePairing, CatalogSnapshot, MatchResult, ReconcileStats, Summary,
    reconcile_with_stats, summarize,
};
use sharecycle_store::{CatalogRepository, StoreError};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PASS_TIMEOUT: Duration = Duration::from_secs(60);

/// Host-side audit entry, timestamped when recorded.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub event_type: String,
    pub resource: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PassConfig {
    /// Upper bound on the scorer call.
    pub timeout: Duration,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PASS_TIMEOUT,
        }
    }
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error("a matching pass is already running")]
    Busy,

    #[error("nothing to match: {donations} donations, {requests} requests")]
    NothingToMatch { donations: usize, requests: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to obtain matches: {0}")]
    Scoring(ScoringError),

    #[error("catalog changed during the pass (revision {snapshot} -> {current}); run it again")]
    StaleSnapshot { snapshot: u64, current: u64 },
}

/// Everything a completed pass produced.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub snapshot: CatalogSnapshot,
    pub results: Vec<MatchResult>,
    pub summary: Summary,
    pub stats: ReconcileStats,
    pub audit: Vec<AuditRecord>,
}

impl PassOutcome {
    /// Final entries that hold a donation.
    pub fn matched(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|r| r.is_matched())
    }
}

/// Clears the busy flag when the pass ends, whichever way it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MatchingHost {
    repo: Arc<dyn CatalogRepository>,
    scorer: Arc<dyn Scorer>,
    config: PassConfig,
    busy: AtomicBool,
}

impl MatchingHost {
    pub fn new(
        repo: Arc<dyn CatalogRepository>,
        scorer: Arc<dyn Scorer>,
        config: PassConfig,
    ) -> Self {
        Self {
            repo,
            scorer,
            config,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, PassError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| PassError::Busy)
    }

    /// Run one matching pass over the current catalog.
    pub async fn run_pass(&self) -> Result<PassOutcome, PassError> {
        let _guard = self.acquire()?;
        let started = Instant::now();
        let mut audit = Vec::new();

        let snapshot = self.repo.snapshot()?;
        if !snapshot.is_matchable() {
            return Err(PassError::NothingToMatch {
                donations: snapshot.donations.len(),
                requests: snapshot.requests.len(),
            });
        }
        record(
            &mut audit,
            "pass-started",
            self.scorer.name(),
            format!(
                "{} donations, {} requests at revision {}",
                snapshot.donations.len(),
                snapshot.requests.len(),
                snapshot.revision
            ),
        );

        let candidates = self.score(&snapshot).await.inspect_err(|e| {
            warn!(scorer = self.scorer.name(), error = %e, "matching pass failed");
        })?;
        record(
            &mut audit,
            "candidates-received",
            self.scorer.name(),
            format!("{} candidate pairings", candidates.len()),
        );

        let current = self.repo.revision()?;
        if current != snapshot.revision {
            warn!(
                snapshot = snapshot.revision,
                current, "catalog changed while scoring; discarding candidates"
            );
            return Err(PassError::StaleSnapshot {
                snapshot: snapshot.revision,
                current,
            });
        }

        let (results, stats) = reconcile_with_stats(&snapshot.requests, &candidates);
        let summary = summarize(&results);
        record(
            &mut audit,
            "pass-completed",
            self.scorer.name(),
            format!(
                "{} of {} requests matched; {} demoted, {} ignored",
                summary.matched,
                summary.total,
                stats.demoted,
                stats.ignored_unknown + stats.ignored_duplicate
            ),
        );

        info!(
            total = summary.total,
            matched = summary.matched,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "matching pass complete"
        );

        Ok(PassOutcome {
            snapshot,
            results,
            summary,
            stats,
            audit,
        })
    }

    async fn score(&self, snapshot: &CatalogSnapshot) -> Result<Vec<CandidatePairing>, PassError> {
        let call = self.scorer.score(&snapshot.donations, &snapshot.requests);
        match tokio::time::timeout(self.config.timeout, call).await {
            Ok(Ok(candidates)) => Ok(candidates),
            Ok(Err(e)) => Err(PassError::Scoring(e)),
            Err(_) => Err(PassError::Scoring(ScoringError::Timeout(
                self.config.timeout,
            ))),
        }
    }
}

fn record(audit: &mut Vec<AuditRecord>, event_type: &str, resource: &str, detail: String) {
    let record = AuditRecord {
        event_type: event_type.to_string(),
        resource: resource.to_string(),
        detail,
        timestamp: Utc::now(),
    };
    info!(
        event_type = %record.event_type,
        resource = %record.resource,
        detail = %record.detail,
        "audit event recorded"
    );
    audit.push(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sharecycle_core::{
        Confidence, Donation, ItemCategory, NewRequest, REASON_DEMOTED, REASON_NO_CANDIDATE,
        Request,
    };
    use sharecycle_store::{JsonStore, MemoryStore};
    use tokio::sync::Notify;

    struct Fixed(Vec<CandidatePairing>);

    #[async_trait]
    impl Scorer for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn score(
            &self,
            _: &[Donation],
            _: &[Request],
        ) -> Result<Vec<CandidatePairing>, ScoringError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl Scorer for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn score(
            &self,
            _: &[Donation],
            _: &[Request],
        ) -> Result<Vec<CandidatePairing>, ScoringError> {
            Err(ScoringError::Unavailable("API key is not configured".into()))
        }
    }

    struct Slow(Duration);

    #[async_trait]
    impl Scorer for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn score(
            &self,
            _: &[Donation],
            _: &[Request],
        ) -> Result<Vec<CandidatePairing>, ScoringError> {
            tokio::time::sleep(self.0).await;
            Ok(Vec::new())
        }
    }

    /// Blocks inside `score` until released.
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Scorer for Gate {
        fn name(&self) -> &str {
            "gate"
        }

        async fn score(
            &self,
            _: &[Donation],
            _: &[Request],
        ) -> Result<Vec<CandidatePairing>, ScoringError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Vec::new())
        }
    }

    /// Adds a request to the catalog while scoring.
    struct Meddling(Arc<dyn CatalogRepository>);

    #[async_trait]
    impl Scorer for Meddling {
        fn name(&self) -> &str {
            "meddling"
        }

        async fn score(
            &self,
            _: &[Donation],
            requests: &[Request],
        ) -> Result<Vec<CandidatePairing>, ScoringError> {
            self.0
                .add_request(NewRequest {
                    category: ItemCategory::Books,
                    description: "Picture books".into(),
                    requester_name: "Ivy Chen".into(),
                    requester_email: "ivy.c@example.com".into(),
                    requester_phone: "555-0109".into(),
                    requester_location: "East Side".into(),
                })
                .map_err(|e| ScoringError::Unavailable(e.to_string()))?;
            Ok(requests
                .iter()
                .map(|r| CandidatePairing::no_suggestion(&r.id, None))
                .collect())
        }
    }

    fn host(scorer: impl Scorer + 'static) -> MatchingHost {
        MatchingHost::new(
            Arc::new(MemoryStore::seeded()),
            Arc::new(scorer),
            PassConfig::default(),
        )
    }

    #[tokio::test]
    async fn pass_reconciles_scorer_output() {
        let host = host(Fixed(vec![
            CandidatePairing::suggest("r1", "d1", Confidence::High, "monitor for remote work"),
            CandidatePairing::suggest("r2", "d1", Confidence::Medium, "also wants d1"),
            CandidatePairing::no_suggestion("r3", Some("nothing fits".into())),
        ]));

        let outcome = host.run_pass().await.unwrap();

        assert_eq!(outcome.results.len(), 4);
        assert_eq!(outcome.results[0].donation_id.as_deref(), Some("d1"));
        assert_eq!(outcome.results[1].reasoning, REASON_DEMOTED);
        assert_eq!(outcome.results[2].reasoning, "nothing fits");
        assert_eq!(outcome.results[3].request_id, "r4");
        assert_eq!(outcome.results[3].reasoning, REASON_NO_CANDIDATE);

        assert_eq!(outcome.summary.total, 4);
        assert_eq!(outcome.summary.matched, 1);
        assert_eq!(outcome.matched().count(), 1);
        assert_eq!(outcome.stats.demoted, 1);
        assert_eq!(outcome.stats.unsuggested, 1);

        let events: Vec<&str> = outcome.audit.iter().map(|a| a.event_type.as_str()).collect();
        assert_eq!(events, ["pass-started", "candidates-received", "pass-completed"]);
        assert!(outcome.audit.iter().all(|a| a.resource == "fixed"));
        assert!(!host.is_busy());
    }

    #[tokio::test]
    async fn empty_catalog_is_refused() {
        let host = MatchingHost::new(
            Arc::new(MemoryStore::open()),
            Arc::new(Failing),
            PassConfig::default(),
        );
        let err = host.run_pass().await.unwrap_err();
        assert!(matches!(
            err,
            PassError::NothingToMatch {
                donations: 0,
                requests: 0
            }
        ));
        assert!(!host.is_busy());
    }

    #[tokio::test]
    async fn scorer_failure_is_reported_without_results() {
        let host = host(Failing);
        let err = host.run_pass().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to obtain matches: scoring unavailable: API key is not configured"
        );
        assert!(!host.is_busy());
    }

    #[tokio::test]
    async fn slow_scorer_times_out() {
        let host = MatchingHost::new(
            Arc::new(MemoryStore::seeded()),
            Arc::new(Slow(Duration::from_secs(5))),
            PassConfig {
                timeout: Duration::from_millis(50),
            },
        );
        let err = host.run_pass().await.unwrap_err();
        assert!(matches!(err, PassError::Scoring(ScoringError::Timeout(_))), "{err:?}");
        assert!(!host.is_busy());
    }

    #[tokio::test]
    async fn concurrent_pass_is_refused() {
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let host = Arc::new(MatchingHost::new(
            Arc::new(MemoryStore::seeded()),
            gate.clone(),
            PassConfig::default(),
        ));

        let first = {
            let host = host.clone();
            tokio::spawn(async move { host.run_pass().await })
        };
        gate.entered.notified().await;
        assert!(host.is_busy());

        let second = host.run_pass().await;
        assert!(matches!(second, Err(PassError::Busy)));

        gate.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.summary.matched, 0);
        assert!(!host.is_busy());

        // The flag is free again.
        gate.release.notify_one();
        assert!(host.run_pass().await.is_ok());
    }

    #[tokio::test]
    async fn catalog_change_during_scoring_is_stale() {
        let store = Arc::new(MemoryStore::seeded());
        let host = MatchingHost::new(
            store.clone(),
            Arc::new(Meddling(store.clone())),
            PassConfig::default(),
        );

        let err = host.run_pass().await.unwrap_err();
        assert!(matches!(
            err,
            PassError::StaleSnapshot {
                snapshot: 1,
                current: 2
            }
        ));
        assert!(!host.is_busy());
    }

    #[tokio::test]
    async fn write_from_another_file_handle_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let ours = JsonStore::open_persistent(&path).unwrap();
        ours.seed_if_empty().unwrap();
        let theirs = JsonStore::open_persistent(&path).unwrap();

        let host = MatchingHost::new(
            Arc::new(ours),
            Arc::new(Meddling(Arc::new(theirs))),
            PassConfig::default(),
        );

        let err = host.run_pass().await.unwrap_err();
        assert!(
            matches!(
                err,
                PassError::StaleSnapshot {
                    snapshot: 1,
                    current: 2
                }
            ),
            "{err:?}"
        );
    }
}
