// Property-based tests for the reconciliation engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use sharecycle_core::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn make_request(id: &str) -> Request {
    Request {
        id: id.to_string(),
        category: ItemCategory::Other,
        description: "anything useful".to_string(),
        created_at: Utc.with_ymd_and_hms(2023, 10, 1, 12, 0, 0).unwrap(),
        requester_name: "Jane Doe".to_string(),
        requester_email: "jane.d@example.com".to_string(),
        requester_phone: "555-0110".to_string(),
        requester_location: "City Center".to_string(),
    }
}

/// Distinct request ids drawn from r0..r5.
fn arb_requests() -> impl Strategy<Value = Vec<Request>> {
    prop::collection::btree_set(0u8..6, 0..6).prop_map(|ids: BTreeSet<u8>| {
        ids.into_iter()
            .map(|i| make_request(&format!("r{i}")))
            .collect()
    })
}

fn arb_confidence() -> impl Strategy<Value = Option<Confidence>> {
    prop_oneof![
        Just(Some(Confidence::High)),
        Just(Some(Confidence::Medium)),
        Just(Some(Confidence::Low)),
        Just(None),
    ]
}

/// Candidates over r0..r7 (r6, r7 never exist) and a small donation pool so
/// collisions are frequent.
fn arb_candidate() -> impl Strategy<Value = CandidatePairing> {
    (
        0u8..8,
        prop::option::weighted(0.8, 0u8..4),
        arb_confidence(),
        prop::option::of("[a-z ]{0,12}"),
    )
        .prop_map(|(r, d, confidence, reasoning)| CandidatePairing {
            request_id: format!("r{r}"),
            donation_id: d.map(|d| format!("d{d}")),
            confidence,
            reasoning,
        })
}

fn arb_candidates() -> impl Strategy<Value = Vec<CandidatePairing>> {
    prop::collection::vec(arb_candidate(), 0..12)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn cardinality_and_completeness(
        requests in arb_requests(),
        candidates in arb_candidates(),
    ) {
        let out = reconcile(&requests, &candidates);
        prop_assert_eq!(out.len(), requests.len());

        let expected: HashSet<&str> = requests.iter().map(|r| r.id.as_str()).collect();
        let mut seen = HashSet::new();
        for m in &out {
            prop_assert!(expected.contains(m.request_id.as_str()),
                "unknown request {} in output", m.request_id);
            prop_assert!(seen.insert(m.request_id.as_str()),
                "request {} appears twice", m.request_id);
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn exclusivity(
        requests in arb_requests(),
        candidates in arb_candidates(),
    ) {
        let out = reconcile(&requests, &candidates);
        let mut used = HashSet::new();
        for d in out.iter().filter_map(|m| m.donation_id.as_deref()) {
            prop_assert!(used.insert(d), "donation {} assigned twice", d);
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn unmatched_entries_carry_no_confidence(
        requests in arb_requests(),
        candidates in arb_candidates(),
    ) {
        for m in reconcile(&requests, &candidates) {
            if m.donation_id.is_none() {
                prop_assert!(m.confidence.is_none());
            }
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn accepted_candidates_pass_through(
        requests in arb_requests(),
        candidates in arb_candidates(),
    ) {
        let out = reconcile(&requests, &candidates);

        // The honoured candidate for each request is its first occurrence.
        let mut first: HashMap<&str, &CandidatePairing> = HashMap::new();
        for c in &candidates {
            first.entry(c.request_id.as_str()).or_insert(c);
        }

        for m in out.iter().filter(|m| m.is_matched()) {
            let c = first[m.request_id.as_str()];
            prop_assert_eq!(&c.donation_id, &m.donation_id);
            prop_assert_eq!(c.confidence, m.confidence);
            prop_assert_eq!(c.reasoning.clone().unwrap_or_default(), m.reasoning.clone());
        }
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn first_candidate_for_claimed_donation_is_demoted(
        requests in arb_requests(),
        candidates in arb_candidates(),
    ) {
        let (out, stats) = reconcile_with_stats(&requests, &candidates);
        let by_request: HashMap<&str, &MatchResult> =
            out.iter().map(|m| (m.request_id.as_str(), m)).collect();

        // Replay in order: a known request's first candidate either claims its
        // donation or finds it already taken.
        let mut handled = HashSet::new();
        let mut claimed = HashSet::new();
        let mut demoted = BTreeSet::new();
        for c in &candidates {
            let rid = c.request_id.as_str();
            if !by_request.contains_key(rid) || !handled.insert(rid) {
                continue;
            }
            if let Some(d) = c.donation_id.as_deref() {
                if !claimed.insert(d) {
                    demoted.insert(rid);
                }
            }
        }

        for rid in &demoted {
            let m = by_request[rid];
            prop_assert_eq!(m.donation_id.as_deref(), None, "{} kept a claimed donation", rid);
            prop_assert_eq!(m.reasoning.as_str(), REASON_DEMOTED);
        }
        let tagged: BTreeSet<&str> = out
            .iter()
            .filter(|m| m.reasoning == REASON_DEMOTED)
            .map(|m| m.request_id.as_str())
            .collect();
        prop_assert_eq!(&tagged, &demoted);
        prop_assert_eq!(stats.demoted, demoted.len());
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn determinism(
        requests in arb_requests(),
        candidates in arb_candidates(),
    ) {
        let a = reconcile(&requests, &candidates);
        let b = reconcile(&requests, &candidates);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(summarize(&a), summarize(&b));
    }
}

proptest! {
    #![proptest_config(config_256())]
    #[test]
    fn summary_agrees_with_results(
        requests in arb_requests(),
        candidates in arb_candidates(),
    ) {
        let out = reconcile(&requests, &candidates);
        let s = summarize(&out);
        prop_assert_eq!(s.total, requests.len());
        prop_assert_eq!(s.matched + s.unmatched, s.total);
        prop_assert_eq!(s.matched, out.iter().filter(|m| m.donation_id.is_some()).count());
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_shared_donation_demotes_second_request() {
    let requests = [make_request("r1"), make_request("r2")];
    let candidates = [
        CandidatePairing::suggest("r1", "d1", Confidence::High, "match"),
        CandidatePairing::suggest("r2", "d1", Confidence::Medium, "also fits"),
    ];

    let out = reconcile(&requests, &candidates);
    assert_eq!(
        out,
        vec![
            MatchResult::matched("r1", "d1", Some(Confidence::High), "match"),
            MatchResult {
                request_id: "r2".into(),
                donation_id: None,
                confidence: None,
                reasoning: "a potential item was matched with a higher-priority request".into(),
            },
        ]
    );
}

#[test]
fn scenario_no_candidates() {
    let out = reconcile(&[make_request("r1")], &[]);
    assert_eq!(
        out,
        vec![MatchResult {
            request_id: "r1".into(),
            donation_id: None,
            confidence: None,
            reasoning: "no suitable donation found in the current inventory.".into(),
        }]
    );
}

#[test]
fn scenario_no_requests() {
    let candidates = [
        CandidatePairing::suggest("r1", "d1", Confidence::High, "match"),
        CandidatePairing::no_suggestion("r2", Some("nothing".into())),
    ];
    assert!(reconcile(&[], &candidates).is_empty());
}
