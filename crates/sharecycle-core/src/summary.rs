//! Display counters derived from a final assignment list.

use serde::Serialize;

use crate::matching::MatchResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
}

impl Summary {
    /// Share of matched requests in `0.0..=1.0`, or `None` for an empty list.
    pub fn matched_ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.matched as f64 / self.total as f64)
        }
    }

    /// Rounded matched percentage; 0 for an empty list.
    pub fn matched_percent(&self) -> u8 {
        self.matched_ratio()
            .map(|r| (r * 100.0).round() as u8)
            .unwrap_or(0)
    }
}

pub fn summarize(results: &[MatchResult]) -> Summary {
    let total = results.len();
    let matched = results.iter().filter(|m| m.is_matched()).count();
    Summary {
        total,
        matched,
        unmatched: total - matched,
    }
}
