//! Shape validation for scorer output.
//!
//! Runs before reconciliation and fails closed: any element that does not fit
//! the candidate shape rejects the whole response.

use serde_json::{Map, Value};
use sharecycle_core::{CandidatePairing, Confidence};

use crate::ScoringError;

/// Parse a scorer's JSON text into candidate pairings.
///
/// Tolerates a surrounding markdown code fence. Empty or `"null"`/`"none"`
/// donation ids and confidences are read as absent.
pub fn parse_candidates(text: &str) -> Result<Vec<CandidatePairing>, ScoringError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(malformed("empty response"));
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("not JSON: {e}")))?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(malformed(format!(
                "expected an array, got {}",
                kind_of(&other)
            )));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item
                .as_object()
                .ok_or_else(|| malformed(format!("element {i} is {}", kind_of(item))))?;
            candidate_from(i, obj)
        })
        .collect()
}

fn candidate_from(i: usize, obj: &Map<String, Value>) -> Result<CandidatePairing, ScoringError> {
    let request_id = match obj.get("requestId") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(other) => {
            return Err(malformed(format!(
                "element {i}: requestId is {}",
                kind_of(other)
            )));
        }
        None => return Err(malformed(format!("element {i}: missing requestId"))),
    };

    let donation_id = optional_string(i, obj, "donationId")?;

    let confidence = optional_string(i, obj, "confidence")?
        .map(|s| {
            s.parse::<Confidence>()
                .map_err(|e| malformed(format!("element {i}: {e}")))
        })
        .transpose()?;

    let reasoning = match obj.get("reasoning") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => {
            return Err(malformed(format!(
                "element {i}: reasoning is {}",
                kind_of(other)
            )));
        }
    };

    Ok(CandidatePairing {
        request_id,
        donation_id,
        confidence,
        reasoning,
    })
}

/// A nullable string field, with blank, "null" and "none" read as absent.
fn optional_string(
    i: usize,
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, ScoringError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none") {
                Ok(None)
            } else {
                Ok(Some(s.to_string()))
            }
        }
        Some(other) => Err(malformed(format!(
            "element {i}: {field} is {}",
            kind_of(other)
        ))),
    }
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn malformed(msg: impl Into<String>) -> ScoringError {
    ScoringError::MalformedResponse(msg.into())
}
