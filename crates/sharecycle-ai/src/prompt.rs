use serde::Serialize;
use serde_json::{Value, json};
use sharecycle_core::{Donation, ItemCategory, Request};

// ── Prompt templates ──

const INSTRUCTIONS: &str = "\
You are an expert logistics coordinator for a charity called ShareCycle.
Your task is to match donated items with requests from people in need.

Analyze the two JSON lists below, 'donations' and 'requests', and find the best \
available donation for each request.

Matching rules:
1. Prioritize category: a donation's category must match the request's category.
2. Analyze descriptions: read the donation description and the request's need to \
find the best fit from keywords, context, and implied needs.
3. Exclusive matching: a single donation can only be matched to one request. \
Choose the best request for each item.
4. No suitable match: if no donation is a good fit for a request, say so with a \
null donationId and a null confidence.

Respond with a JSON array containing one object per request, best matches first. \
For each match give a confidence of high, medium, or low and a brief, clear reasoning.";

/// The minimal projection of a catalog record the scorer gets to see.
#[derive(Serialize)]
struct Brief<'a> {
    id: &'a str,
    category: ItemCategory,
    description: &'a str,
}

fn briefs_of_donations(donations: &[Donation]) -> Vec<Brief<'_>> {
    donations
        .iter()
        .map(|d| Brief {
            id: &d.id,
            category: d.category,
            description: &d.description,
        })
        .collect()
}

fn briefs_of_requests(requests: &[Request]) -> Vec<Brief<'_>> {
    requests
        .iter()
        .map(|r| Brief {
            id: &r.id,
            category: r.category,
            description: &r.description,
        })
        .collect()
}

/// Build the matching prompt. Contact details never leave the catalog.
pub fn build_prompt(donations: &[Donation], requests: &[Request]) -> String {
    let donations = json!(briefs_of_donations(donations));
    let requests = json!(briefs_of_requests(requests));
    format!(
        "{INSTRUCTIONS}\n\
         \n\
         Donations: {donations}\n\
         Requests: {requests}"
    )
}

/// Structured-output schema for one candidate list.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "requestId": { "type": "STRING" },
                "donationId": { "type": "STRING", "nullable": true },
                "confidence": {
                    "type": "STRING",
                    "enum": ["high", "medium", "low"],
                    "nullable": true
                },
                "reasoning": { "type": "STRING" }
            },
            "required": ["requestId", "donationId", "confidence", "reasoning"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sharecycle_core::ItemCondition;

    fn donation() -> Donation {
        Donation {
            id: "d1".into(),
            category: ItemCategory::Electronics,
            description: "24-inch Dell Monitor".into(),
            condition: ItemCondition::Good,
            photo: String::new(),
            created_at: Utc::now(),
            donor_name: "Alice Johnson".into(),
            donor_email: "alice.j@example.com".into(),
            donor_phone: "555-0101".into(),
            donor_location: "City Center".into(),
        }
    }

    fn request() -> Request {
        Request {
            id: "r1".into(),
            category: ItemCategory::Electronics,
            description: "Need a monitor".into(),
            created_at: Utc::now(),
            requester_name: "Gary Smith".into(),
            requester_email: "gary.s@example.com".into(),
            requester_phone: "555-0107".into(),
            requester_location: "West End".into(),
        }
    }

    #[test]
    fn prompt_carries_briefs_only() {
        let prompt = build_prompt(&[donation()], &[request()]);
        assert!(prompt.contains(r#""id":"d1""#));
        assert!(prompt.contains(r#""category":"Electronics""#));
        assert!(prompt.contains("Need a monitor"));
        assert!(!prompt.contains("alice.j@example.com"));
        assert!(!prompt.contains("555-0107"));
    }

    #[test]
    fn prompt_states_exclusivity_rule() {
        let prompt = build_prompt(&[], &[]);
        assert!(prompt.contains("Exclusive matching"));
        assert!(prompt.contains("Donations: []"));
    }

    #[test]
    fn schema_requires_all_fields() {
        let schema = response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["required"].as_array().unwrap().len(), 4);
    }
}
