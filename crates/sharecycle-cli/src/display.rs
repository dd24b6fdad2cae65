//! Terminal cards for catalog records and match results.

use sharecycle_core::{CatalogSnapshot, Confidence, Donation, MatchResult, Request, Summary};

const LABEL_WIDTH: usize = 12;
const BAR_WIDTH: usize = 20;
const MAX_DESCRIPTION: usize = 72;

// ── Catalog ──

pub fn print_donation_card(d: &Donation) {
    println!("=== {} · {} ===", d.id, d.category);
    println!("{}", truncate(&d.description, MAX_DESCRIPTION));
    field("condition", d.condition.as_str());
    field("listed", &d.created_at.format("%Y-%m-%d %H:%M").to_string());
    field("donor", &d.donor_name);
    field("email", &d.donor_email);
    if !d.donor_phone.is_empty() {
        field("phone", &d.donor_phone);
    }
    if !d.donor_location.is_empty() {
        field("location", &d.donor_location);
    }
    if !d.photo.is_empty() {
        field("photo", &photo_label(&d.photo));
    }
    println!();
}

pub fn print_request_card(r: &Request) {
    println!("=== {} · {} ===", r.id, r.category);
    println!("{}", truncate(&r.description, MAX_DESCRIPTION));
    field("requested", &r.created_at.format("%Y-%m-%d %H:%M").to_string());
    field("requester", &r.requester_name);
    field("email", &r.requester_email);
    if !r.requester_phone.is_empty() {
        field("phone", &r.requester_phone);
    }
    if !r.requester_location.is_empty() {
        field("location", &r.requester_location);
    }
    println!();
}

// ── Matching ──

pub fn print_summary(summary: &Summary) {
    println!("Matching summary");
    field("total", &summary.total.to_string());
    field("matched", &summary.matched.to_string());
    field("unmatched", &summary.unmatched.to_string());
    field(
        "rate",
        &format!(
            "{} {}%",
            bar(summary.matched_ratio().unwrap_or(0.0)),
            summary.matched_percent()
        ),
    );
    println!();
}

/// One result, resolved against the snapshot the pass ran on.
pub fn print_match_card(result: &MatchResult, snapshot: &CatalogSnapshot) {
    let request = snapshot.request(&result.request_id);
    let header = request
        .map(|r| format!("{} · {}", r.id, r.category))
        .unwrap_or_else(|| result.request_id.clone());
    println!("=== {header} ===");
    if let Some(r) = request {
        println!("{}", truncate(&r.description, MAX_DESCRIPTION));
        field("requester", &contact(&r.requester_name, &r.requester_location));
    }

    match &result.donation_id {
        Some(id) => {
            match snapshot.donation(id) {
                Some(d) => {
                    field(
                        "donation",
                        &format!("{} · {}", d.id, truncate(&d.description, 48)),
                    );
                    field("condition", d.condition.as_str());
                    field("donor", &contact(&d.donor_name, &d.donor_location));
                }
                None => field("donation", &format!("{id} (not in catalog)")),
            }
            field("confidence", &confidence_bar(result.confidence));
        }
        None => field("donation", "Not Matched"),
    }
    if !result.reasoning.is_empty() {
        field("reasoning", &result.reasoning);
    }
    println!();
}

// ── Helpers ──

fn field(label: &str, value: &str) {
    println!("  {label:<width$} {value}", width = LABEL_WIDTH);
}

fn contact(name: &str, location: &str) -> String {
    if location.is_empty() {
        name.to_string()
    } else {
        format!("{name}, {location}")
    }
}

/// Data URLs are long and unreadable; show only their media type.
fn photo_label(photo: &str) -> String {
    match photo.strip_prefix("data:") {
        Some(rest) => {
            let media = rest.split([';', ',']).next().unwrap_or("");
            format!("(embedded {media})")
        }
        None => photo.to_string(),
    }
}

/// Share of the bar a confidence level fills.
pub fn confidence_fill(confidence: Option<Confidence>) -> f64 {
    match confidence {
        Some(Confidence::High) => 1.0,
        Some(Confidence::Medium) => 0.66,
        Some(Confidence::Low) => 0.33,
        None => 0.0,
    }
}

pub fn confidence_bar(confidence: Option<Confidence>) -> String {
    let label = confidence.map(|c| c.as_str()).unwrap_or("unrated");
    format!("{} {label}", bar(confidence_fill(confidence)))
}

/// Fixed-width bar for a fraction in `0.0..=1.0`; out-of-range input is clamped.
pub fn bar(fraction: f64) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}
