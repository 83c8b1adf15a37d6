//! crates/leadmaster_core/src/normalize.rs
//!
//! Maps heterogeneous source records (webhook payload items or database
//! rows) into the canonical `Lead` shape.

use crate::domain::{Lead, Rating};
use serde_json::Value;

// Per-field priority lists: the first present, non-empty key wins. The
// tables merge the webhook item shape ("businessName", "Business Name")
// with the database row shape ("business_name", "score").
const NAME_KEYS: &[&str] = &[
    "name",
    "businessName",
    "Business Name",
    "title",
    "business_name",
];
const ADDRESS_KEYS: &[&str] = &["address", "formatted_address", "location", "Address"];
const PHONE_KEYS: &[&str] = &["phone", "phone_number", "Phone"];
const WEBSITE_KEYS: &[&str] = &["website", "site", "url", "Website"];
const EMAIL_KEYS: &[&str] = &["email", "emails", "Email"];
const RATING_KEYS: &[&str] = &["rating", "stars", "score", "Rating"];

/// Normalizes an arbitrary-keyed record into a `Lead`.
///
/// Total over any JSON value: non-objects, nulls, and records missing every
/// alternative key yield a `Lead` with all fields empty. Never panics.
pub fn normalize_lead(raw: &Value) -> Lead {
    Lead {
        name: first_text(raw, NAME_KEYS),
        address: first_text(raw, ADDRESS_KEYS),
        phone: first_text(raw, PHONE_KEYS),
        website: first_text(raw, WEBSITE_KEYS),
        email: first_text(raw, EMAIL_KEYS),
        rating: first_rating(raw, RATING_KEYS),
    }
}

fn first_text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| as_text(raw.get(*key)?))
}

/// Best-effort extraction of a text value: strings are taken as-is, numbers
/// are rendered, and arrays (the `emails` row shape) contribute their first
/// usable element.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(as_text),
        _ => None,
    }
}

fn first_rating(raw: &Value, keys: &[&str]) -> Option<Rating> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::Number(n) => n.as_f64().map(Rating::Score),
        Value::String(s) if !s.trim().is_empty() => Some(Rating::Text(s.clone())),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_keys_win_over_alternatives() {
        let raw = json!({
            "name": "Blue Bottle",
            "businessName": "ignored",
            "address": "123 Main St",
            "formatted_address": "ignored too",
        });
        let lead = normalize_lead(&raw);
        assert_eq!(lead.name.as_deref(), Some("Blue Bottle"));
        assert_eq!(lead.address.as_deref(), Some("123 Main St"));
    }

    #[test]
    fn test_alternative_keys_fill_in() {
        let raw = json!({
            "Business Name": "O'Hare Cafe",
            "formatted_address": "1 Airport Way",
            "phone_number": "555-0100",
            "site": "https://example.com",
            "emails": ["first@example.com", "second@example.com"],
            "score": "4.5 stars",
        });
        let lead = normalize_lead(&raw);
        assert_eq!(lead.name.as_deref(), Some("O'Hare Cafe"));
        assert_eq!(lead.address.as_deref(), Some("1 Airport Way"));
        assert_eq!(lead.phone.as_deref(), Some("555-0100"));
        assert_eq!(lead.website.as_deref(), Some("https://example.com"));
        assert_eq!(lead.email.as_deref(), Some("first@example.com"));
        assert_eq!(lead.rating, Some(Rating::Text("4.5 stars".to_string())));
    }

    #[test]
    fn test_empty_strings_are_skipped() {
        let raw = json!({ "name": "  ", "title": "Fallback Title" });
        let lead = normalize_lead(&raw);
        assert_eq!(lead.name.as_deref(), Some("Fallback Title"));
    }

    #[test]
    fn test_numeric_rating() {
        let raw = json!({ "rating": 4.7 });
        assert_eq!(normalize_lead(&raw).rating, Some(Rating::Score(4.7)));
    }

    #[test]
    fn test_total_over_non_objects() {
        for raw in [json!(null), json!("just a string"), json!([1, 2, 3]), json!(42)] {
            let lead = normalize_lead(&raw);
            assert_eq!(lead.name, None);
            assert_eq!(lead.rating, None);
        }
    }

    #[test]
    fn test_missing_everything_yields_empty_lead() {
        let lead = normalize_lead(&json!({ "unrelated": true }));
        assert_eq!(lead, Lead {
            name: None,
            address: None,
            phone: None,
            website: None,
            email: None,
            rating: None,
        });
    }
}
