//! crates/leadmaster_core/src/export.rs
//!
//! Serializes lead lists for the two export paths: CSV for a file download
//! and TSV for a clipboard-then-spreadsheet paste. Both functions are pure
//! and deterministic; the download, clipboard, and open-tab side effects
//! live at the protocol boundary.

use crate::domain::Lead;

/// The fixed export column order.
const HEADERS: [&str; 6] = ["Name", "Address", "Phone", "Website", "Email", "Rating"];

/// The filename offered for the CSV download.
pub const CSV_FILENAME: &str = "leadmaster-leads.csv";

/// Opening this URL creates a blank spreadsheet to paste the TSV into.
pub const SHEET_URL: &str = "https://sheet.new";

/// Renders leads as CSV: unquoted header row, every data field quoted with
/// embedded double quotes doubled. Missing values render as empty strings.
/// Rows keep the input order.
pub fn leads_to_csv(leads: &[Lead]) -> String {
    let mut lines = vec![HEADERS.join(",")];
    lines.extend(leads.iter().map(|lead| {
        columns(lead)
            .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
            .join(",")
    }));
    lines.join("\n")
}

/// Renders leads as TSV for a spreadsheet paste: header plus tab-joined,
/// unquoted rows.
pub fn leads_to_tsv(leads: &[Lead]) -> String {
    let mut lines = vec![HEADERS.join("\t")];
    lines.extend(leads.iter().map(|lead| columns(lead).join("\t")));
    lines.join("\n")
}

/// The column values for one lead, in header order.
fn columns(lead: &Lead) -> [String; 6] {
    [
        lead.name.clone().unwrap_or_default(),
        lead.address.clone().unwrap_or_default(),
        lead.phone.clone().unwrap_or_default(),
        lead.website.clone().unwrap_or_default(),
        lead.email.clone().unwrap_or_default(),
        lead.rating
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rating;

    fn lead(name: &str) -> Lead {
        Lead {
            name: Some(name.to_string()),
            address: None,
            phone: None,
            website: None,
            email: None,
            rating: None,
        }
    }

    #[test]
    fn test_empty_list_is_header_only() {
        assert_eq!(leads_to_csv(&[]), "Name,Address,Phone,Website,Email,Rating");
        assert_eq!(
            leads_to_tsv(&[]),
            "Name\tAddress\tPhone\tWebsite\tEmail\tRating"
        );
    }

    #[test]
    fn test_embedded_quotes_are_doubled() {
        let csv = leads_to_csv(&[lead("O\"Hare")]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "\"O\"\"Hare\",\"\",\"\",\"\",\"\",\"\"");
    }

    #[test]
    fn test_missing_values_render_empty() {
        let mut full = lead("Cafe");
        full.rating = None;
        let csv = leads_to_csv(&[full]);
        assert!(!csv.contains("None"));
        assert!(!csv.contains("undefined"));
        assert!(csv.ends_with("\"Cafe\",\"\",\"\",\"\",\"\",\"\""));
    }

    #[test]
    fn test_row_order_matches_input() {
        let csv = leads_to_csv(&[lead("First"), lead("Second")]);
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("\"First\""));
        assert!(rows[2].starts_with("\"Second\""));
    }

    #[test]
    fn test_numeric_and_text_ratings_render() {
        let mut a = lead("A");
        a.rating = Some(Rating::Score(4.5));
        let mut b = lead("B");
        b.rating = Some(Rating::Text("4.5 stars".to_string()));
        let tsv = leads_to_tsv(&[a, b]);
        let rows: Vec<&str> = tsv.lines().collect();
        assert!(rows[1].ends_with("\t4.5"));
        assert!(rows[2].ends_with("\t4.5 stars"));
    }

    #[test]
    fn test_tsv_is_unquoted() {
        let mut l = lead("Cafe");
        l.address = Some("1 Main St".to_string());
        let tsv = leads_to_tsv(&[l]);
        assert_eq!(tsv.lines().nth(1).unwrap(), "Cafe\t1 Main St\t\t\t\t");
    }
}
