//! Record URL helpers shared by the feed reader and the record builder.

/// Path segment used by feed entries: `https://ClinicalTrials.gov/show/NCT04372602`.
pub const SHOW_MARKER: &str = "gov/show/";
/// Canonical record page: `https://ClinicalTrials.gov/ct2/show/record/NCT04372602`.
pub const RECORD_MARKER: &str = "gov/ct2/show/record/";
const CTID_MARKER: &str = "show/record/";

/// Rewrite a feed URL into its record-page URL.
///
/// Callers only pass URLs carrying [`SHOW_MARKER`]; anything else is
/// returned unchanged.
pub fn transform_url(raw: &str) -> String {
    match raw.split_once(SHOW_MARKER) {
        Some((prefix, id)) => format!("{prefix}{RECORD_MARKER}{id}"),
        None => raw.to_string(),
    }
}

/// Trial id after `show/record/`, or empty when the marker is missing.
/// A marker at the very start of the string does not count.
pub fn ctid_from_url(url: &str) -> String {
    match url.find(CTID_MARKER) {
        Some(i) if i > 0 => url[i + CTID_MARKER.len()..].to_string(),
        _ => String::new(),
    }
}
