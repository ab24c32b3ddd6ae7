use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::extract_field;
use crate::utils::ctid_from_url;

/// Row header labels, in field order. The leading `>` anchors each label to
/// the end of its header tag so body text with the same words never matches.
pub const FIELD_LABELS: [&str; 10] = [
    ">First Submitted Date",
    ">First Posted Date",
    ">Last Update Posted Date",
    ">Brief Title",
    ">Official Title",
    ">Brief Summary",
    ">Detailed Description",
    ">Study Design",
    ">Publications *",
    ">Listed Location Countries",
];

const CAPTURED_DATE_FORMAT: &str = "%B %d %Y";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialFields {
    pub first_submitted_date: String,
    pub first_posted_date: String,
    pub last_update_posted_date: String,
    pub brief_title: String,
    pub official_title: String,
    pub brief_summary: String,
    pub detailed_description: String,
    pub study_design: String,
    pub publications: String,
    pub listed_location_countries: String,
}

impl TrialFields {
    fn from_values([a, b, c, d, e, f, g, h, i, j]: [String; 10]) -> Self {
        Self {
            first_submitted_date: a,
            first_posted_date: b,
            last_update_posted_date: c,
            brief_title: d,
            official_title: e,
            brief_summary: f,
            detailed_description: g,
            study_design: h,
            publications: i,
            listed_location_countries: j,
        }
    }

    /// Values in [`FIELD_LABELS`] order.
    pub fn values(&self) -> [&str; 10] {
        [
            &self.first_submitted_date,
            &self.first_posted_date,
            &self.last_update_posted_date,
            &self.brief_title,
            &self.official_title,
            &self.brief_summary,
            &self.detailed_description,
            &self.study_design,
            &self.publications,
            &self.listed_location_countries,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub url: String,
    #[serde(rename = "ctid")]
    pub external_id: String,
    pub fields: TrialFields,
    pub captured_date: String,
}

/// Build a record from a fetched page, stamped with today's date.
pub fn build_record(markup: &str, url: &str) -> Record {
    build_record_on(markup, url, Local::now().date_naive())
}

pub fn build_record_on(markup: &str, url: &str, captured: NaiveDate) -> Record {
    let values = FIELD_LABELS.map(|label| extract_field(markup, label));
    Record {
        url: url.to_string(),
        external_id: ctid_from_url(url),
        fields: TrialFields::from_values(values),
        captured_date: captured.format(CAPTURED_DATE_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://clinicaltrials.gov/ct2/show/record/NCT04372602";

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/NCT04372602.html").unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 5, 4).unwrap()
    }

    #[test]
    fn fixture_fields() {
        let r = build_record_on(&fixture(), URL, date());
        assert_eq!(r.url, URL);
        assert_eq!(r.external_id, "NCT04372602");
        assert_eq!(r.captured_date, "May 04 2020");

        let f = &r.fields;
        assert_eq!(f.first_submitted_date, "April 30, 2020");
        assert_eq!(f.first_posted_date, "May 1, 2020");
        assert_eq!(f.last_update_posted_date, "June 2, 2020");
        assert_eq!(
            f.brief_title,
            "Hydroxychloroquine for the Treatment of Mild COVID-19"
        );
        assert!(f.official_title.starts_with("A Randomized, Double-blind"));
        assert!(f.brief_summary.starts_with("This study will evaluate"));
        assert_eq!(f.detailed_description, "");
        assert_eq!(f.study_design, "Allocation: Randomized");
        assert_eq!(f.publications, "Not Provided");
        assert_eq!(f.listed_location_countries, "United States");
    }

    #[test]
    fn fixture_fields_are_clean() {
        let r = build_record_on(&fixture(), URL, date());
        for v in r.fields.values() {
            assert!(!v.contains("<li style=\""), "list item left in {v:?}");
            assert!(!v.contains(" onclick=\""), "onclick left in {v:?}");
            assert_eq!(v, v.trim());
        }
    }

    #[test]
    fn empty_page_gives_empty_fields() {
        let r = build_record_on("", URL, date());
        assert_eq!(r.fields, TrialFields::default());
        assert_eq!(r.external_id, "NCT04372602");
    }

    #[test]
    fn url_without_record_marker() {
        let r = build_record_on("", "https://x.gov/show/NCT1", date());
        assert_eq!(r.external_id, "");
        assert_eq!(r.url, "https://x.gov/show/NCT1");
    }

    #[test]
    fn serialized_shape() {
        let r = build_record_on("", URL, date());
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["ctid"], "NCT04372602");
        assert_eq!(v["capturedDate"], "May 04 2020");
        assert_eq!(v["fields"]["briefTitle"], "");
        assert_eq!(v["fields"].as_object().unwrap().len(), FIELD_LABELS.len());
    }

    #[test]
    fn stamps_current_date() {
        let r = build_record("", URL);
        assert!(NaiveDate::parse_from_str(&r.captured_date, CAPTURED_DATE_FORMAT).is_ok());
    }
}
