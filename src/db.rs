use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::error::CrawlError;
use crate::parser::record::TrialFields;
use crate::parser::Record;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS trials (
            id                        INTEGER PRIMARY KEY,
            url                       TEXT UNIQUE NOT NULL,
            ctid                      TEXT NOT NULL,
            first_submitted_date      TEXT NOT NULL,
            first_posted_date         TEXT NOT NULL,
            last_update_posted_date   TEXT NOT NULL,
            brief_title               TEXT NOT NULL,
            official_title            TEXT NOT NULL,
            brief_summary             TEXT NOT NULL,
            detailed_description      TEXT NOT NULL,
            study_design              TEXT NOT NULL,
            publications              TEXT NOT NULL,
            listed_location_countries TEXT NOT NULL,
            captured_date             TEXT NOT NULL,
            created_at                TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_trials_ctid ON trials(ctid);
        ",
    )?;
    Ok(())
}

/// Persistence seen by the crawl loop: one collection keyed by record URL.
pub trait RecordStore {
    fn exists(&self, url: &str) -> Result<bool, CrawlError>;
    fn insert(&self, record: &Record) -> Result<(), CrawlError>;
}

impl RecordStore for Connection {
    fn exists(&self, url: &str) -> Result<bool, CrawlError> {
        Ok(record_exists(self, url)?)
    }

    fn insert(&self, record: &Record) -> Result<(), CrawlError> {
        insert_record(self, record)?;
        Ok(())
    }
}

pub fn record_exists(conn: &Connection, url: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM trials WHERE url = ?1)",
        [url],
        |r| r.get(0),
    )
}

/// Plain insert: a second record for the same URL violates the unique key.
pub fn insert_record(conn: &Connection, r: &Record) -> rusqlite::Result<usize> {
    let f = &r.fields;
    conn.execute(
        "INSERT INTO trials
         (url, ctid, first_submitted_date, first_posted_date, last_update_posted_date,
          brief_title, official_title, brief_summary, detailed_description,
          study_design, publications, listed_location_countries, captured_date)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
        rusqlite::params![
            r.url, r.external_id, f.first_submitted_date, f.first_posted_date,
            f.last_update_posted_date, f.brief_title, f.official_title, f.brief_summary,
            f.detailed_description, f.study_design, f.publications,
            f.listed_location_countries, r.captured_date,
        ],
    )
}

pub fn fetch_by_ctid(conn: &Connection, ctid: &str) -> Result<Option<Record>> {
    let record = conn
        .query_row(
            "SELECT url, ctid, first_submitted_date, first_posted_date, last_update_posted_date,
                    brief_title, official_title, brief_summary, detailed_description,
                    study_design, publications, listed_location_countries, captured_date
             FROM trials WHERE ctid = ?1 ORDER BY id LIMIT 1",
            [ctid],
            |row| {
                Ok(Record {
                    url: row.get(0)?,
                    external_id: row.get(1)?,
                    fields: TrialFields {
                        first_submitted_date: row.get(2)?,
                        first_posted_date: row.get(3)?,
                        last_update_posted_date: row.get(4)?,
                        brief_title: row.get(5)?,
                        official_title: row.get(6)?,
                        brief_summary: row.get(7)?,
                        detailed_description: row.get(8)?,
                        study_design: row.get(9)?,
                        publications: row.get(10)?,
                        listed_location_countries: row.get(11)?,
                    },
                    captured_date: row.get(12)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub untitled: usize,
    pub capture_days: usize,
    pub last_captured: Option<String>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM trials", [], |r| r.get(0))?;
    let untitled: usize = conn.query_row(
        "SELECT COUNT(*) FROM trials WHERE brief_title = ''",
        [],
        |r| r.get(0),
    )?;
    let capture_days: usize = conn.query_row(
        "SELECT COUNT(DISTINCT captured_date) FROM trials",
        [],
        |r| r.get(0),
    )?;
    let last_captured: Option<String> = conn
        .query_row(
            "SELECT captured_date FROM trials ORDER BY id DESC LIMIT 1",
            [],
            |r| r.get(0),
        )
        .optional()?;
    Ok(Stats {
        total,
        untitled,
        capture_days,
        last_captured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn record(url: &str, title: &str) -> Record {
        Record {
            url: url.to_string(),
            external_id: crate::utils::ctid_from_url(url),
            fields: TrialFields {
                brief_title: title.to_string(),
                ..Default::default()
            },
            captured_date: "May 04 2020".to_string(),
        }
    }

    const URL: &str = "https://clinicaltrials.gov/ct2/show/record/NCT04372602";

    #[test]
    fn exists_after_insert() {
        let conn = memory();
        assert!(!conn.exists(URL).unwrap());
        conn.insert(&record(URL, "Study of X")).unwrap();
        assert!(conn.exists(URL).unwrap());
        assert!(!conn.exists("https://clinicaltrials.gov/ct2/show/record/NCT1").unwrap());
    }

    #[test]
    fn duplicate_url_rejected() {
        let conn = memory();
        conn.insert(&record(URL, "a")).unwrap();
        let err = conn.insert(&record(URL, "b")).unwrap_err();
        assert!(matches!(err, CrawlError::Storage(_)));
    }

    #[test]
    fn fetch_round_trip_by_ctid() {
        let conn = memory();
        let r = record(URL, "Study of X");
        conn.insert(&r).unwrap();
        assert_eq!(fetch_by_ctid(&conn, "NCT04372602").unwrap(), Some(r));
        assert_eq!(fetch_by_ctid(&conn, "NCT00000000").unwrap(), None);
    }

    #[test]
    fn stats_counts() {
        let conn = memory();
        let s = get_stats(&conn).unwrap();
        assert_eq!(s.total, 0);
        assert_eq!(s.last_captured, None);

        conn.insert(&record(URL, "Study of X")).unwrap();
        conn.insert(&record("https://clinicaltrials.gov/ct2/show/record/NCT2", "")).unwrap();
        let s = get_stats(&conn).unwrap();
        assert_eq!(s.total, 2);
        assert_eq!(s.untitled, 1);
        assert_eq!(s.capture_days, 1);
        assert_eq!(s.last_captured.as_deref(), Some("May 04 2020"));
    }

    #[test]
    fn schema_is_reentrant() {
        let conn = memory();
        init_schema(&conn).unwrap();
    }
}
