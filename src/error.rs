use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("empty body for {url}")]
    EmptyBody { url: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl CrawlError {
    /// Page-level failures: the server answered, but not with a usable record page.
    pub fn is_bad_response(&self) -> bool {
        matches!(self, CrawlError::Status { .. } | CrawlError::EmptyBody { .. })
    }
}
