use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("unauthorized at {url}: {detail}")]
    Unauthorized { url: String, detail: String },

    #[error("anti-bot challenge (HTTP {status}) from {url}")]
    AntibotChallenge { status: u16, url: String },

    #[error("empty response body from {url}")]
    EmptyResponse { url: String },

    #[error("pagination limit reached for {context}: exceeded {max_pages} pages")]
    PaginationLimit { context: String, max_pages: usize },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("limit {limit} exceeds the maximum of {max}")]
    InvalidLimit { limit: u32, max: u32 },

    #[error("failed to read cookie file {path}: {source}")]
    CookieFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cookie file {path}: {source}")]
    CookieFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
