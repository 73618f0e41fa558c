pub mod adaptive;
pub mod browser;
pub mod cookies;
pub mod error;
mod http;
pub mod ozon;
pub mod price_text;
pub mod rate_limit;
pub mod redact;
pub mod wb;

pub use adaptive::{AdaptiveDelayer, DelayStats};
pub use cookies::CookieJar;
pub use error::ScraperError;
pub use rate_limit::MinInterval;
