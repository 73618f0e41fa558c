use std::path::PathBuf;

use crate::app_config::{
    AccountType, AppConfig, OzonMode, OzonSettings, WbCabinetConfig, WbSettings,
};
use crate::cabinets::WB_CABINETS;
use crate::ConfigError;

/// Desktop Chrome UA used for every marketplace request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Individual Wildberries cookies that may be supplied one env var each.
///
/// Pairs of `(env suffix, cookie name)`; the env var is `WB_COOKIE_{suffix}`.
const WB_COOKIE_VARS: [(&str, &str); 5] = [
    ("WBX_VALIDATION_KEY", "wbx-validation-key"),
    ("_CP", "_cp"),
    ("ROUTEB", "routeb"),
    ("X_WBAAS_TOKEN", "x_wbaas_token"),
    ("_WBAUID", "_wbauid"),
];

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Nothing here is globally required: credentials are checked by the command
/// that needs them, so `wb brands` runs without any API keys at all.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got \"{raw}\""))
            }),
            Err(_) => Ok(default),
        }
    };

    let debug = parse_flag("DEBUG", false)?;
    let log_level = or_default("MPPRICES_LOG_LEVEL", if debug { "debug" } else { "info" });
    let logs_dir = PathBuf::from(or_default("LOGS_DIR", "./logs"));
    let output_dir = PathBuf::from(or_default("OUTPUT_DIR", "./output"));
    let brands_path = PathBuf::from(or_default("BRANDS_PATH", "./config/brands.yaml"));
    let articles_path = PathBuf::from(or_default("ARTICLES_PATH", "./Articles.xlsx"));

    let request_timeout_secs = parse_u64("REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("USER_AGENT", DEFAULT_USER_AGENT);
    let request_delay_ms = parse_u64("REQUEST_DELAY_MS", "500")?;
    let max_concurrent_requests = parse_usize("MAX_CONCURRENT_REQUESTS", "10")?;
    let max_retries = parse_u32("MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("RETRY_BACKOFF_BASE_MS", "2000")?;

    let mut cabinets = Vec::with_capacity(WB_CABINETS.len());
    for cab in &WB_CABINETS {
        let id_var = format!("WB_CABINET_ID_{}", cab.key);
        let supplier_id = parse_u64(id_var.as_str(), cab.supplier_id.to_string().as_str())?;
        let api_key = optional(format!("WB_API_KEY_{}", cab.key).as_str())
            .or_else(|| optional(format!("WB_CONTENT_API_TOKEN_{}", cab.key).as_str()))
            .or_else(|| optional("WB_CONTENT_API_TOKEN"));
        cabinets.push(WbCabinetConfig {
            key: cab.key.to_string(),
            supplier_id,
            api_key,
        });
    }

    let mut cookie_pairs: Vec<String> = Vec::new();
    if let Some(raw) = optional("WB_COOKIES") {
        cookie_pairs.push(raw.trim().trim_end_matches(';').to_string());
    }
    for (suffix, name) in WB_COOKIE_VARS {
        if let Some(value) = optional(format!("WB_COOKIE_{suffix}").as_str()) {
            cookie_pairs.push(format!("{name}={}", value.trim()));
        }
    }
    let wb_cookies = (!cookie_pairs.is_empty()).then(|| cookie_pairs.join("; "));

    let wb = WbSettings {
        cabinets,
        dest: parse_i64("WB_DEST", "-3115289")?,
        spp: parse_u32("WB_SPP", "30")?,
        cookies: wb_cookies,
    };

    let mode = parse_ozon_mode(&or_default("OZON_MODE", "full"))?;
    let account_type = parse_account_type(&or_default("OZON_ACCOUNT_TYPE", "foreign"))?;
    let client_id = match optional("OZON_CLIENT_ID") {
        Some(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("OZON_CLIENT_ID", e.to_string()))?,
        ),
        None => None,
    };
    let test_limit = match optional("OZON_TEST_LIMIT") {
        Some(raw) => Some(
            raw.trim()
                .parse::<usize>()
                .map_err(|e| invalid("OZON_TEST_LIMIT", e.to_string()))?,
        ),
        None => None,
    };

    let ozon = OzonSettings {
        mode,
        account_type,
        client_id,
        api_key: optional("OZON_API_KEY"),
        seller_id: parse_u64("OZON_SELLER_ID_COSMO", "176640")?,
        seller_name: or_default("OZON_SELLER_NAME_COSMO", "cosmo-beauty"),
        cookies: optional("OZON_COOKIES"),
        cookies_path: PathBuf::from(or_default("OZON_COOKIES_PATH", "cookies/ozon_cookies.json")),
        catalog_request_delay_ms: parse_u64("OZON_CATALOG_REQUEST_DELAY_MS", "1000")?,
        catalog_max_concurrent: parse_usize("OZON_CATALOG_MAX_CONCURRENT", "3")?,
        seller_request_delay_ms: parse_u64("OZON_SELLER_REQUEST_DELAY_MS", "500")?,
        adaptive_delay: parse_flag("OZON_ADAPTIVE_DELAY", true)?,
        proxy: optional("OZON_PROXY"),
        test_limit,
        max_pages: parse_usize("OZON_MAX_PAGES", "100")?,
    };

    Ok(AppConfig {
        log_level,
        logs_dir,
        output_dir,
        brands_path,
        articles_path,
        request_timeout_secs,
        user_agent,
        request_delay_ms,
        max_concurrent_requests,
        max_retries,
        retry_backoff_base_ms,
        wb,
        ozon,
    })
}

/// Parse a boolean flag leniently. Returns `None` for unrecognised input.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_ozon_mode(s: &str) -> Result<OzonMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "light" => Ok(OzonMode::Light),
        "full" => Ok(OzonMode::Full),
        other => Err(ConfigError::InvalidEnvVar {
            var: "OZON_MODE".to_string(),
            reason: format!("expected 'light' or 'full', got '{other}'"),
        }),
    }
}

fn parse_account_type(s: &str) -> Result<AccountType, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "my" => Ok(AccountType::My),
        "foreign" => Ok(AccountType::Foreign),
        other => Err(ConfigError::InvalidEnvVar {
            var: "OZON_ACCOUNT_TYPE".to_string(),
            reason: format!("expected 'my' or 'foreign', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
