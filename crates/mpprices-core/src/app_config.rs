use std::path::PathBuf;

use crate::ConfigError;

/// How the Ozon catalog session is warmed up before API calls.
///
/// `Light` visits only the homepage. `Full` additionally visits the seller
/// storefront page so the anti-bot layer sees a navigation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OzonMode {
    Light,
    Full,
}

impl std::fmt::Display for OzonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OzonMode::Light => write!(f, "light"),
            OzonMode::Full => write!(f, "full"),
        }
    }
}

/// Whether the configured Ozon seller is our own account (Seller API usable)
/// or a foreign storefront observed through the public catalog only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    My,
    Foreign,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::My => write!(f, "my"),
            AccountType::Foreign => write!(f, "foreign"),
        }
    }
}

#[derive(Clone)]
pub struct WbCabinetConfig {
    pub key: String,
    pub supplier_id: u64,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for WbCabinetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WbCabinetConfig")
            .field("key", &self.key)
            .field("supplier_id", &self.supplier_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Clone)]
pub struct WbSettings {
    pub cabinets: Vec<WbCabinetConfig>,
    /// Delivery destination region passed as `dest` to the catalog.
    pub dest: i64,
    /// Buyer discount percent passed as `spp` to the catalog.
    pub spp: u32,
    /// Cookie string assembled from `WB_COOKIES` and `WB_COOKIE_*`.
    pub cookies: Option<String>,
}

impl WbSettings {
    /// Looks up a cabinet by key, case-insensitively.
    #[must_use]
    pub fn cabinet(&self, key: &str) -> Option<&WbCabinetConfig> {
        self.cabinets
            .iter()
            .find(|c| c.key.eq_ignore_ascii_case(key))
    }

    /// The cabinet selling under `supplier_id`, honouring
    /// `WB_CABINET_ID_*` overrides.
    #[must_use]
    pub fn cabinet_by_supplier(&self, supplier_id: u64) -> Option<&WbCabinetConfig> {
        self.cabinets.iter().find(|c| c.supplier_id == supplier_id)
    }
}

impl std::fmt::Debug for WbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WbSettings")
            .field("cabinets", &self.cabinets)
            .field("dest", &self.dest)
            .field("spp", &self.spp)
            .field("cookies", &self.cookies.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Clone)]
pub struct OzonSettings {
    pub mode: OzonMode,
    pub account_type: AccountType,
    pub client_id: Option<u64>,
    pub api_key: Option<String>,
    pub seller_id: u64,
    pub seller_name: String,
    pub cookies: Option<String>,
    pub cookies_path: PathBuf,
    pub catalog_request_delay_ms: u64,
    pub catalog_max_concurrent: usize,
    pub seller_request_delay_ms: u64,
    pub adaptive_delay: bool,
    pub proxy: Option<String>,
    pub test_limit: Option<usize>,
    pub max_pages: usize,
}

impl OzonSettings {
    /// Checks the fields needed to address the seller storefront.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the seller id is zero or the
    /// seller name is blank.
    pub fn validate_catalog(&self) -> Result<(), ConfigError> {
        if self.seller_id == 0 {
            return Err(ConfigError::Validation(
                "OZON_SELLER_ID_COSMO must be non-zero".to_string(),
            ));
        }
        if self.seller_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "OZON_SELLER_NAME_COSMO must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the Seller API credentials `(client_id, api_key)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when a credential is absent and
    /// [`ConfigError::Validation`] when it is present but unusable.
    pub fn seller_credentials(&self) -> Result<(u64, &str), ConfigError> {
        let client_id = self
            .client_id
            .ok_or_else(|| ConfigError::MissingEnvVar("OZON_CLIENT_ID".to_string()))?;
        if client_id == 0 {
            return Err(ConfigError::Validation(
                "OZON_CLIENT_ID must be non-zero".to_string(),
            ));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("OZON_API_KEY".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "OZON_API_KEY must be non-empty".to_string(),
            ));
        }
        Ok((client_id, api_key))
    }
}

impl std::fmt::Debug for OzonSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OzonSettings")
            .field("mode", &self.mode)
            .field("account_type", &self.account_type)
            .field("client_id", &self.client_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("seller_id", &self.seller_id)
            .field("seller_name", &self.seller_name)
            .field("cookies", &self.cookies.as_ref().map(|_| "[redacted]"))
            .field("cookies_path", &self.cookies_path)
            .field("catalog_request_delay_ms", &self.catalog_request_delay_ms)
            .field("catalog_max_concurrent", &self.catalog_max_concurrent)
            .field("seller_request_delay_ms", &self.seller_request_delay_ms)
            .field("adaptive_delay", &self.adaptive_delay)
            .field("proxy", &self.proxy.as_ref().map(|_| "[redacted]"))
            .field("test_limit", &self.test_limit)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub log_level: String,
    pub logs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub brands_path: PathBuf,
    pub articles_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub request_delay_ms: u64,
    pub max_concurrent_requests: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub wb: WbSettings,
    pub ozon: OzonSettings,
}
