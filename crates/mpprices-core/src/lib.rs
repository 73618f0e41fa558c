pub mod app_config;
pub mod brands;
pub mod cabinets;
pub mod config;

pub use app_config::{AccountType, AppConfig, OzonMode, OzonSettings, WbCabinetConfig, WbSettings};
pub use brands::{load_brands, BrandConfig, BrandsFile};
pub use cabinets::{ozon_cabinet_name, WbCabinet, WB_CABINETS};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands YAML: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("failed to parse brands JSON: {0}")]
    BrandsFileJson(#[from] serde_json::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
