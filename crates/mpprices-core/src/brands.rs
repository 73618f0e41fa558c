use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ConfigError;

/// A Wildberries brand whose internal catalog should be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub brand_id: u64,
    /// Optional supplier filter passed to the catalog as `fsupplier`.
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub fsupplier: Option<String>,
}

impl BrandConfig {
    /// Brand name as it appears in output rows.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name.to_uppercase()
    }
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

/// Shape of a JSON brands file: `{"Brand": {"brand_id": 1, "fsupplier": "2"}}`.
#[derive(Debug, Deserialize)]
struct JsonBrandEntry {
    #[serde(deserialize_with = "number_or_string")]
    brand_id: u64,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    fsupplier: Option<String>,
}

/// Load and validate the brands configuration.
///
/// Files ending in `.json` use the name-keyed map format; anything else is
/// read as YAML with a top-level `brands:` list.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let brands_file = if is_json {
        parse_json_brands(&content)?
    } else {
        serde_yaml::from_str::<BrandsFile>(&content)?
    };

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn parse_json_brands(content: &str) -> Result<BrandsFile, ConfigError> {
    let map: BTreeMap<String, JsonBrandEntry> = serde_json::from_str(content)?;
    let brands = map
        .into_iter()
        .map(|(name, entry)| BrandConfig {
            name,
            brand_id: entry.brand_id,
            fsupplier: entry.fsupplier,
        })
        .collect();
    Ok(BrandsFile { brands })
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_ids = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if brand.brand_id == 0 {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has brand_id 0; must be a positive Wildberries brand id",
                brand.name
            )));
        }

        if !seen_names.insert(brand.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        if !seen_ids.insert(brand.brand_id) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand_id {} (from brand '{}')",
                brand.brand_id, brand.name
            )));
        }
    }

    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Text(String),
}

fn number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
    }
}

fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        NumberOrString::Number(n) => Some(n.to_string()),
        NumberOrString::Text(s) if s.trim().is_empty() => None,
        NumberOrString::Text(s) => Some(s.trim().to_string()),
    }))
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
