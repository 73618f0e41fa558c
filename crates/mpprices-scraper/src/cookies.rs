//! A small name→value cookie jar rendered into a `Cookie` request header.
//!
//! The anti-bot layers on both marketplaces key off a handful of cookies
//! issued by earlier page visits. `reqwest`'s built-in store cannot be
//! inspected or seeded from a string, so the jar is kept by hand and merged
//! from `Set-Cookie` headers after every response.

use std::collections::BTreeMap;
use std::path::Path;

use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::Deserialize;

use crate::error::ScraperError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

const MIN_CREDENTIAL_LEN: usize = 16;

/// Accepted cookie-file layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum CookieFile {
    CookieString { cookies_string: String },
    Nested { cookies: BTreeMap<String, serde_json::Value> },
    Flat(BTreeMap<String, serde_json::Value>),
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `name=value; other=value` string. Pairs without `=` or with
    /// an empty name are skipped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut jar = Self::new();
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    jar.set(name, value.trim());
                }
            }
        }
        jar
    }

    /// Loads cookies from a JSON file.
    ///
    /// Three layouts are accepted: `{"cookies_string": "a=b; c=d"}`,
    /// `{"cookies": {"a": "b"}}`, and a flat `{"a": "b"}` map. Non-string
    /// values are rendered with their JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::CookieFileIo`] if the file cannot be read and
    /// [`ScraperError::CookieFileParse`] if it is not one of the layouts above.
    pub fn load_file(path: &Path) -> Result<Self, ScraperError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ScraperError::CookieFileIo {
                path: path.display().to_string(),
                source: e,
            })?;
        let parsed: CookieFile =
            serde_json::from_str(&content).map_err(|e| ScraperError::CookieFileParse {
                path: path.display().to_string(),
                source: e,
            })?;

        let jar = match parsed {
            CookieFile::CookieString { cookies_string } => Self::parse(&cookies_string),
            CookieFile::Nested { cookies } | CookieFile::Flat(cookies) => {
                let mut jar = Self::new();
                for (name, value) in cookies {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    jar.set(&name, &value);
                }
                jar
            }
        };
        Ok(jar)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Cookie names in the jar, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    /// Values long enough to be session tokens; these are scrubbed from
    /// logged response bodies. Short values are flags and ids.
    #[must_use]
    pub fn credential_values(&self) -> Vec<&str> {
        self.cookies
            .values()
            .map(String::as_str)
            .filter(|v| v.len() >= MIN_CREDENTIAL_LEN)
            .collect()
    }

    /// Copies every cookie from `other`, overwriting duplicates.
    pub fn merge(&mut self, other: &CookieJar) {
        for (name, value) in &other.cookies {
            self.cookies.insert(name.clone(), value.clone());
        }
    }

    /// Absorbs `Set-Cookie` headers from a response. Attributes such as
    /// `Path` or `Expires` are ignored. Returns how many cookies were set.
    pub fn merge_set_cookie(&mut self, headers: &HeaderMap) -> usize {
        let mut merged = 0;
        for value in headers.get_all(SET_COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            let first = raw.split(';').next().unwrap_or_default();
            if let Some((name, value)) = first.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    self.set(name, value.trim());
                    merged += 1;
                }
            }
        }
        merged
    }

    /// Returns the entries of `important` that are absent from the jar.
    #[must_use]
    pub fn missing<'a>(&self, important: &[&'a str]) -> Vec<&'a str> {
        important
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect()
    }

    /// Renders the jar as a `Cookie` header value, or `None` when empty.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
