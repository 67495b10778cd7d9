#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading the Thai address catalog.
//!
//! The catalog is a JSON array of objects with `subdistrict`, `district`,
//! `province` and `zipCode` keys, read from a local file or fetched once
//! over HTTP. Records are normalized on load so the search pipeline only
//! ever sees four plain strings per address:
//!
//! - missing or `null` fields become empty strings,
//! - numeric fields (zip codes are often stored as numbers) become their
//!   decimal text,
//! - every field is trimmed,
//! - records with all four fields empty are dropped.

pub mod retry;
#[cfg(test)]
mod test_server;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;
use thai_address_models::{Address, AddressField, CatalogStats};
use thiserror::Error;

/// Timeout for a single catalog download attempt.
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from catalog loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// I/O error reading a local catalog.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP status error: {message}")]
    Status {
        /// Description of the status failure.
        message: String,
    },

    /// The top-level JSON value is not an array.
    #[error("Catalog must be a JSON array, found {found}")]
    NotAnArray {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A record or one of its fields has an unsupported type.
    #[error("Invalid record at index {index}: {message}")]
    InvalidRecord {
        /// Position of the record in the JSON array.
        index: usize,
        /// What was wrong with it.
        message: String,
    },
}

/// Where to load a catalog from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Local JSON file.
    Path(PathBuf),
    /// `http://` or `https://` URL serving the JSON array.
    Url(String),
}

impl FromStr for CatalogSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::Url(s.to_string()))
        } else {
            Ok(Self::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// An insertion-ordered, read-only list of addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    addresses: Vec<Address>,
}

impl Catalog {
    /// Wraps already-normalized addresses.
    #[must_use]
    pub const fn new(addresses: Vec<Address>) -> Self {
        Self { addresses }
    }

    /// Loads a catalog from either a file or a URL.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the source cannot be read or parsed.
    #[allow(clippy::future_not_send)]
    pub async fn load(source: &CatalogSource) -> Result<Self, CatalogError> {
        match source {
            CatalogSource::Path(path) => Self::from_path(path),
            CatalogSource::Url(url) => Self::fetch(url).await,
        }
    }

    /// Reads a catalog from a local JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        log::info!("Loading address catalog from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Downloads a catalog with a single GET (retried on transient
    /// failures).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the download fails or the body is not a
    /// valid catalog.
    #[allow(clippy::future_not_send)]
    pub async fn fetch(url: &str) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Self::fetch_with_client(&client, url).await
    }

    /// Like [`Self::fetch`], but through a caller-configured client.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the download fails or the body is not a
    /// valid catalog.
    #[allow(clippy::future_not_send)]
    pub async fn fetch_with_client(
        client: &reqwest::Client,
        url: &str,
    ) -> Result<Self, CatalogError> {
        log::info!("Fetching address catalog from {url}");
        let value = retry::send_json(|| client.get(url)).await?;
        Self::from_value(value)
    }

    /// Parses a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the text is not JSON or not a valid
    /// catalog.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Builds a catalog from an already-parsed JSON value, normalizing
    /// every record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotAnArray`] or
    /// [`CatalogError::InvalidRecord`].
    pub fn from_value(value: Value) -> Result<Self, CatalogError> {
        let records = match value {
            Value::Array(records) => records,
            other => {
                return Err(CatalogError::NotAnArray {
                    found: json_type(&other),
                });
            }
        };

        let total = records.len();
        let mut addresses = Vec::with_capacity(total);
        let mut dropped = 0usize;

        for (index, record) in records.iter().enumerate() {
            let address = normalize_record(index, record)?;
            if AddressField::ALL
                .iter()
                .all(|field| address.field(*field).is_empty())
            {
                log::warn!("Dropping empty catalog record at index {index}");
                dropped += 1;
                continue;
            }
            addresses.push(address);
        }

        log::info!(
            "Loaded {} addresses ({dropped} empty records dropped of {total})",
            addresses.len()
        );

        Ok(Self { addresses })
    }

    /// All addresses in catalog order.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Consumes the catalog, returning its addresses.
    #[must_use]
    pub fn into_addresses(self) -> Vec<Address> {
        self.addresses
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether the catalog holds no addresses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Record count and distinct values per field.
    #[must_use]
    pub fn stats(&self) -> CatalogStats {
        let distinct = |field: AddressField| {
            self.addresses
                .iter()
                .map(|a| a.field(field))
                .collect::<HashSet<_>>()
                .len()
        };

        CatalogStats {
            records: self.addresses.len(),
            subdistricts: distinct(AddressField::Subdistrict),
            districts: distinct(AddressField::District),
            provinces: distinct(AddressField::Province),
            zip_codes: distinct(AddressField::ZipCode),
        }
    }
}

/// Turns one JSON record into an [`Address`].
fn normalize_record(index: usize, record: &Value) -> Result<Address, CatalogError> {
    let Value::Object(map) = record else {
        return Err(CatalogError::InvalidRecord {
            index,
            message: format!("expected an object, found {}", json_type(record)),
        });
    };

    let read = |field: AddressField| -> Result<String, CatalogError> {
        let key = field.as_ref();
        match map.get(key) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(CatalogError::InvalidRecord {
                index,
                message: format!("field `{key}` is {}", json_type(other)),
            }),
        }
    };

    Ok(Address {
        subdistrict: read(AddressField::Subdistrict)?,
        district: read(AddressField::District)?,
        province: read(AddressField::Province)?,
        zip_code: read(AddressField::ZipCode)?,
    })
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
