#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for Thai address lookup.
//!
//! This crate contains only data types and simple conversions. It has no
//! heavyweight dependencies (no regex, no I/O).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A single structured address from the catalog.
///
/// Addresses have no identity field. Two records with the same four field
/// values are indistinguishable to the search pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Sub-district (ตำบล / แขวง).
    pub subdistrict: String,
    /// District (อำเภอ / เขต).
    pub district: String,
    /// Province (จังหวัด).
    pub province: String,
    /// Postal code. Kept as text: leading zeros and formatting are opaque.
    pub zip_code: String,
}

impl Address {
    /// Creates an address from its four components.
    #[must_use]
    pub fn new(
        subdistrict: impl Into<String>,
        district: impl Into<String>,
        province: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            subdistrict: subdistrict.into(),
            district: district.into(),
            province: province.into(),
            zip_code: zip_code.into(),
        }
    }

    /// Returns the value of a single field.
    #[must_use]
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::Subdistrict => &self.subdistrict,
            AddressField::District => &self.district,
            AddressField::Province => &self.province,
            AddressField::ZipCode => &self.zip_code,
        }
    }

    /// Full-address text: `subdistrict district province zipCode`.
    ///
    /// This is the text the final re-rank searches and the key used to map
    /// matched strings back to records.
    #[must_use]
    pub fn join_key(&self) -> String {
        format!(
            "{} {} {} {}",
            self.subdistrict, self.district, self.province, self.zip_code
        )
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.join_key())
    }
}

/// One of the four searchable address fields.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AddressField {
    /// Sub-district.
    Subdistrict,
    /// District.
    District,
    /// Province.
    Province,
    /// Postal code.
    ZipCode,
}

impl AddressField {
    /// All fields in search order. Score ties between fields are won by
    /// the earlier entry.
    pub const ALL: [Self; 4] = [
        Self::Subdistrict,
        Self::District,
        Self::Province,
        Self::ZipCode,
    ];
}

/// One approximate match produced by the fuzzy index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The matched corpus entry.
    pub item: String,
    /// Similarity score in `[0, 1]`. Lower is better; 0 is a perfect match.
    pub score: f64,
    /// Position of `item` in the corpus the index was built from.
    pub ref_index: usize,
    /// Inclusive character ranges of `item` that matched the pattern.
    pub indices: Vec<(usize, usize)>,
}

/// A [`MatchResult`] tagged with the field whose projection produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    /// The underlying match.
    #[serde(flatten)]
    pub result: MatchResult,
    /// Field the match was found in.
    pub search_type: AddressField,
}

impl FieldMatch {
    /// Tags a match with its field.
    #[must_use]
    pub const fn new(result: MatchResult, search_type: AddressField) -> Self {
        Self {
            result,
            search_type,
        }
    }

    /// Convenience accessor for the match score.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.result.score
    }
}

/// Distinct-value counts for a loaded catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Number of address records.
    pub records: usize,
    /// Distinct sub-district names.
    pub subdistricts: usize,
    /// Distinct district names.
    pub districts: usize,
    /// Distinct province names.
    pub provinces: usize,
    /// Distinct postal codes.
    pub zip_codes: usize,
}
