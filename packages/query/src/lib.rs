#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Free-text Thai address lookup.
//!
//! Turns a partial address phrase such as `"บางนา กรุงเทพ"` into a ranked
//! list of catalog addresses.
//!
//! # Architecture
//!
//! - [`patterns`]: splits the phrase on whitespace and Thai address-unit
//!   markers into a fixed-size [`PatternSet`].
//! - [`resolver`]: searches each address field independently, picks the
//!   best-scoring field, expands its matches to catalog records and
//!   re-ranks them by full-address similarity.
//! - [`config`]: TOML-backed [`SearchConfig`] with embedded defaults.
//!
//! Every search builds its own fuzzy indexes, so an [`AddressQuery`] can be
//! shared across threads without locking.
//!
//! # Usage
//!
//! ```rust
//! use thai_address_models::Address;
//! use thai_address_query::{AddressQuery, SearchConfig};
//!
//! let catalog = vec![Address::new("บางนา", "บางนา", "กรุงเทพมหานคร", "10260")];
//! let query = AddressQuery::new(catalog, SearchConfig::default());
//! let results = query.search("บางนา");
//! assert_eq!(results[0].zip_code, "10260");
//! ```

pub mod config;
pub mod patterns;
pub mod resolver;

use std::sync::Arc;

pub use config::{ConfigError, SearchConfig};
pub use patterns::{Pattern, PatternSet, tokenize};
pub use resolver::Resolution;
use thai_address_models::Address;

/// A search session over one loaded catalog.
#[derive(Debug, Clone)]
pub struct AddressQuery {
    catalog: Arc<[Address]>,
    config: SearchConfig,
}

impl AddressQuery {
    /// Creates a session owning `catalog`.
    #[must_use]
    pub fn new(catalog: impl Into<Arc<[Address]>>, config: SearchConfig) -> Self {
        Self {
            catalog: catalog.into(),
            config,
        }
    }

    /// The catalog this session searches.
    #[must_use]
    pub fn catalog(&self) -> &[Address] {
        &self.catalog
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns the addresses matching `phrase`, best first, truncated to
    /// the configured limit.
    #[must_use]
    pub fn search(&self, phrase: &str) -> Vec<Address> {
        self.resolve(phrase).addresses
    }

    /// Like [`Self::search`], but also reports the winning field and
    /// whether the result was ranked.
    #[must_use]
    pub fn resolve(&self, phrase: &str) -> Resolution {
        let mut resolution = resolver::resolve(&self.catalog, phrase, &self.config.fuzzy);
        if let Some(limit) = self.config.limit {
            resolution.addresses.truncate(limit);
        }
        log::debug!(
            "Search {phrase:?} returned {} addresses (winning field: {:?})",
            resolution.addresses.len(),
            resolution.winning_field
        );
        resolution
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use thai_address_models::AddressField;

    use super::*;

    fn catalog() -> Vec<Address> {
        vec![
            Address::new("บางนาเหนือ", "บางนา", "กรุงเทพมหานคร", "10260"),
            Address::new("บางนาใต้", "บางนา", "กรุงเทพมหานคร", "10260"),
            Address::new("บางจาก", "พระโขนง", "กรุงเทพมหานคร", "10260"),
        ]
    }

    #[test]
    fn limit_truncates_results() {
        let config = SearchConfig {
            limit: Some(1),
            ..SearchConfig::default()
        };
        let query = AddressQuery::new(catalog(), config);
        let resolution = query.resolve("บางนา");
        assert_eq!(resolution.winning_field, Some(AddressField::District));
        assert_eq!(resolution.addresses.len(), 1);
    }

    #[test]
    fn empty_phrase_short_circuits() {
        let query = AddressQuery::new(catalog(), SearchConfig::default());
        assert!(query.search("").is_empty());
    }

    #[test]
    fn session_is_shareable_across_threads() {
        let query = Arc::new(AddressQuery::new(catalog(), SearchConfig::default()));
        let expected = query.search("พระโขนง");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let query = Arc::clone(&query);
                thread::spawn(move || query.search("พระโขนง"))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
        assert_eq!(expected[0].subdistrict, "บางจาก");
    }
}
