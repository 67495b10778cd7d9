#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Approximate string index used by the Thai address cascade.
//!
//! A [`FuzzyIndex`] is built once from a corpus of strings and is immutable
//! afterwards, so the same index can be searched from several threads and a
//! fresh index per field keeps every search call self-contained.
//!
//! Matching is bitap-based (see [`bitap`]):
//!
//! - case-insensitive, character (not byte) oriented,
//! - location-insensitive: a match in the middle of a string is not
//!   penalized,
//! - tolerant of substitutions, insertions and deletions up to
//!   [`FuzzyOptions::threshold`] errors per pattern character,
//! - scores in `[0, 1]`, lower is better, an identical string scores 0.
//!
//! # Usage
//!
//! ```rust
//! use thai_address_fuzzy::{FuzzyIndex, FuzzyOptions};
//!
//! let index = FuzzyIndex::build(["บางนา", "บางกะปิ", "พระโขนง"], FuzzyOptions::default());
//! let hits = index.search("บางนา");
//! assert_eq!(hits[0].item, "บางนา");
//! assert_eq!(hits[0].ref_index, 0);
//! ```

pub mod bitap;

use serde::{Deserialize, Serialize};
use thai_address_models::MatchResult;

use bitap::BitapSearcher;

/// Default maximum error ratio for a match to be kept.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Default minimum run of matched characters.
pub const DEFAULT_MIN_MATCH_CHAR_LENGTH: usize = 2;

/// Tuning knobs for [`FuzzyIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyOptions {
    /// Maximum error ratio (errors / pattern length) for a match.
    /// `0.0` only accepts exact substrings, `1.0` accepts anything.
    pub threshold: f64,
    /// A text only matches when it contains a run of at least this many
    /// consecutive characters that occur in the pattern.
    pub min_match_char_length: usize,
    /// Disables the field-length norm that makes long texts need a better
    /// raw score than short ones.
    pub ignore_field_norm: bool,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_match_char_length: DEFAULT_MIN_MATCH_CHAR_LENGTH,
            ignore_field_norm: false,
        }
    }
}

/// A corpus entry with its precomputed search form.
#[derive(Debug, Clone)]
struct Entry {
    text: String,
    lowered: Vec<char>,
    norm: f64,
}

/// Immutable approximate-match index over a list of strings.
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
    entries: Vec<Entry>,
    options: FuzzyOptions,
}

impl FuzzyIndex {
    /// Builds an index over `corpus`. Positions in `corpus` become the
    /// `ref_index` of each [`MatchResult`].
    #[must_use]
    pub fn build<I, S>(corpus: I, options: FuzzyOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = corpus
            .into_iter()
            .map(|s| {
                let text: String = s.into();
                let lowered = text.to_lowercase().chars().collect();
                let norm = field_norm(&text);
                Entry {
                    text,
                    lowered,
                    norm,
                }
            })
            .collect();

        Self { entries, options }
    }

    /// Number of indexed strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options this index was built with.
    #[must_use]
    pub const fn options(&self) -> &FuzzyOptions {
        &self.options
    }

    /// Returns every corpus entry that approximately contains `pattern`,
    /// best score first. Entries with equal scores keep corpus order.
    ///
    /// An empty pattern matches nothing.
    #[must_use]
    pub fn search(&self, pattern: &str) -> Vec<MatchResult> {
        let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
        if pattern.is_empty() {
            return Vec::new();
        }

        let searcher = BitapSearcher::new(
            &pattern,
            self.options.threshold,
            self.options.min_match_char_length,
        );

        let mut results: Vec<MatchResult> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(ref_index, entry)| {
                let found = searcher.search_in(&entry.lowered)?;
                Some(MatchResult {
                    item: entry.text.clone(),
                    score: self.apply_norm(found.score, entry.norm),
                    ref_index,
                    indices: found.indices,
                })
            })
            .collect();

        results.sort_by(|a, b| a.score.total_cmp(&b.score));

        log::trace!(
            "fuzzy search {:?}: {} of {} entries matched",
            pattern.iter().collect::<String>(),
            results.len(),
            self.entries.len()
        );

        results
    }

    fn apply_norm(&self, score: f64, norm: f64) -> f64 {
        if self.options.ignore_field_norm || score <= 0.0 {
            score
        } else {
            score.powf(norm)
        }
    }
}

/// `1 / sqrt(word_count)`, rounded to three decimals.
fn field_norm(text: &str) -> f64 {
    let words = text.split(' ').filter(|w| !w.is_empty()).count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let norm = 1.0 / (words as f64).sqrt();
    (norm * 1000.0).round() / 1000.0
}
