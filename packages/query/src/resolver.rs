//! Cascade resolution of a query phrase against the address catalog.
//!
//! The pipeline has four stages:
//!
//! 1. **Field search**: every pattern is searched against the distinct
//!    values of each field (subdistrict, district, province, zip code).
//! 2. **Winning field**: the field holding the single best score wins.
//!    Ties go to the earlier field in [`AddressField::ALL`].
//! 3. **Candidates**: every catalog record whose winning-field value equals
//!    one of that field's matches, in match order then catalog order.
//! 4. **Re-rank**: the candidates' full-address texts are searched with the
//!    whole phrase. If nothing matches, all candidates are returned
//!    unranked instead.
//!
//! "No match" never becomes an error: it degrades to an empty or a
//! permissive result.

use std::collections::{HashMap, HashSet};

use thai_address_fuzzy::{FuzzyIndex, FuzzyOptions};
use thai_address_models::{Address, AddressField, FieldMatch};

use crate::patterns::{PatternSet, tokenize};

/// Outcome of resolving one phrase.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    /// Matching addresses, best first.
    pub addresses: Vec<Address>,
    /// Field whose matches selected the candidates, if any field matched.
    pub winning_field: Option<AddressField>,
    /// Best score of every field that produced matches, in field order.
    pub field_scores: Vec<(AddressField, f64)>,
    /// `false` when the full-address re-rank found nothing and the
    /// candidates are returned in catalog-derived order.
    pub ranked: bool,
}

/// Searches `catalog` for `phrase` and returns the matching addresses.
#[must_use]
pub fn search(catalog: &[Address], phrase: &str, options: &FuzzyOptions) -> Vec<Address> {
    resolve(catalog, phrase, options).addresses
}

/// Runs the full cascade and reports how the result was reached.
#[must_use]
pub fn resolve(catalog: &[Address], phrase: &str, options: &FuzzyOptions) -> Resolution {
    if phrase.is_empty() {
        return Resolution::default();
    }

    let patterns = tokenize(phrase);
    log::debug!("Patterns for {phrase:?}: {patterns}");

    let per_field: Vec<(AddressField, Vec<FieldMatch>)> = AddressField::ALL
        .iter()
        .map(|field| (*field, search_field(catalog, *field, &patterns, options)))
        .collect();

    let field_scores: Vec<(AddressField, f64)> = per_field
        .iter()
        .filter_map(|(field, matches)| matches.first().map(|m| (*field, m.score())))
        .collect();

    let Some(winner) = winning_field(&field_scores) else {
        log::debug!("No field matched {phrase:?}");
        return Resolution {
            field_scores,
            ..Resolution::default()
        };
    };

    let winning_matches = per_field
        .iter()
        .find(|(field, _)| *field == winner)
        .map_or(&[][..], |(_, matches)| matches.as_slice());

    let candidates = candidate_records(catalog, winner, winning_matches);
    log::debug!(
        "Winning field {winner} with {} matches -> {} candidate records",
        winning_matches.len(),
        candidates.len()
    );

    let (addresses, ranked) = rerank(&candidates, &patterns, options);

    Resolution {
        addresses,
        winning_field: Some(winner),
        field_scores,
        ranked,
    }
}

/// Searches every pattern against the distinct values of one field.
///
/// Results are deduplicated by `ref_index` (first occurrence wins), sorted
/// by score and tagged with `field`. Placeholder positions are skipped.
#[must_use]
pub fn search_field(
    catalog: &[Address],
    field: AddressField,
    patterns: &PatternSet,
    options: &FuzzyOptions,
) -> Vec<FieldMatch> {
    let index = FuzzyIndex::build(distinct_values(catalog, field), *options);

    let mut seen = HashSet::new();
    let mut matches: Vec<FieldMatch> = patterns
        .tokens()
        .flat_map(|token| index.search(token))
        .filter(|result| seen.insert(result.ref_index))
        .map(|result| FieldMatch::new(result, field))
        .collect();

    matches.sort_by(|a, b| a.score().total_cmp(&b.score()));
    matches
}

/// Distinct values of `field` across the catalog, in first-occurrence
/// order.
#[must_use]
pub fn distinct_values(catalog: &[Address], field: AddressField) -> Vec<&str> {
    let mut seen = HashSet::new();
    catalog
        .iter()
        .map(|address| address.field(field))
        .filter(|value| seen.insert(*value))
        .collect()
}

/// Picks the field with the lowest best score.
///
/// `field_scores` is in [`AddressField::ALL`] order; only a strictly
/// better score replaces the current winner, so ties go to the earlier
/// field.
fn winning_field(field_scores: &[(AddressField, f64)]) -> Option<AddressField> {
    let mut best: Option<(AddressField, f64)> = None;
    for (field, score) in field_scores {
        match best {
            Some((_, best_score)) if *score >= best_score => {}
            _ => best = Some((*field, *score)),
        }
    }
    best.map(|(field, _)| field)
}

/// Every catalog record whose `field` value equals a matched item.
///
/// Outer order follows `matches` (best score first), inner order follows
/// the catalog. Equal records are all kept.
fn candidate_records<'a>(
    catalog: &'a [Address],
    field: AddressField,
    matches: &[FieldMatch],
) -> Vec<&'a Address> {
    matches
        .iter()
        .flat_map(|m| {
            catalog
                .iter()
                .filter(move |address| address.field(field) == m.result.item)
        })
        .collect()
}

/// Re-ranks candidates by searching their full-address text with the
/// phrase. Returns the addresses and whether the re-rank matched anything.
fn rerank(
    candidates: &[&Address],
    patterns: &PatternSet,
    options: &FuzzyOptions,
) -> (Vec<Address>, bool) {
    let mut by_key: HashMap<String, &Address> = HashMap::new();
    let mut keys: Vec<String> = Vec::new();
    for address in candidates {
        let key = address.join_key();
        if !by_key.contains_key(&key) {
            by_key.insert(key.clone(), *address);
            keys.push(key);
        }
    }

    let query = patterns.query_text();
    let index = FuzzyIndex::build(keys.iter().map(String::as_str), *options);
    let results = index.search(&query);

    if results.is_empty() {
        log::debug!(
            "Re-rank of {query:?} matched nothing, returning {} unranked candidates",
            keys.len()
        );
        let addresses = keys
            .iter()
            .filter_map(|key| by_key.get(key).map(|address| (*address).clone()))
            .collect();
        return (addresses, false);
    }

    let addresses = results
        .iter()
        .filter_map(|result| by_key.get(&result.item).map(|address| (*address).clone()))
        .collect();
    (addresses, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bang_na() -> Address {
        Address::new("บางนา", "บางนา", "กรุงเทพมหานคร", "10260")
    }

    fn catalog() -> Vec<Address> {
        vec![
            Address::new("บางนาเหนือ", "บางนา", "กรุงเทพมหานคร", "10260"),
            Address::new("บางนาใต้", "บางนา", "กรุงเทพมหานคร", "10260"),
            Address::new("คลองตัน", "คลองเตย", "กรุงเทพมหานคร", "10110"),
            Address::new("พระโขนง", "คลองเตย", "กรุงเทพมหานคร", "10110"),
            Address::new("บางพลีใหญ่", "บางพลี", "สมุทรปราการ", "10540"),
            Address::new("บางแก้ว", "บางพลี", "สมุทรปราการ", "10540"),
        ]
    }

    fn search_default(catalog: &[Address], phrase: &str) -> Resolution {
        resolve(catalog, phrase, &FuzzyOptions::default())
    }

    #[test]
    fn empty_phrase_returns_nothing() {
        let resolution = search_default(&catalog(), "");
        assert!(resolution.addresses.is_empty());
        assert_eq!(resolution.winning_field, None);
    }

    #[test]
    fn empty_catalog_returns_nothing() {
        let resolution = search_default(&[], "anything");
        assert!(resolution.addresses.is_empty());
        assert!(resolution.field_scores.is_empty());
    }

    #[test]
    fn separator_only_phrase_returns_nothing() {
        assert!(search_default(&catalog(), "ตำบล อำเภอ").addresses.is_empty());
    }

    #[test]
    fn single_record_tie_goes_to_subdistrict() {
        let resolution = search_default(&[bang_na()], "บางนา");
        assert_eq!(resolution.winning_field, Some(AddressField::Subdistrict));
        assert_eq!(resolution.addresses, vec![bang_na()]);
        assert!(resolution.ranked);

        let scores: HashMap<AddressField, f64> = resolution.field_scores.into_iter().collect();
        assert!(scores[&AddressField::Subdistrict].abs() < f64::EPSILON);
        assert!(scores[&AddressField::District].abs() < f64::EPSILON);
    }

    #[test]
    fn tie_break_follows_field_order() {
        let scores = [
            (AddressField::District, 0.2),
            (AddressField::Province, 0.1),
            (AddressField::ZipCode, 0.1),
        ];
        assert_eq!(winning_field(&scores), Some(AddressField::Province));
        assert_eq!(winning_field(&[]), None);
    }

    #[test]
    fn exact_district_wins_and_expands_to_all_its_records() {
        let resolution = search_default(&catalog(), "คลองเตย");
        assert_eq!(resolution.winning_field, Some(AddressField::District));
        let subdistricts: Vec<&str> = resolution
            .addresses
            .iter()
            .map(|a| a.subdistrict.as_str())
            .collect();
        assert_eq!(subdistricts.len(), 2);
        assert!(subdistricts.contains(&"คลองตัน"));
        assert!(subdistricts.contains(&"พระโขนง"));
    }

    #[test]
    fn province_projection_reads_province_field() {
        let catalog = catalog();
        let values = distinct_values(&catalog, AddressField::Province);
        assert_eq!(values, ["กรุงเทพมหานคร", "สมุทรปราการ"]);

        let resolution = search_default(&catalog, "สมุทรปราการ");
        assert_eq!(resolution.winning_field, Some(AddressField::Province));
        // Exact-province records rank ahead of any fuzzy province hits.
        assert!(resolution.addresses.len() >= 2);
        assert!(
            resolution.addresses[..2]
                .iter()
                .all(|a| a.province == "สมุทรปราการ")
        );
    }

    #[test]
    fn zip_code_search_selects_zip_records() {
        let resolution = search_default(&catalog(), "10540");
        assert_eq!(resolution.winning_field, Some(AddressField::ZipCode));
        // Other zip codes are within two substitutions, so they follow.
        assert!(resolution.ranked);
        assert!(resolution.addresses[..2].iter().all(|a| a.zip_code == "10540"));
    }

    #[test]
    fn field_search_dedupes_by_ref_index() {
        let patterns = tokenize("บางนา บางนา");
        let matches = search_field(
            &catalog(),
            AddressField::District,
            &patterns,
            &FuzzyOptions::default(),
        );
        let mut refs: Vec<usize> = matches.iter().map(|m| m.result.ref_index).collect();
        let total = refs.len();
        refs.sort_unstable();
        refs.dedup();
        assert_eq!(refs.len(), total);
        assert!(matches.iter().all(|m| m.search_type == AddressField::District));
        assert!(matches.windows(2).all(|w| w[0].score() <= w[1].score()));
    }

    #[test]
    fn candidate_records_keep_duplicates() {
        let catalog = vec![bang_na(), bang_na()];
        let matches = search_field(
            &catalog,
            AddressField::Subdistrict,
            &tokenize("บางนา"),
            &FuzzyOptions::default(),
        );
        let candidates = candidate_records(&catalog, AddressField::Subdistrict, &matches);
        assert_eq!(candidates.len(), 2);

        // The re-rank collapses them to one joined address.
        assert_eq!(search_default(&catalog, "บางนา").addresses, vec![bang_na()]);
    }

    #[test]
    fn unmatched_rerank_falls_back_to_all_candidates() {
        let catalog = vec![
            Address::new("abcdef", "d1", "p1", "10000"),
            Address::new("abcdef", "d2", "p2", "20000"),
            Address::new("abcdef", "d1", "p1", "10000"),
        ];
        let resolution = search_default(&catalog, "abcdef zzzzzzzzzzzzzzzzzzzz");
        assert_eq!(resolution.winning_field, Some(AddressField::Subdistrict));
        assert!(!resolution.ranked);
        assert_eq!(
            resolution.addresses,
            vec![catalog[0].clone(), catalog[1].clone()]
        );
    }

    #[test]
    fn placeholder_positions_never_match() {
        let catalog = vec![Address::new("N/A", "N/A", "N/A", "N/A")];
        let resolution = search_default(&catalog, "บางนา");
        assert!(resolution.addresses.is_empty());
        assert!(resolution.field_scores.is_empty());
    }

    #[test]
    fn repeated_searches_are_identical() {
        let catalog = catalog();
        let first = search(&catalog, "บางนา กรุงเทพ", &FuzzyOptions::default());
        let second = search(&catalog, "บางนา กรุงเทพ", &FuzzyOptions::default());
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn typo_still_finds_subdistrict() {
        let resolution = search_default(&catalog(), "บางแกว");
        assert_eq!(resolution.winning_field, Some(AddressField::Subdistrict));
        assert_eq!(resolution.addresses[0].subdistrict, "บางแก้ว");
    }
}
