//! Output formatting for the `search`, `tokenize` and `stats` subcommands.

use std::fmt::Write as _;

use thai_address_models::{Address, CatalogStats};
use thai_address_query::{AddressQuery, PatternSet, Resolution};

/// Runs one search and prints the result.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn search(
    query: &AddressQuery,
    phrase: &str,
    explain: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let resolution = query.resolve(phrase);

    if explain {
        eprint!(
            "{}",
            render_explain(&thai_address_query::tokenize(phrase), &resolution)
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution.addresses)?);
    } else if resolution.addresses.is_empty() {
        println!("No matching addresses.");
    } else {
        print!("{}", render_addresses(&resolution.addresses));
    }

    Ok(())
}

/// One numbered line per address.
pub fn render_addresses(addresses: &[Address]) -> String {
    let width = addresses.len().to_string().len();
    let mut out = String::new();
    for (i, address) in addresses.iter().enumerate() {
        let _ = writeln!(out, "{:>width$}. {address}", i + 1);
    }
    out
}

/// The four patterns, one per line.
pub fn render_patterns(patterns: &PatternSet) -> String {
    patterns
        .patterns()
        .iter()
        .enumerate()
        .map(|(i, pattern)| format!("{}: {pattern}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Diagnostic summary of how a resolution was reached.
pub fn render_explain(patterns: &PatternSet, resolution: &Resolution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "patterns: {patterns}");

    if resolution.field_scores.is_empty() {
        let _ = writeln!(out, "no field matched");
        return out;
    }

    for (field, score) in &resolution.field_scores {
        let marker = if Some(*field) == resolution.winning_field {
            " *"
        } else {
            ""
        };
        let _ = writeln!(out, "  {:<12} {score:.4}{marker}", field.as_ref());
    }
    let _ = writeln!(
        out,
        "ranked: {}",
        if resolution.ranked { "yes" } else { "no (fallback)" }
    );
    out
}

/// Record and distinct-field counts.
pub fn render_stats(stats: &CatalogStats) -> String {
    format!(
        "=== Catalog ===\n\
         Records:      {}\n\
         Subdistricts: {}\n\
         Districts:    {}\n\
         Provinces:    {}\n\
         Zip codes:    {}\n",
        stats.records, stats.subdistricts, stats.districts, stats.provinces, stats.zip_codes,
    )
}
