#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for free-text Thai address lookup.
//!
//! Loads an address catalog from a JSON file or URL and suggests matching
//! addresses for a partial phrase, either once (`search`) or in a prompt
//! loop (`interactive`).

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thai_address_catalog::{Catalog, CatalogSource};
use thai_address_cli_utils::MultiProgress;
use thai_address_query::{AddressQuery, SearchConfig};

mod commands;
mod interactive;

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Suggest Thai addresses from a partial phrase.
#[derive(Parser)]
#[command(name = "thai_address")]
#[command(about = "Suggest Thai addresses from a partial phrase")]
struct Cli {
    /// Catalog JSON file or `http(s)://` URL.
    #[arg(long, global = true, env = "THAI_ADDRESS_CATALOG")]
    catalog: Option<CatalogSource>,

    /// TOML file overriding the embedded search settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Look up addresses matching a phrase.
    Search {
        /// Free-text address fragment, e.g. "บางนา กรุงเทพ".
        phrase: String,

        /// Maximum number of addresses to print.
        #[arg(long)]
        limit: Option<usize>,

        /// Also print the patterns, per-field scores and winning field.
        #[arg(long)]
        explain: bool,

        /// Print results as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Show the four patterns a phrase is split into.
    Tokenize {
        /// Free-text address fragment.
        phrase: String,
    },

    /// Print record and distinct-field counts for a catalog.
    Stats,

    /// Prompt for phrases until an empty line is entered.
    Interactive,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = thai_address_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tokenize { phrase } => {
            println!("{}", commands::render_patterns(&thai_address_query::tokenize(&phrase)));
            Ok(())
        }
        Commands::Stats => {
            let catalog = load_catalog(&multi, cli.catalog.as_ref()).await?;
            print!("{}", commands::render_stats(&catalog.stats()));
            Ok(())
        }
        Commands::Search {
            phrase,
            limit,
            explain,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            config.limit = limit.or(config.limit);
            let catalog = load_catalog(&multi, cli.catalog.as_ref()).await?;
            let query = AddressQuery::new(catalog.into_addresses(), config);
            commands::search(&query, &phrase, explain, json)
        }
        Commands::Interactive => {
            let config = load_config(cli.config.as_deref())?;
            let catalog = load_catalog(&multi, cli.catalog.as_ref()).await?;
            let query = AddressQuery::new(catalog.into_addresses(), config);
            interactive::run(&query)
        }
    }
}

/// Reads `--config` if given, otherwise the embedded defaults.
fn load_config(path: Option<&Path>) -> Result<SearchConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => SearchConfig::from_path(path)?,
        None => SearchConfig::embedded(),
    };
    log::debug!("Search config: {config:?}");
    Ok(config)
}

/// Loads the catalog behind a spinner.
async fn load_catalog(
    multi: &MultiProgress,
    source: Option<&CatalogSource>,
) -> Result<Catalog, Box<dyn std::error::Error>> {
    let source = source.ok_or("no catalog given: pass --catalog or set THAI_ADDRESS_CATALOG")?;

    let bar = thai_address_cli_utils::spinner(multi, &format!("Loading {source}"));
    let result = Catalog::load(source).await;
    bar.finish_and_clear();

    let catalog = result?;
    log::info!("Loaded {} addresses from {source}", catalog.len());
    Ok(catalog)
}
