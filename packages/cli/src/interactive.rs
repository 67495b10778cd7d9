//! Prompt loop for repeated lookups against one loaded catalog.

use dialoguer::Input;
use thai_address_query::AddressQuery;

use crate::commands;

/// Prompts for phrases and prints the matches for each until the user
/// enters an empty line.
///
/// # Errors
///
/// Returns an error if the terminal prompt fails.
pub fn run(query: &AddressQuery) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Thai address lookup ({} addresses). Empty line to quit.",
        query.catalog().len()
    );
    println!();

    loop {
        let phrase: String = Input::new()
            .with_prompt("Address")
            .allow_empty(true)
            .interact_text()?;

        if phrase.trim().is_empty() {
            break;
        }

        let addresses = query.search(&phrase);
        if addresses.is_empty() {
            println!("No matching addresses.");
        } else {
            print!("{}", commands::render_addresses(&addresses));
        }
        println!();
    }

    Ok(())
}
