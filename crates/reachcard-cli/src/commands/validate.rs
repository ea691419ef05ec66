//! Check a card description for problems.

use clap::Args;
use reachcard_config::{ConfigError, ValidationError};
use std::path::PathBuf;

use super::common;

/// Validate a card description.
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the card description (TOML)
    pub file: PathBuf,
}

/// Run the validate command.
///
/// Lists every problem and fails if there is at least one. A description
/// that passes is also resolved, so anything the checks miss still surfaces.
pub fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let description = common::load(&args.file)?;

    match description.validate() {
        Ok(()) => {}
        Err(ConfigError::Validation(err)) => {
            let problems = match err {
                ValidationError::Multiple(errors) => errors,
                single => vec![single],
            };
            println!("{}: {} problem(s)", args.file.display(), problems.len());
            for problem in &problems {
                println!("  - {problem}");
            }
            anyhow::bail!("card description is invalid");
        }
        Err(other) => return Err(other.into()),
    }

    let metadata = description.card_metadata()?;
    let table = common::resolve(&description)?;
    println!(
        "{}: OK ({} driver, {} links)",
        args.file.display(),
        metadata.driver_name,
        table.len()
    );
    Ok(())
}
