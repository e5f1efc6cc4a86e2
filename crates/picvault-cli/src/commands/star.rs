//! Star command implementation.

use crate::cli::StarArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use picvault_core::Vault;

pub fn execute(vault: &Vault, args: &StarArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let starred = match &args.image {
        Some(image_id) => add_source_context(
            vault.toggle_image_star(&args.archive_id, image_id),
            image_id,
        )?,
        None => add_source_context(
            vault.toggle_archive_star(&args.archive_id),
            &args.archive_id,
        )?,
    };

    let target = args.image.as_deref().unwrap_or(&args.archive_id);
    if starred {
        formatter.format_success(&format!("Starred {target}"));
    } else {
        formatter.format_success(&format!("Unstarred {target}"));
    }
    Ok(())
}
