//! List command implementation.

use crate::cli::ListArgs;
use crate::output::OutputFormatter;
use anyhow::Result;
use picvault_core::Vault;

pub fn execute(vault: &Vault, args: &ListArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let archives: Vec<_> = vault
        .list_archives()
        .into_iter()
        .map(|archive| {
            let images = if args.images {
                vault.list_images(&archive.id)
            } else {
                Vec::new()
            };
            (archive, images)
        })
        .collect();

    formatter.format_archives(&archives)?;
    Ok(())
}
