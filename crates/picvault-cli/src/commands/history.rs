//! History command implementation.

use crate::cli::HistoryArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use picvault_core::Vault;

pub fn execute(vault: &Vault, args: &HistoryArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    if let (Some(entry_id), Some(name)) = (&args.rename, &args.name) {
        add_source_context(vault.rename_history_entry(entry_id, name), entry_id)?;
        formatter.format_success(&format!("Renamed {entry_id}"));
        return Ok(());
    }

    if let Some(entry_id) = &args.star {
        let starred = add_source_context(vault.toggle_history_star(entry_id), entry_id)?;
        if starred {
            formatter.format_success(&format!("Starred {entry_id}"));
        } else {
            formatter.format_success(&format!("Unstarred {entry_id}"));
        }
        return Ok(());
    }

    formatter.format_history(&vault.history())?;
    Ok(())
}
