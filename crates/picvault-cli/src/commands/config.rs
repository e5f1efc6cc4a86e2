//! Config command implementation.

use crate::cli::ConfigArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use picvault_core::Vault;

pub fn execute(vault: &Vault, args: &ConfigArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut settings = vault.settings();
    let mut changed = false;

    if let Some(gb) = args.library_size_gb {
        settings.library_size_gb = gb;
        changed = true;
    }
    if let Some(max) = args.max_history_items {
        settings.max_history_items = usize::try_from(max)?;
        changed = true;
    }

    if changed {
        let evicted = add_source_context(vault.update_settings(settings), "settings")?;
        if !evicted.is_empty() {
            formatter.format_success(&format!(
                "Budget shrunk; evicted {} archive(s)",
                evicted.len()
            ));
        }
    }

    formatter.format_settings(&vault.settings())?;
    Ok(())
}
