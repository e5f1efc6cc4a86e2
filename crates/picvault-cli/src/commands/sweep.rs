//! Sweep command implementation.

use crate::error::add_source_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use picvault_core::Vault;

pub fn execute(vault: &Vault, formatter: &dyn OutputFormatter) -> Result<()> {
    let removed = add_source_context(vault.sweep_sessions(), "sessions")?;
    formatter.format_removed("sweep", removed)?;
    Ok(())
}
