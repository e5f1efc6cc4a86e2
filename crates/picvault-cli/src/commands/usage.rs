//! Usage command implementation.

use crate::output::OutputFormatter;
use anyhow::Result;
use picvault_core::Vault;

pub fn execute(vault: &Vault, formatter: &dyn OutputFormatter) -> Result<()> {
    let usage = vault.library_usage();
    let budget = vault.settings().library_budget_bytes();
    formatter.format_usage(&usage, budget)?;
    Ok(())
}
