//! Clear command implementation.

use crate::cli::ClearArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use anyhow::Result;
use console::Term;
use picvault_core::Vault;

pub fn execute(vault: &Vault, args: &ClearArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    if !args.yes && !confirm()? {
        formatter.format_success("Aborted");
        return Ok(());
    }

    let removed = add_source_context(vault.clear_library(), "library")?;
    formatter.format_removed("clear", removed)?;
    Ok(())
}

fn confirm() -> Result<bool> {
    let term = Term::stdout();
    if !term.is_term() {
        // Non-interactive callers must opt in explicitly.
        anyhow::bail!(
            "refusing to clear the library without confirmation\n\
             HINT: Pass --yes to skip the prompt."
        );
    }
    term.write_str("Remove all non-starred archives? [y/N] ")?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
