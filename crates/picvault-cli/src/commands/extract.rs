//! Extract command implementation (single image).

use crate::cli::ExtractArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use picvault_core::{NoopProgress, ProgressCallback, Vault};

pub fn execute(vault: &Vault, args: &ExtractArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut progress: Box<dyn ProgressCallback> = if CliProgress::should_show() {
        Box::new(CliProgress::new("Extracting"))
    } else {
        Box::new(NoopProgress)
    };

    let path = add_source_context(
        vault.extract_single_image(&args.archive_id, &args.image_id, progress.as_mut()),
        &args.image_id,
    )?;

    drop(progress);
    formatter.format_extracted(&path)?;
    Ok(())
}
