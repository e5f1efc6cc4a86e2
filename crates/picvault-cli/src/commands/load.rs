//! Load command implementation.

use crate::cli::LoadArgs;
use crate::error::add_source_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use anyhow::bail;
use picvault_core::{LoadOutcome, NoopProgress, Placement, ProgressCallback, Vault};
use std::path::Path;

pub fn execute(vault: &Vault, args: &LoadArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut progress: Box<dyn ProgressCallback> = if CliProgress::should_show() {
        Box::new(CliProgress::new("Downloading"))
    } else {
        Box::new(NoopProgress)
    };

    let result = if is_url(&args.source) {
        add_source_context(
            vault.load_from_url(&args.source, progress.as_mut()),
            &args.source,
        )?
    } else {
        let placement = if args.copy {
            Some(Placement::Copy)
        } else if args.move_into {
            Some(Placement::Move)
        } else {
            None
        };
        let outcome = add_source_context(
            vault.load_local(Path::new(&args.source), placement, progress.as_mut()),
            &args.source,
        )?;
        match outcome {
            LoadOutcome::Loaded(result) => result,
            LoadOutcome::NeedsPlacementChoice => {
                bail!(
                    "'{}' is outside the library; choose how to add it\n\
                     HINT: Pass --copy to keep the original or --move to move it in.",
                    args.source
                );
            }
        }
    };

    drop(progress);
    formatter.format_load_result(&result)?;
    Ok(())
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
