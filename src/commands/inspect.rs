//! The inspect command: open a table file and report a tree's schema.

use std::io::{self, Write};

use anyhow::Result;
use tracing::debug;

use crate::{AnalyserError, Cli, OutputFormat, inspection::Analyser};

pub fn run(args: &Cli) -> Result<()> {
    debug!(
        entries = args.entries,
        output = %args.output,
        "entry limit and plot output are accepted but not used"
    );

    let mut analyser = Analyser::open(&args.file, &args.tree)?;
    let mut out = io::stdout().lock();

    match args.format {
        OutputFormat::Json => render_json(&analyser, args.branch.as_deref(), &mut out)?,
        OutputFormat::Text => {
            analyser.render_summary(&mut out)?;
            if let Some(branch) = &args.branch {
                analyser.render_branch_stats(&mut out, branch)?;
            }
        }
    }

    out.flush()?;
    analyser.close()?;
    Ok(())
}

fn render_json(analyser: &Analyser, branch: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let mut value = serde_json::to_value(analyser.summary()?)?;
    if let Some(name) = branch {
        let info = analyser
            .branch_info(name)?
            .ok_or_else(|| AnalyserError::BranchNotFound(name.to_string()))?;
        value["branch"] = serde_json::to_value(info)?;
    }
    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    Ok(())
}
