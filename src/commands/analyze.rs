use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::AnalyzeArgs;
use crate::model::ConversationExport;
use crate::report::render_report;
use crate::signals::population::{PopulationSummary, summarize};
use crate::util::{write_json_pretty, write_text};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let export = load_export(&args.input)?;
    info!(
        path = %args.input.display(),
        conversations = export.conversations.len(),
        export_date = %export.export_date.clone().unwrap_or_default(),
        "loaded conversation export"
    );

    if let Some(declared) = export.total_conversations {
        if declared != export.conversations.len() {
            warn!(
                declared,
                actual = export.conversations.len(),
                "export total does not match conversation count"
            );
        }
    }

    let summary = summarize(&export.conversations);
    let report = render_report(&summary, Utc::now());

    write_text(&args.output, &report)?;
    info!(path = %args.output.display(), "wrote analysis report");

    if let Some(summary_path) = &args.summary_json {
        write_json_pretty(summary_path, &summary)?;
        info!(path = %summary_path.display(), "wrote population summary");
    }

    log_headline(&summary);

    if !args.quiet {
        let mut output = io::BufWriter::new(io::stdout().lock());
        output.write_all(report.as_bytes())?;
        output.flush()?;
    }

    Ok(())
}

pub fn load_export(path: &Path) -> Result<ConversationExport> {
    if !path.exists() {
        bail!("conversation export not found: {}", path.display());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn log_headline(summary: &PopulationSummary) {
    for row in &summary.hypotheses {
        info!(
            hypothesis = row.key,
            yes = row.tally.yes,
            no = row.tally.no,
            unknown = row.tally.unknown,
            rate = %row.tally.display_rate(),
            "hypothesis tally"
        );
    }
    if summary.conversations_without_fields > 0 {
        warn!(
            conversations = summary.conversations_without_fields,
            "conversations carry no collected fields"
        );
    }
    info!(
        conversations = summary.total_conversations,
        irritants = summary.irritants.len(),
        apps_tried = summary.apps_tried.len(),
        beta_opt_in = %summary.beta_opt_in.display_rate(),
        "analysis completed"
    );
}
