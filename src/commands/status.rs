use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::evaluation::summary::EvaluationSummary;
use crate::model::{ConversationExport, SimulationRunManifest};

pub const EXPORT_FILE: &str = "conversations.json";
pub const REPORT_FILE: &str = "analysis-report.md";
pub const RESULTS_FILE: &str = "simulation-results.json";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExportStatus {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub participants: usize,
}

impl ExportStatus {
    pub fn from_export(export: &ConversationExport) -> Self {
        let mut by_status = BTreeMap::new();
        let mut participants = BTreeSet::new();
        for record in &export.conversations {
            let status = record
                .status
                .as_deref()
                .map(str::trim)
                .filter(|status| !status.is_empty())
                .unwrap_or("unknown");
            *by_status.entry(status.to_string()).or_insert(0) += 1;

            if let Some(user_id) = record.user_id.as_deref().map(str::trim) {
                if !user_id.is_empty() {
                    participants.insert(user_id);
                }
            }
        }

        Self {
            total: export.conversations.len(),
            by_status,
            participants: participants.len(),
        }
    }
}

pub fn run(args: StatusArgs) -> Result<()> {
    let export_path = args.data_dir.join(EXPORT_FILE);
    let report_path = args.data_dir.join(REPORT_FILE);
    let results_path = args.data_dir.join(RESULTS_FILE);

    info!(data_dir = %args.data_dir.display(), "status requested");

    if export_path.exists() {
        let export: ConversationExport = read_json(&export_path)?;
        let status = ExportStatus::from_export(&export);
        info!(
            path = %export_path.display(),
            export_date = %export.export_date.unwrap_or_default(),
            conversations = status.total,
            participants = status.participants,
            "loaded conversation export"
        );
        for (state, count) in &status.by_status {
            info!(status = %state, count, "conversations by status");
        }
    } else {
        warn!(path = %export_path.display(), "conversation export missing");
    }

    if report_path.exists() {
        let modified = fs::metadata(&report_path)
            .and_then(|meta| meta.modified())
            .map(|time| chrono::DateTime::<chrono::Utc>::from(time).to_rfc3339())
            .unwrap_or_default();
        info!(path = %report_path.display(), modified = %modified, "analysis report present");
    } else {
        warn!(path = %report_path.display(), "analysis report missing");
    }

    if results_path.exists() {
        let manifest: SimulationRunManifest = read_json(&results_path)?;
        let summary = EvaluationSummary::from_results(&manifest.results);
        info!(
            path = %results_path.display(),
            run_date = %manifest.run_date,
            agent_id = %manifest.agent_id,
            scenarios = manifest.total_scenarios,
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            "loaded simulation results"
        );
    } else {
        warn!(path = %results_path.display(), "simulation results missing");
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
