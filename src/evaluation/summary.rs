use std::io::{self, Write};

use serde::Serialize;

use crate::model::{CriterionVerdict, ScenarioResult, ScenarioStatus};
use crate::util::truncate_chars;

const SUMMARY_RATIONALE_MAX_CHARS: usize = 250;

/// PASS only when the run completed and every requested verdict is a success.
/// `unknown` and `missing` fail just like `failure`.
pub fn overall_status(completed: bool, verdicts: &[CriterionVerdict]) -> ScenarioStatus {
    if !completed {
        return ScenarioStatus::Error;
    }
    if verdicts.iter().all(|verdict| verdict.result.is_success()) {
        ScenarioStatus::Pass
    } else {
        ScenarioStatus::Fail
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl EvaluationSummary {
    pub fn from_results(results: &[ScenarioResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                ScenarioStatus::Pass => summary.passed += 1,
                ScenarioStatus::Fail => summary.failed += 1,
                ScenarioStatus::Error => summary.errored += 1,
            }
        }
        summary
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

pub fn write_summary<W: Write>(
    output: &mut W,
    results: &[ScenarioResult],
    total_duration_secs: f64,
) -> io::Result<()> {
    let mut ordered = results.iter().collect::<Vec<_>>();
    ordered.sort_by_key(|result| result.scenario_id);

    for result in ordered {
        writeln!(
            output,
            "  [{}] Scenario {}: {} - {} ({}s)",
            result.status.icon(),
            result.scenario_id,
            result.name,
            result.status.as_str(),
            result.duration_secs
        )?;

        match result.status {
            ScenarioStatus::Fail => {
                for verdict in result.failing_verdicts() {
                    writeln!(
                        output,
                        "      [{}] {}",
                        verdict.result.as_str().to_ascii_uppercase(),
                        verdict.criterion_name
                    )?;
                    if !verdict.rationale.is_empty() {
                        writeln!(
                            output,
                            "          {}",
                            truncate_chars(&verdict.rationale, SUMMARY_RATIONALE_MAX_CHARS)
                        )?;
                    }
                }
            }
            ScenarioStatus::Error => {
                if let Some(error) = &result.error {
                    writeln!(output, "      error: {error}")?;
                }
            }
            ScenarioStatus::Pass => {}
        }
    }

    let summary = EvaluationSummary::from_results(results);
    write!(output, "\n  TOTAL: {}/{} passed", summary.passed, summary.total)?;
    if summary.errored > 0 {
        write!(output, " | {} errors", summary.errored)?;
    }
    if summary.failed > 0 {
        write!(output, " | {} failed", summary.failed)?;
    }
    writeln!(output, " | {total_duration_secs}s total")?;
    Ok(())
}
