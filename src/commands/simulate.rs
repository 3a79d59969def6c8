use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::cli::SimulateArgs;
use crate::evaluation::client::{HttpSimulationClient, SimulationClient, SimulationClientConfig};
use crate::evaluation::criteria::display_name;
use crate::evaluation::runner::{RunOptions, run_scenarios};
use crate::evaluation::scenarios::{ScenarioSpec, select};
use crate::evaluation::summary::{EvaluationSummary, write_summary};
use crate::model::{ScenarioResult, SimulationRunManifest};
use crate::util::{elapsed_secs, excerpt, format_number, now_utc_string, write_json_pretty};

const PERSONA_EXCERPT_CHARS: usize = 80;
const TURN_EXCERPT_CHARS: usize = 200;

pub fn run(args: SimulateArgs) -> Result<bool> {
    let scenarios = select(args.scenario)?;

    if args.dry_run {
        let mut output = io::BufWriter::new(io::stdout().lock());
        write_dry_run(&mut output, &scenarios)?;
        output.flush()?;
        info!(scenarios = scenarios.len(), "simulate dry-run complete");
        return Ok(true);
    }

    let agent_id = required(args.agent_id.as_deref())
        .context("agent id is required (--agent-id or INTERVIEW_AGENT_ID)")?;
    let api_key = required(args.api_key.as_deref())
        .context("api key is required (--api-key or ELEVENLABS_API_KEY)")?;

    let client = HttpSimulationClient::new(&SimulationClientConfig {
        base_url: args.api_base_url.clone(),
        api_key: api_key.to_string(),
        agent_id: agent_id.to_string(),
        timeout: Duration::from_secs(args.timeout_secs),
    })?;

    let options = RunOptions {
        language: args.language.clone(),
        keep_transcript: args.verbose,
    };

    info!(
        agent_id,
        scenarios = scenarios.len(),
        language = %options.language,
        timeout_secs = args.timeout_secs,
        "starting simulation run"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    let passed = execute(
        &client,
        &scenarios,
        &options,
        agent_id,
        &args.results_path,
        &mut output,
    )?;
    output.flush()?;
    Ok(passed)
}

pub fn execute<W: Write>(
    client: &dyn SimulationClient,
    scenarios: &[&ScenarioSpec],
    options: &RunOptions,
    agent_id: &str,
    results_path: &Path,
    output: &mut W,
) -> Result<bool> {
    let run_date = now_utc_string();
    let started = Instant::now();
    let results = run_scenarios(client, scenarios, options);
    let total_duration_secs = elapsed_secs(started.elapsed());

    if options.keep_transcript {
        write_details(output, &results)?;
    }

    let summary = EvaluationSummary::from_results(&results);
    let manifest = SimulationRunManifest {
        agent_id: agent_id.to_string(),
        run_date,
        total_duration_secs,
        total_scenarios: results.len(),
        results,
    };
    write_json_pretty(results_path, &manifest)?;
    info!(path = %results_path.display(), "wrote simulation results");

    write_summary(output, &manifest.results, total_duration_secs)?;

    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        errored = summary.errored,
        "simulation run completed"
    );

    Ok(summary.all_passed())
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn write_dry_run<W: Write>(output: &mut W, scenarios: &[&ScenarioSpec]) -> io::Result<()> {
    for scenario in scenarios {
        let criteria = scenario
            .criteria
            .iter()
            .map(|id| display_name(id))
            .collect::<Vec<_>>()
            .join(", ");
        let persona = scenario.persona.split_whitespace().collect::<Vec<_>>().join(" ");

        writeln!(output, "Scenario {}: {}", scenario.id, scenario.name)?;
        writeln!(output, "  max turns: {}", scenario.max_turns)?;
        writeln!(output, "  criteria: {criteria}")?;
        writeln!(output, "  persona: {}", excerpt(&persona, PERSONA_EXCERPT_CHARS))?;
    }
    Ok(())
}

fn write_details<W: Write>(output: &mut W, results: &[ScenarioResult]) -> io::Result<()> {
    for result in results {
        writeln!(output, "=== Scenario {}: {} ===", result.scenario_id, result.name)?;

        for turn in result.transcript.iter().flatten() {
            let speaker = if turn.is_agent() { "AGENT" } else { "USER " };
            let time = turn
                .time_in_call_secs
                .map(|secs| format!("[{}s] ", format_number(secs)))
                .unwrap_or_default();
            writeln!(
                output,
                "  {time}{speaker}: {}",
                excerpt(turn.text(), TURN_EXCERPT_CHARS)
            )?;
        }

        if let Some(call_successful) = &result.call_successful {
            writeln!(output, "  call successful: {call_successful}")?;
        }
        if let Some(summary) = &result.transcript_summary {
            writeln!(output, "  summary: {summary}")?;
        }

        for verdict in &result.verdicts {
            writeln!(
                output,
                "  [{}] {}",
                verdict.result.as_str().to_ascii_uppercase(),
                verdict.criterion_name
            )?;
            if !verdict.rationale.is_empty() {
                writeln!(output, "      {}", verdict.rationale)?;
            }
        }

        for (key, field) in result.data_collection.iter().flatten() {
            let value = match &field.value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            if field.rationale.is_empty() {
                writeln!(output, "  {key} = {value}")?;
            } else {
                writeln!(output, "  {key} = {value} ({})", field.rationale)?;
            }
        }

        if let Some(error) = &result.error {
            writeln!(output, "  error: {error}")?;
        }
        writeln!(output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use anyhow::bail;
    use serde_json::json;

    use super::*;
    use crate::evaluation::client::{SimulationOutcome, SimulationRequest};
    use crate::evaluation::scenarios::SCENARIOS;
    use crate::model::{
        CollectedField, CriterionVerdict, ScenarioStatus, TranscriptTurn, VerdictResult,
    };

    struct UniformJudge {
        result: &'static str,
    }

    impl SimulationClient for UniformJudge {
        fn simulate(&self, request: &SimulationRequest<'_>) -> Result<SimulationOutcome> {
            let verdicts = request
                .criteria
                .iter()
                .map(|criterion| {
                    (
                        criterion.id.to_string(),
                        json!({"result": self.result, "rationale": "judged"}),
                    )
                })
                .collect::<serde_json::Map<_, _>>();
            Ok(serde_json::from_value(json!({
                "simulated_conversation": [
                    {"role": "agent", "message": "Salut !", "time_in_call_secs": 0},
                    {"role": "user", "message": "Bonjour", "time_in_call_secs": 2.5}
                ],
                "analysis": {"evaluation_criteria_results": verdicts}
            }))?)
        }
    }

    struct Unreachable;

    impl SimulationClient for Unreachable {
        fn simulate(&self, _request: &SimulationRequest<'_>) -> Result<SimulationOutcome> {
            bail!("connection refused")
        }
    }

    fn results_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!(
                "interview-insights-simulate-{name}-{}",
                std::process::id()
            ))
            .join("simulation-results.json")
    }

    fn options(verbose: bool) -> RunOptions {
        RunOptions {
            language: "fr".to_string(),
            keep_transcript: verbose,
        }
    }

    #[test]
    fn dry_run_lists_every_scenario_with_criteria_names() {
        let scenarios = select(None).expect("catalog");
        let mut buffer = Vec::new();
        write_dry_run(&mut buffer, &scenarios).expect("dry run writes");
        let text = String::from_utf8(buffer).expect("utf8");

        for scenario in SCENARIOS {
            assert!(text.contains(&format!("Scenario {}: {}", scenario.id, scenario.name)));
            assert!(text.contains(&format!("max turns: {}", scenario.max_turns)));
        }
        assert!(text.contains("Empathy and warmth"));
        assert!(
            text.lines()
                .filter(|line| line.starts_with("  persona: "))
                .all(|line| line.ends_with("...") && line.chars().count() <= 94)
        );
    }

    #[test]
    fn passing_run_writes_results_file_in_id_order() {
        let path = results_path("pass");
        let scenarios = select(None).expect("catalog");

        let mut buffer = Vec::new();
        let passed = execute(
            &UniformJudge { result: "success" },
            &scenarios,
            &options(true),
            "agent_1",
            &path,
            &mut buffer,
        )
        .expect("run succeeds");
        assert!(passed);

        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.contains("=== Scenario 1: "));
        assert!(text.contains("  [0s] AGENT: Salut !"));
        assert!(text.contains("  [2.5s] USER : Bonjour"));
        assert!(text.contains("  [SUCCESS] Empathy and warmth"));
        assert!(text.contains("      judged"));
        assert!(text.contains("TOTAL: 5/5 passed"));

        let manifest: SimulationRunManifest =
            serde_json::from_slice(&fs::read(&path).expect("results written"))
                .expect("results parse");
        assert_eq!(manifest.agent_id, "agent_1");
        assert_eq!(manifest.total_scenarios, SCENARIOS.len());
        let ids = manifest
            .results
            .iter()
            .map(|result| result.scenario_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(
            manifest
                .results
                .iter()
                .all(|result| result.status == ScenarioStatus::Pass)
        );
        assert_eq!(manifest.results[0].transcript.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn unknown_verdicts_fail_the_run() {
        let path = results_path("unknown");
        let scenarios = select(Some(3)).expect("scenario 3");

        let mut buffer = Vec::new();
        let passed = execute(
            &UniformJudge { result: "unknown" },
            &scenarios,
            &options(false),
            "agent_1",
            &path,
            &mut buffer,
        )
        .expect("run completes");
        assert!(!passed);

        let text = String::from_utf8(buffer).expect("utf8");
        assert!(!text.contains("==="));
        assert!(!text.contains("AGENT:"));
        assert!(text.contains("[UNKNOWN]"));

        let manifest: SimulationRunManifest =
            serde_json::from_slice(&fs::read(&path).expect("results written"))
                .expect("results parse");
        assert_eq!(manifest.results[0].status, ScenarioStatus::Fail);
        assert!(
            manifest.results[0]
                .verdicts
                .iter()
                .all(|verdict| verdict.result == VerdictResult::Unknown)
        );
        assert!(manifest.results[0].transcript.is_none());
    }

    #[test]
    fn transport_errors_are_recorded_not_raised() {
        let path = results_path("errors");
        let scenarios = select(None).expect("catalog");

        let passed = execute(
            &Unreachable,
            &scenarios,
            &options(false),
            "agent_1",
            &path,
            &mut Vec::new(),
        )
        .expect("run completes despite transport errors");
        assert!(!passed);

        let manifest: SimulationRunManifest =
            serde_json::from_slice(&fs::read(&path).expect("results written"))
                .expect("results parse");
        assert_eq!(manifest.results.len(), SCENARIOS.len());
        assert!(manifest.results.iter().all(|result| {
            result.status == ScenarioStatus::Error
                && result
                    .error
                    .as_deref()
                    .is_some_and(|error| error.contains("connection refused"))
        }));
    }

    #[test]
    fn details_show_transcript_verdicts_and_collected_fields() {
        let long_message = "m".repeat(250);
        let result = ScenarioResult {
            scenario_id: 4,
            name: "solo parent".to_string(),
            status: ScenarioStatus::Fail,
            duration_secs: 3.2,
            transcript_turns: 2,
            verdicts: vec![
                CriterionVerdict {
                    criterion_id: "empathy".to_string(),
                    criterion_name: "Empathy and warmth".to_string(),
                    result: VerdictResult::Success,
                    judge_result: Some("success".to_string()),
                    rationale: "warm tone".to_string(),
                },
                CriterionVerdict {
                    criterion_id: "solo_parent_adapt".to_string(),
                    criterion_name: "Solo parent adaptation".to_string(),
                    result: VerdictResult::Missing,
                    judge_result: None,
                    rationale: String::new(),
                },
            ],
            error: None,
            call_successful: Some("success".to_string()),
            transcript_summary: Some("short chat".to_string()),
            data_collection: Some(BTreeMap::from([
                (
                    "nombre_enfants".to_string(),
                    CollectedField {
                        value: json!(1),
                        rationale: "one daughter".to_string(),
                    },
                ),
                (
                    "situation_couple".to_string(),
                    CollectedField {
                        value: json!("solo"),
                        rationale: String::new(),
                    },
                ),
            ])),
            transcript: Some(vec![
                TranscriptTurn {
                    role: Some("agent".to_string()),
                    message: Some("Salut".to_string()),
                    time_in_call_secs: Some(0.0),
                },
                TranscriptTurn {
                    role: Some("user".to_string()),
                    message: Some(long_message),
                    time_in_call_secs: None,
                },
            ]),
        };

        let mut buffer = Vec::new();
        write_details(&mut buffer, &[result]).expect("details write");
        let text = String::from_utf8(buffer).expect("utf8");

        assert!(text.contains("=== Scenario 4: solo parent ==="));
        assert!(text.contains("  [0s] AGENT: Salut\n"));
        assert!(text.contains(&format!("  USER : {}...\n", "m".repeat(200))));
        assert!(text.contains("  call successful: success"));
        assert!(text.contains("  summary: short chat"));
        assert!(text.contains("  [SUCCESS] Empathy and warmth\n      warm tone"));
        assert!(text.contains("  [MISSING] Solo parent adaptation"));
        assert!(text.contains("  nombre_enfants = 1 (one daughter)"));
        assert!(text.contains("  situation_couple = solo\n"));
        assert!(!text.contains("error:"));
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        assert_eq!(required(Some("  ")), None);
        assert_eq!(required(None), None);
        assert_eq!(required(Some(" agent ")), Some("agent"));
    }
}
