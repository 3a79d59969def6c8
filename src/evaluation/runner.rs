use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::evaluation::client::{SimulationClient, SimulationOutcome, SimulationRequest};
use crate::evaluation::criteria::{EvaluationCriterion, criterion, display_name};
use crate::evaluation::scenarios::ScenarioSpec;
use crate::evaluation::summary::overall_status;
use crate::model::{CollectedField, CriterionVerdict, ScenarioResult, ScenarioStatus, VerdictResult};
use crate::signals::fields::CollectedFieldValue;
use crate::util::{elapsed_secs, truncate_chars};

const RATIONALE_MAX_CHARS: usize = 500;
const SUMMARY_MAX_CHARS: usize = 500;
const FIELD_RATIONALE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub language: String,
    pub keep_transcript: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Errored(String),
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Errored(_) => "errored",
        }
    }
}

#[derive(Debug)]
pub struct ScenarioRun<'a> {
    scenario: &'a ScenarioSpec,
    state: RunState,
    started: Option<Instant>,
}

impl<'a> ScenarioRun<'a> {
    pub fn new(scenario: &'a ScenarioSpec) -> Self {
        Self {
            scenario,
            state: RunState::Pending,
            started: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(
            scenario = self.scenario.id,
            from = self.state.as_str(),
            to = next.as_str(),
            "scenario state change"
        );
        self.state = next;
    }

    pub fn execute(
        &mut self,
        client: &dyn SimulationClient,
        options: &RunOptions,
    ) -> Option<SimulationOutcome> {
        if self.state != RunState::Pending {
            return None;
        }

        self.started = Some(Instant::now());
        self.transition(RunState::Running);
        info!(
            scenario = self.scenario.id,
            name = self.scenario.name,
            max_turns = self.scenario.max_turns,
            "running simulation"
        );

        let outcome = resolve_criteria(self.scenario).and_then(|criteria| {
            let request = SimulationRequest {
                persona: self.scenario.persona,
                language: &options.language,
                criteria,
                turn_limit: self.scenario.max_turns,
            };
            client.simulate(&request)
        });

        match outcome {
            Ok(outcome) => {
                self.transition(RunState::Completed);
                Some(outcome)
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(scenario = self.scenario.id, error = %message, "simulation failed");
                self.transition(RunState::Errored(message));
                None
            }
        }
    }

    pub fn into_result(
        self,
        outcome: Option<SimulationOutcome>,
        options: &RunOptions,
    ) -> ScenarioResult {
        let duration_secs = self
            .started
            .map(|started| elapsed_secs(started.elapsed()))
            .unwrap_or_default();

        let error = match &self.state {
            RunState::Errored(message) => Some(message.clone()),
            RunState::Pending | RunState::Running => Some(format!(
                "scenario ended in {} state",
                self.state.as_str()
            )),
            RunState::Completed => None,
        };

        let outcome = outcome.unwrap_or_default();
        let verdicts = if self.state == RunState::Completed {
            collect_verdicts(self.scenario, &outcome)
        } else {
            Vec::new()
        };
        let analysis = outcome.analysis.as_ref();

        let mut result = ScenarioResult {
            scenario_id: self.scenario.id,
            name: self.scenario.name.to_string(),
            status: ScenarioStatus::Error,
            duration_secs,
            transcript_turns: outcome.transcript().len(),
            verdicts,
            error,
            call_successful: analysis
                .and_then(|analysis| analysis.call_successful.as_ref())
                .map(value_label),
            transcript_summary: analysis
                .and_then(|analysis| analysis.transcript_summary.as_deref())
                .map(|summary| truncate_chars(summary, SUMMARY_MAX_CHARS)),
            data_collection: analysis
                .and_then(|analysis| analysis.data_collection_results.as_ref())
                .filter(|fields| !fields.is_empty())
                .map(collect_fields),
            transcript: options
                .keep_transcript
                .then(|| outcome.transcript().to_vec()),
        };
        result.status = overall_status(self.state == RunState::Completed, &result.verdicts);
        result
    }
}

pub fn run_scenario(
    client: &dyn SimulationClient,
    scenario: &ScenarioSpec,
    options: &RunOptions,
) -> ScenarioResult {
    let mut run = ScenarioRun::new(scenario);
    let outcome = run.execute(client, options);
    let result = run.into_result(outcome, options);
    info!(
        scenario = result.scenario_id,
        status = result.status.as_str(),
        duration_secs = result.duration_secs,
        turns = result.transcript_turns,
        "scenario finished"
    );
    result
}

pub fn run_scenarios(
    client: &dyn SimulationClient,
    scenarios: &[&ScenarioSpec],
    options: &RunOptions,
) -> Vec<ScenarioResult> {
    let mut ordered = scenarios.to_vec();
    ordered.sort_by_key(|scenario| scenario.id);

    ordered
        .into_iter()
        .map(|scenario| run_scenario(client, scenario, options))
        .collect()
}

fn resolve_criteria(scenario: &ScenarioSpec) -> Result<Vec<&'static EvaluationCriterion>> {
    scenario
        .criteria
        .iter()
        .map(|id| {
            criterion(id).with_context(|| {
                format!("scenario {} references unknown criterion {id}", scenario.id)
            })
        })
        .collect()
}

/// One verdict per requested criterion, in scenario order. A criterion the
/// judge left out becomes `Missing`.
pub fn collect_verdicts(
    scenario: &ScenarioSpec,
    outcome: &SimulationOutcome,
) -> Vec<CriterionVerdict> {
    scenario
        .criteria
        .iter()
        .map(|id| {
            let criterion_name = display_name(id).to_string();
            match outcome.verdict(id) {
                Some(verdict) => {
                    let judge_result = verdict.result.clone();
                    CriterionVerdict {
                        criterion_id: id.to_string(),
                        criterion_name,
                        result: judge_result
                            .as_deref()
                            .map(VerdictResult::from_judge)
                            .unwrap_or(VerdictResult::Unknown),
                        judge_result,
                        rationale: truncate_chars(
                            verdict.rationale.as_deref().unwrap_or_default(),
                            RATIONALE_MAX_CHARS,
                        ),
                    }
                }
                None => CriterionVerdict {
                    criterion_id: id.to_string(),
                    criterion_name,
                    result: VerdictResult::Missing,
                    judge_result: None,
                    rationale: String::new(),
                },
            }
        })
        .collect()
}

fn collect_fields(fields: &serde_json::Map<String, Value>) -> BTreeMap<String, CollectedField> {
    fields
        .iter()
        .map(|(key, raw)| {
            let parsed = CollectedFieldValue::from_json(raw);
            let rationale = truncate_chars(
                parsed.rationale().unwrap_or_default(),
                FIELD_RATIONALE_MAX_CHARS,
            );
            let value = match raw {
                Value::Object(map) => map.get("value").cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            (key.clone(), CollectedField { value, rationale })
        })
        .collect()
}

fn value_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
