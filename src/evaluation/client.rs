use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::evaluation::criteria::EvaluationCriterion;
use crate::model::TranscriptTurn;
use crate::util::truncate_chars;

pub const DEFAULT_API_BASE_URL: &str = "https://api.elevenlabs.io";
const API_KEY_HEADER: &str = "xi-api-key";
const ERROR_BODY_MAX_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct SimulationRequest<'a> {
    pub persona: &'a str,
    pub language: &'a str,
    pub criteria: Vec<&'a EvaluationCriterion>,
    pub turn_limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JudgeVerdict {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationAnalysis {
    #[serde(default)]
    pub call_successful: Option<Value>,
    #[serde(default)]
    pub transcript_summary: Option<String>,
    #[serde(default)]
    pub evaluation_criteria_results: Option<BTreeMap<String, JudgeVerdict>>,
    #[serde(default)]
    pub data_collection_results: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationOutcome {
    #[serde(default)]
    pub simulated_conversation: Option<Vec<TranscriptTurn>>,
    #[serde(default)]
    pub analysis: Option<SimulationAnalysis>,
}

impl SimulationOutcome {
    pub fn transcript(&self) -> &[TranscriptTurn] {
        self.simulated_conversation.as_deref().unwrap_or_default()
    }

    pub fn verdict(&self, criterion_id: &str) -> Option<&JudgeVerdict> {
        self.analysis
            .as_ref()?
            .evaluation_criteria_results
            .as_ref()?
            .get(criterion_id)
    }
}

pub trait SimulationClient {
    fn simulate(&self, request: &SimulationRequest<'_>) -> Result<SimulationOutcome>;
}

#[derive(Debug, Clone)]
pub struct SimulationClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub agent_id: String,
    pub timeout: Duration,
}

pub struct HttpSimulationClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct PromptConfig<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
struct SimulatedUserConfig<'a> {
    language: &'a str,
    prompt: PromptConfig<'a>,
}

#[derive(Serialize)]
struct SimulationSpecification<'a> {
    simulated_user_config: SimulatedUserConfig<'a>,
}

#[derive(Serialize)]
struct PromptCriterion<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    conversation_goal_prompt: &'a str,
}

#[derive(Serialize)]
struct SimulateConversationBody<'a> {
    simulation_specification: SimulationSpecification<'a>,
    extra_evaluation_criteria: Vec<PromptCriterion<'a>>,
    new_turns_limit: u32,
}

impl<'a> SimulateConversationBody<'a> {
    fn from_request(request: &SimulationRequest<'a>) -> Self {
        Self {
            simulation_specification: SimulationSpecification {
                simulated_user_config: SimulatedUserConfig {
                    language: request.language,
                    prompt: PromptConfig {
                        prompt: request.persona,
                    },
                },
            },
            extra_evaluation_criteria: request
                .criteria
                .iter()
                .map(|criterion| PromptCriterion {
                    id: criterion.id,
                    name: criterion.name,
                    kind: "prompt",
                    conversation_goal_prompt: criterion.rubric,
                })
                .collect(),
            new_turns_limit: request.turn_limit,
        }
    }
}

impl HttpSimulationClient {
    pub fn new(config: &SimulationClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            bail!("simulation api key is empty");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build simulation http client")?;

        Ok(Self {
            client,
            endpoint: simulate_endpoint(&config.base_url, &config.agent_id),
            api_key: config.api_key.clone(),
        })
    }
}

impl SimulationClient for HttpSimulationClient {
    fn simulate(&self, request: &SimulationRequest<'_>) -> Result<SimulationOutcome> {
        let body = SimulateConversationBody::from_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("simulation request failed: {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            bail!(
                "simulation endpoint returned {}: {}",
                status.as_u16(),
                truncate_chars(text.trim(), ERROR_BODY_MAX_CHARS)
            );
        }

        response
            .json::<SimulationOutcome>()
            .context("failed to decode simulation response")
    }
}

fn simulate_endpoint(base_url: &str, agent_id: &str) -> String {
    format!(
        "{}/v1/convai/agents/{}/simulate-conversation",
        base_url.trim_end_matches('/'),
        agent_id.trim()
    )
}
