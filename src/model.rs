use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptTurn {
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_in_call_secs: Option<f64>,
}

impl TranscriptTurn {
    pub fn is_agent(&self) -> bool {
        self.role.as_deref() == Some("agent")
    }

    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub agent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub transcript: Vec<TranscriptTurn>,
    #[serde(default)]
    pub analysis: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub has_audio: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationExport {
    #[serde(default, deserialize_with = "lenient")]
    pub agent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub export_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub total_conversations: Option<usize>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub conversations: Vec<ConversationRecord>,
}

// Export fields the aggregation never depends on: a value of the wrong type
// reads as absent instead of failing the whole document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// Arrays keep the items that decode; anything other than an array is empty.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedField {
    pub value: Value,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictResult {
    Success,
    Failure,
    Unknown,
    Missing,
}

impl VerdictResult {
    pub fn from_judge(raw: &str) -> Self {
        match raw {
            "success" => Self::Success,
            "failure" => Self::Failure,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Unknown => "unknown",
            Self::Missing => "missing",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionVerdict {
    pub criterion_id: String,
    pub criterion_name: String,
    pub result: VerdictResult,
    pub judge_result: Option<String>,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScenarioStatus {
    Pass,
    Fail,
    Error,
}

impl ScenarioStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }

    pub fn icon(self) -> char {
        match self {
            Self::Pass => '+',
            Self::Fail => 'x',
            Self::Error => '!',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: u32,
    pub name: String,
    pub status: ScenarioStatus,
    pub duration_secs: f64,
    pub transcript_turns: usize,
    pub verdicts: Vec<CriterionVerdict>,
    pub error: Option<String>,
    pub call_successful: Option<String>,
    pub transcript_summary: Option<String>,
    pub data_collection: Option<BTreeMap<String, CollectedField>>,
    pub transcript: Option<Vec<TranscriptTurn>>,
}

impl ScenarioResult {
    pub fn failing_verdicts(&self) -> impl Iterator<Item = &CriterionVerdict> {
        self.verdicts
            .iter()
            .filter(|verdict| !verdict.result.is_success())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRunManifest {
    pub agent_id: String,
    pub run_date: String,
    pub total_duration_secs: f64,
    pub total_scenarios: usize,
    pub results: Vec<ScenarioResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_record_tolerates_sparse_rows() {
        let raw = r#"{"conversation_id": "c1", "transcript": [{"role": "agent"}]}"#;
        let record: ConversationRecord =
            serde_json::from_str(raw).expect("sparse record should deserialize");
        assert_eq!(record.conversation_id.as_deref(), Some("c1"));
        assert!(record.user_id.is_none());
        assert!(record.analysis.is_none());
        assert_eq!(record.transcript.len(), 1);
        assert!(record.transcript[0].is_agent());
        assert_eq!(record.transcript[0].text(), "");
    }

    #[test]
    fn wrongly_typed_record_fields_read_as_absent() {
        let raw = r#"{
            "total_conversations": "two",
            "conversations": [
                {"conversation_id": "c1", "status": "done",
                 "transcript": [{"role": "agent", "message": "Salut", "time_in_call_secs": 1.5}]},
                {"conversation_id": null, "status": 3, "user_id": {"id": 7},
                 "has_audio": "yes",
                 "transcript": [{"role": 1, "message": null, "time_in_call_secs": "3"}, "noise"]},
                {"conversation_id": "c3", "transcript": null}
            ]
        }"#;
        let export: ConversationExport =
            serde_json::from_str(raw).expect("odd records should not fail the export");

        assert!(export.total_conversations.is_none());
        assert_eq!(export.conversations.len(), 3);
        assert_eq!(export.conversations[0].transcript[0].time_in_call_secs, Some(1.5));

        let odd = &export.conversations[1];
        assert!(odd.conversation_id.is_none());
        assert!(odd.status.is_none());
        assert!(odd.user_id.is_none());
        assert!(odd.has_audio.is_none());
        assert_eq!(odd.transcript.len(), 1);
        assert!(odd.transcript[0].role.is_none());
        assert!(odd.transcript[0].time_in_call_secs.is_none());

        assert!(export.conversations[2].transcript.is_empty());
    }

    #[test]
    fn export_without_conversations_is_empty() {
        let export: ConversationExport =
            serde_json::from_str(r#"{"agent_id": "a"}"#).expect("export should deserialize");
        assert!(export.conversations.is_empty());
    }

    #[test]
    fn judge_strings_map_to_verdicts() {
        assert_eq!(VerdictResult::from_judge("success"), VerdictResult::Success);
        assert_eq!(VerdictResult::from_judge("failure"), VerdictResult::Failure);
        assert_eq!(VerdictResult::from_judge("Success"), VerdictResult::Unknown);
        assert_eq!(VerdictResult::from_judge("unknown"), VerdictResult::Unknown);
    }

    #[test]
    fn statuses_serialize_uppercase() {
        let json = serde_json::to_string(&ScenarioStatus::Error).expect("serialize");
        assert_eq!(json, "\"ERROR\"");
        let json = serde_json::to_string(&VerdictResult::Missing).expect("serialize");
        assert_eq!(json, "\"missing\"");
    }
}
