use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::util::format_number;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => number.as_f64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<String> {
        match self {
            Self::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Self::Number(number) => Some(format_number(*number)),
            Self::Bool(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CollectedFieldValue {
    Scalar(Option<Scalar>),
    Annotated {
        value: Option<Scalar>,
        rationale: Option<String>,
    },
}

impl CollectedFieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::Annotated {
                value: map.get("value").and_then(Scalar::from_json),
                rationale: map
                    .get("rationale")
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned),
            },
            other => Self::Scalar(Scalar::from_json(other)),
        }
    }

    pub fn into_scalar(self) -> Option<Scalar> {
        match self {
            Self::Scalar(value) => value,
            Self::Annotated { value, .. } => value,
        }
    }

    pub fn rationale(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Annotated { rationale, .. } => rationale.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedFields {
    values: BTreeMap<String, Scalar>,
}

impl NormalizedFields {
    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.values.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn data_collection_payload(analysis: Option<&Value>) -> Option<&Map<String, Value>> {
    let analysis = analysis?.as_object()?;
    let non_empty = move |key: &str| {
        analysis
            .get(key)
            .and_then(Value::as_object)
            .filter(|map| !map.is_empty())
    };

    non_empty("data_collection_results").or_else(|| non_empty("data_collection"))
}

pub fn normalize_payload(payload: Option<&Map<String, Value>>) -> NormalizedFields {
    let mut values = BTreeMap::new();
    for (field, raw) in payload.into_iter().flatten() {
        if let Some(scalar) = CollectedFieldValue::from_json(raw).into_scalar() {
            values.insert(field.clone(), scalar);
        }
    }
    NormalizedFields { values }
}

pub fn normalize_analysis(analysis: Option<&Value>) -> NormalizedFields {
    normalize_payload(data_collection_payload(analysis))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn annotated_values_unwrap_to_scalars() {
        let analysis = json!({
            "data_collection_results": {
                "h1_validated": {"value": "True", "rationale": "said so"},
                "nombre_enfants": 2,
                "top_irritant": {"data_collection_id": "top_irritant", "value": "repas"}
            }
        });

        let fields = normalize_analysis(Some(&analysis));
        assert_eq!(
            fields.get("h1_validated"),
            Some(&Scalar::Text("True".to_string()))
        );
        assert_eq!(fields.get("nombre_enfants"), Some(&Scalar::Number(2.0)));
        assert_eq!(
            fields.get("top_irritant"),
            Some(&Scalar::Text("repas".to_string()))
        );
    }

    #[test]
    fn missing_or_odd_shapes_degrade_to_absence() {
        let analysis = json!({
            "data_collection_results": {
                "no_value": {"rationale": "not discussed"},
                "null_value": {"value": null},
                "bare_null": null,
                "nested": {"value": {"deeper": 1}},
                "list": ["a", "b"]
            }
        });

        let fields = normalize_analysis(Some(&analysis));
        assert!(fields.is_empty());
    }

    #[test]
    fn absent_or_malformed_analysis_yields_empty_mapping() {
        assert!(normalize_analysis(None).is_empty());
        assert!(normalize_analysis(Some(&json!(null))).is_empty());
        assert!(normalize_analysis(Some(&json!("text"))).is_empty());
        assert!(normalize_analysis(Some(&json!({"data_collection_results": [1, 2]}))).is_empty());
    }

    #[test]
    fn falls_back_to_legacy_data_collection_key() {
        for empty in [json!({}), json!(null), json!([]), json!(""), json!(false), json!(0)] {
            let analysis = json!({
                "data_collection_results": empty.clone(),
                "data_collection": {"opt_in_beta": true}
            });

            let fields = normalize_analysis(Some(&analysis));
            assert_eq!(
                fields.get("opt_in_beta"),
                Some(&Scalar::Bool(true)),
                "data_collection_results = {empty}"
            );
        }

        let neither = json!({"data_collection_results": [], "data_collection": "x"});
        assert!(normalize_analysis(Some(&neither)).is_empty());
    }

    #[test]
    fn populated_results_win_over_legacy_key() {
        let analysis = json!({
            "data_collection_results": {"opt_in_beta": false},
            "data_collection": {"opt_in_beta": true}
        });

        let fields = normalize_analysis(Some(&analysis));
        assert_eq!(fields.get("opt_in_beta"), Some(&Scalar::Bool(false)));
    }

    #[test]
    fn annotation_keeps_rationale_for_diagnostics() {
        let field = CollectedFieldValue::from_json(&json!({"value": 4, "rationale": "four"}));
        assert_eq!(field.rationale(), Some("four"));
        assert_eq!(field.into_scalar(), Some(Scalar::Number(4.0)));
    }

    #[test]
    fn labels_are_trimmed_and_skip_booleans() {
        assert_eq!(
            Scalar::Text("  Cozi ".to_string()).label(),
            Some("Cozi".to_string())
        );
        assert_eq!(Scalar::Text("   ".to_string()).label(), None);
        assert_eq!(Scalar::Number(3.0).label(), Some("3".to_string()));
        assert_eq!(Scalar::Bool(true).label(), None);
    }
}
