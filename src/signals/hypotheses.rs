use serde::Serialize;

use crate::signals::fields::{NormalizedFields, Scalar};
use crate::util::percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hypothesis {
    pub key: &'static str,
    pub label: &'static str,
}

pub const HYPOTHESES: [Hypothesis; 5] = [
    Hypothesis {
        key: "h1_validated",
        label: "H1 - Anticipation is the #1 pain",
    },
    Hypothesis {
        key: "h2_validated",
        label: "H2 - Load is asymmetric within the couple",
    },
    Hypothesis {
        key: "h3_validated",
        label: "H3 - Existing apps do not solve it",
    },
    Hypothesis {
        key: "h4_validated",
        label: "H4 - WhatsApp is a relevant channel",
    },
    Hypothesis {
        key: "h5_validated",
        label: "H5 - Willingness to pay",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Yes,
    No,
    Unknown,
}

/// Three-way reading of a boolean-ish field. Only `true`/`false` and the
/// exact strings `"true"`, `"True"`, `"false"`, `"False"` are decisive.
pub fn classify(value: Option<&Scalar>) -> Classification {
    match value {
        Some(Scalar::Bool(true)) => Classification::Yes,
        Some(Scalar::Bool(false)) => Classification::No,
        Some(Scalar::Text(text)) => match text.as_str() {
            "true" | "True" => Classification::Yes,
            "false" | "False" => Classification::No,
            _ => Classification::Unknown,
        },
        Some(Scalar::Number(_)) | None => Classification::Unknown,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BooleanTally {
    pub yes: usize,
    pub no: usize,
    pub unknown: usize,
}

impl BooleanTally {
    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Yes => self.yes += 1,
            Classification::No => self.no += 1,
            Classification::Unknown => self.unknown += 1,
        }
    }

    pub fn observe(&mut self, fields: &NormalizedFields, key: &str) {
        self.record(classify(fields.get(key)));
    }

    pub fn known(&self) -> usize {
        self.yes + self.no
    }

    pub fn rate_percent(&self) -> Option<u32> {
        percent(self.yes, self.known())
    }

    pub fn display_rate(&self) -> String {
        match self.rate_percent() {
            Some(pct) => format!("{}/{} ({}%)", self.yes, self.known(), pct),
            None => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HypothesisRow {
    pub key: &'static str,
    pub label: &'static str,
    pub tally: BooleanTally,
    pub rate_percent: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct HypothesisTallies {
    tallies: [BooleanTally; 5],
}

impl HypothesisTallies {
    pub fn observe(&mut self, fields: &NormalizedFields) {
        for (tally, hypothesis) in self.tallies.iter_mut().zip(HYPOTHESES.iter()) {
            tally.observe(fields, hypothesis.key);
        }
    }

    pub fn rows(&self) -> Vec<HypothesisRow> {
        HYPOTHESES
            .iter()
            .zip(self.tallies.iter())
            .map(|(hypothesis, tally)| HypothesisRow {
                key: hypothesis.key,
                label: hypothesis.label,
                tally: *tally,
                rate_percent: tally.rate_percent(),
            })
            .collect()
    }
}
