use std::collections::HashMap;

use serde::Serialize;

use crate::signals::fields::NormalizedFields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn increment(&mut self, label: &str) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }

        match self.index.get(label) {
            Some(&idx) => self.entries[idx].count += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push(FrequencyEntry {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn observe_single(&mut self, fields: &NormalizedFields, key: &str) {
        if let Some(label) = fields.get(key).and_then(|scalar| scalar.label()) {
            self.increment(&label);
        }
    }

    pub fn observe_multi(&mut self, fields: &NormalizedFields, key: &str, delimiter: char) {
        let Some(scalar) = fields.get(key) else {
            return;
        };

        match scalar.as_text() {
            Some(text) => {
                for token in text.split(delimiter) {
                    self.increment(token);
                }
            }
            None => {
                if let Some(label) = scalar.label() {
                    self.increment(&label);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Descending by count; equal counts keep first-seen order.
    pub fn ranked(&self) -> Vec<FrequencyEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    pub fn top(&self, limit: usize) -> Vec<FrequencyEntry> {
        let mut ranked = self.ranked();
        ranked.truncate(limit);
        ranked
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ranked().serialize(serializer)
    }
}
