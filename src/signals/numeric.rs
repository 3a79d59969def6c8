use serde::Serialize;

use crate::signals::fields::NormalizedFields;
use crate::util::round1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NumericStat {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
}

impl NumericStat {
    /// Summarizes a sample. The mean is rounded to one decimal; an odd-sized
    /// median is the exact central value, an even-sized one the rounded
    /// mean of the two central values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let sum: f64 = sorted.iter().sum();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            round1((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
        };

        Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean: round1(sum / n as f64),
            median,
            count: n,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NumericSample {
    values: Vec<f64>,
}

impl NumericSample {
    pub fn observe(&mut self, fields: &NormalizedFields, key: &str) {
        if let Some(value) = fields.get(key).and_then(|scalar| scalar.as_number()) {
            self.push(value);
        }
    }

    pub fn push(&mut self, value: f64) {
        if value.is_finite() {
            self.values.push(value);
        }
    }

    pub fn stat(&self) -> NumericStat {
        NumericStat::from_values(&self.values)
    }
}
