use serde::Serialize;

use crate::model::ConversationRecord;
use crate::signals::categorical::FrequencyTable;
use crate::signals::fields::{NormalizedFields, normalize_analysis};
use crate::signals::hypotheses::{BooleanTally, HypothesisRow, HypothesisTallies};
use crate::signals::numeric::{NumericSample, NumericStat};

pub const FIELD_CHILDREN_COUNT: &str = "nombre_enfants";
pub const FIELD_FAMILY_SITUATION: &str = "situation_couple";
pub const FIELD_MENTAL_LOAD_SCORE: &str = "charge_mentale_score";
pub const FIELD_TOP_IRRITANT: &str = "top_irritant";
pub const FIELD_APPS_TRIED: &str = "apps_essayees";
pub const FIELD_ABANDON_REASON: &str = "raison_abandon_app";
pub const FIELD_AI_USAGE: &str = "usage_ia_famille";
pub const FIELD_WHATSAPP_ACTIVE: &str = "whatsapp_actif";
pub const FIELD_MONTHLY_SPEND: &str = "depense_temps_mensuelle";
pub const FIELD_WILLINGNESS_TO_PAY: &str = "willingness_to_pay";
pub const FIELD_BETA_OPT_IN: &str = "opt_in_beta";

pub const APPS_DELIMITER: char = ',';

#[derive(Debug, Clone, Serialize)]
pub struct PopulationSummary {
    pub total_conversations: usize,
    pub conversations_without_fields: usize,
    pub hypotheses: Vec<HypothesisRow>,
    pub transcript_turns: NumericStat,
    pub children_count: NumericStat,
    pub family_situations: FrequencyTable,
    pub mental_load_score: NumericStat,
    pub irritants: FrequencyTable,
    pub apps_tried: FrequencyTable,
    pub abandon_reasons: Vec<String>,
    pub ai_usage: BooleanTally,
    pub whatsapp_active: BooleanTally,
    pub monthly_spend: NumericStat,
    pub willingness_to_pay: NumericStat,
    pub beta_opt_in: BooleanTally,
}

#[derive(Debug, Default)]
struct PopulationFold {
    total: usize,
    without_fields: usize,
    hypotheses: HypothesisTallies,
    turns: NumericSample,
    children: NumericSample,
    situations: FrequencyTable,
    mental_load: NumericSample,
    irritants: FrequencyTable,
    apps: FrequencyTable,
    abandon_reasons: Vec<String>,
    ai_usage: BooleanTally,
    whatsapp_active: BooleanTally,
    spend: NumericSample,
    willingness: NumericSample,
    opt_in: BooleanTally,
}

impl PopulationFold {
    fn observe(&mut self, transcript_turns: usize, fields: &NormalizedFields) {
        self.total += 1;
        if fields.is_empty() {
            self.without_fields += 1;
        }
        self.hypotheses.observe(fields);
        self.turns.push(transcript_turns as f64);
        self.children.observe(fields, FIELD_CHILDREN_COUNT);
        self.situations.observe_single(fields, FIELD_FAMILY_SITUATION);
        self.mental_load.observe(fields, FIELD_MENTAL_LOAD_SCORE);
        self.irritants.observe_single(fields, FIELD_TOP_IRRITANT);
        self.apps
            .observe_multi(fields, FIELD_APPS_TRIED, APPS_DELIMITER);
        if let Some(reason) = fields
            .get(FIELD_ABANDON_REASON)
            .and_then(|scalar| scalar.label())
        {
            self.abandon_reasons.push(reason);
        }
        self.ai_usage.observe(fields, FIELD_AI_USAGE);
        self.whatsapp_active.observe(fields, FIELD_WHATSAPP_ACTIVE);
        self.spend.observe(fields, FIELD_MONTHLY_SPEND);
        self.willingness.observe(fields, FIELD_WILLINGNESS_TO_PAY);
        self.opt_in.observe(fields, FIELD_BETA_OPT_IN);
    }

    fn finish(self) -> PopulationSummary {
        PopulationSummary {
            total_conversations: self.total,
            conversations_without_fields: self.without_fields,
            hypotheses: self.hypotheses.rows(),
            transcript_turns: self.turns.stat(),
            children_count: self.children.stat(),
            family_situations: self.situations,
            mental_load_score: self.mental_load.stat(),
            irritants: self.irritants,
            apps_tried: self.apps,
            abandon_reasons: self.abandon_reasons,
            ai_usage: self.ai_usage,
            whatsapp_active: self.whatsapp_active,
            monthly_spend: self.spend.stat(),
            willingness_to_pay: self.willingness.stat(),
            beta_opt_in: self.opt_in,
        }
    }
}

pub fn summarize(conversations: &[ConversationRecord]) -> PopulationSummary {
    let mut fold = PopulationFold::default();
    for conversation in conversations {
        let fields = normalize_analysis(conversation.analysis.as_ref());
        fold.observe(conversation.transcript.len(), &fields);
    }
    fold.finish()
}
