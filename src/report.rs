use chrono::{DateTime, Utc};

use crate::signals::categorical::FrequencyTable;
use crate::signals::hypotheses::BooleanTally;
use crate::signals::numeric::NumericStat;
use crate::signals::population::PopulationSummary;
use crate::util::{format_number, percent, utc_minutes_string};

pub const TOP_LIMIT: usize = 10;
pub const EXCERPT_LIMIT: usize = 10;

const TITLE: &str = "# Interview Discovery Analysis Report";

pub fn render_report(summary: &PopulationSummary, generated_at: DateTime<Utc>) -> String {
    let total = summary.total_conversations;
    if total == 0 {
        return format!("{TITLE}\n\nNo conversations to analyze.\n");
    }

    let mut lines = vec![
        TITLE.to_string(),
        String::new(),
        format!(
            "> Generated {} - {} conversations analyzed",
            utc_minutes_string(generated_at),
            total
        ),
        String::new(),
        "---".to_string(),
        String::new(),
        "## 1. Hypothesis Validation".to_string(),
        String::new(),
        "| Hypothesis | Validated | Not validated | Unknown | Rate |".to_string(),
        "|------------|-----------|---------------|---------|------|".to_string(),
    ];

    for row in &summary.hypotheses {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            row.label,
            row.tally.yes,
            row.tally.no,
            row.tally.unknown,
            row.tally.display_rate()
        ));
    }

    lines.extend([
        String::new(),
        "## 2. Participant Profile".to_string(),
        String::new(),
        format!("- **Total**: {total} conversations"),
        format!(
            "- **Average turns**: {:.1} exchanges/conversation",
            summary.transcript_turns.mean
        ),
        format!(
            "- **Children**: avg {:.1}, median {}",
            summary.children_count.mean,
            format_number(summary.children_count.median)
        ),
        String::new(),
        "### Family situation".to_string(),
        String::new(),
    ]);
    for entry in summary.family_situations.ranked() {
        let share = percent(entry.count, total).unwrap_or(0);
        lines.push(format!("- {}: {} ({}%)", entry.label, entry.count, share));
    }

    let load = &summary.mental_load_score;
    lines.extend([
        String::new(),
        "## 3. Mental Load".to_string(),
        String::new(),
        format!("- **Average score**: {:.1}/10", load.mean),
        format!("- **Median**: {}/10", format_number(load.median)),
        format!("- **Min/Max**: {}", min_max(load, "")),
        format!("- **Respondents**: {}/{}", load.count, total),
        String::new(),
        "### Top irritants".to_string(),
        String::new(),
    ]);
    push_ranked(&mut lines, &summary.irritants, |label, count| {
        format!("1. **{label}** - {count} mentions")
    });

    lines.extend([
        String::new(),
        "## 4. Current Solutions".to_string(),
        String::new(),
        "### Apps tried".to_string(),
        String::new(),
    ]);
    push_ranked(&mut lines, &summary.apps_tried, |label, count| {
        format!("- {label}: {count} mentions")
    });

    lines.extend([
        String::new(),
        "### Abandonment reasons".to_string(),
        String::new(),
    ]);
    for (idx, reason) in summary.abandon_reasons.iter().take(EXCERPT_LIMIT).enumerate() {
        lines.push(format!("{}. \"{}\"", idx + 1, reason));
    }

    lines.extend([
        String::new(),
        "### Family AI usage".to_string(),
        String::new(),
        format!("- Uses ChatGPT/AI: {}", usage_rate(&summary.ai_usage)),
        format!("- Active on WhatsApp: {}", usage_rate(&summary.whatsapp_active)),
        String::new(),
        "## 5. Value & Payment".to_string(),
        String::new(),
        "### Current spend (saving time)".to_string(),
        String::new(),
    ]);
    push_money(&mut lines, &summary.monthly_spend);
    lines.extend([
        String::new(),
        "### Willingness to pay".to_string(),
        String::new(),
    ]);
    push_money(&mut lines, &summary.willingness_to_pay);

    lines.extend([
        String::new(),
        "## 6. Beta Opt-in".to_string(),
        String::new(),
        format!("- Agreed to test: {}", usage_rate(&summary.beta_opt_in)),
        String::new(),
        "---".to_string(),
        String::new(),
        format!("*Generated by {} analyze*", env!("CARGO_PKG_NAME")),
    ]);

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn push_ranked(
    lines: &mut Vec<String>,
    table: &FrequencyTable,
    format_entry: impl Fn(&str, usize) -> String,
) {
    for entry in table.top(TOP_LIMIT) {
        lines.push(format_entry(&entry.label, entry.count));
    }
}

fn push_money(lines: &mut Vec<String>, stat: &NumericStat) {
    lines.push(format!("- **Average**: {:.1} EUR/month", stat.mean));
    lines.push(format!("- **Median**: {} EUR/month", format_number(stat.median)));
    lines.push(format!("- **Min/Max**: {}", min_max(stat, " EUR")));
}

fn min_max(stat: &NumericStat, unit: &str) -> String {
    format!(
        "{} - {}{}",
        format_number(stat.min),
        format_number(stat.max),
        unit
    )
}

fn usage_rate(tally: &BooleanTally) -> String {
    if tally.unknown == 0 {
        tally.display_rate()
    } else {
        format!("{} ({} unknown)", tally.display_rate(), tally.unknown)
    }
}
