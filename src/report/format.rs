//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/selection code stays clean and testable
//! - output changes are localized

use crate::domain::{DistrictPrediction, FittedModel};
use crate::fit::selection::SelectionOutcome;

/// Format the run summary: selection path + fitted coefficients.
pub fn format_selection_summary(outcome: &SelectionOutcome, source: &str) -> String {
    let model = &outcome.model;
    let criterion = model.criterion.display_name();
    let mut out = String::new();

    out.push_str("=== turnout - forward selection ===\n");
    out.push_str(&format!("Data: {source} (n={})\n", model.n_rows));
    out.push_str(&format!("Outcome: {}\n", model.outcome));
    out.push_str(&format!("Criterion: {criterion}\n"));
    out.push_str(&format!("Rounds: {}\n", outcome.rounds));

    out.push_str("\nSelection path:\n");
    if outcome.steps.is_empty() {
        out.push_str("  (no feature improved on the intercept-only model)\n");
    } else {
        out.push_str(&format!("{:>4} {:<28} {:>16} {:>8}\n", "step", "feature", criterion, "skipped"));
        for (i, step) in outcome.steps.iter().enumerate() {
            out.push_str(
                format!(
                    "{:>4} {:<28} {:>16} {:>8}\n",
                    i + 1,
                    truncate(&step.feature, 28),
                    fmt_score(step.score),
                    step.singular
                )
                .trim_end(),
            );
            out.push('\n');
        }
        for step in outcome.steps.iter().filter(|s| s.rank_deficient) {
            out.push_str(&format!("  note: {} is collinear with earlier terms\n", step.feature));
        }
    }

    out.push_str("\nCoefficients:\n");
    out.push_str(&format_coefficients(model));
    out.push_str(&format!("\nFinal {criterion}: {}\n", fmt_score(outcome.score)));

    out
}

/// Format the slope/intercept table of a model.
pub fn format_coefficients(model: &FittedModel) -> String {
    let mut out = String::new();
    for (feature, slope) in model.slopes() {
        out.push_str(&format!("  {:<28} {:>14.6}\n", truncate(feature, 28), slope));
    }
    out.push_str(&format!("  {:<28} {:>14.6}\n", "(intercept)", model.intercept()));
    out
}

/// Format per-district predictions for one map.
pub fn format_districts(map: &str, rows: &[DistrictPrediction]) -> String {
    let mut out = format!("Map {map}:\n");
    for r in rows {
        out.push_str(&format!(
            "  district {:<10} precincts={:<6} predicted={:.4}\n",
            r.district, r.precincts, r.predicted
        ));
    }
    out
}

fn fmt_score(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.4}")
    } else if v < 0.0 {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
