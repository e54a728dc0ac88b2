//! Terminal rendering for analysis results

use crate::analyzer::{AnalysisOutcome, ConfidenceBand};
use crate::conditions::Condition;
use colored::*;
use std::fmt::Write;

fn band_colored(band: ConfidenceBand, text: String) -> ColoredString {
    match band {
        ConfidenceBand::High => text.red().bold(),
        ConfidenceBand::Medium => text.yellow().bold(),
        ConfidenceBand::Low => text.green().bold(),
    }
}

/// Human-readable report for one outcome
pub fn outcome_report(outcome: &AnalysisOutcome) -> String {
    let mut out = String::new();
    let primary = outcome.primary();
    let band = outcome.confidence_band();

    let _ = writeln!(out, "\n{}", "Analysis Result:".bold().cyan());
    let _ = writeln!(
        out,
        "  Condition:   {}",
        band_colored(band, primary.condition.clone())
    );
    let _ = writeln!(
        out,
        "  Confidence:  {} ({})",
        band_colored(band, format!("{:.1}%", primary.confidence)),
        band.as_str()
    );
    let _ = writeln!(out, "  {}", primary.description.dimmed());

    let others = outcome.other_possibilities();
    if !others.is_empty() {
        let _ = writeln!(out, "\n{}", "Other Possibilities:".bold());
        for other in others {
            let _ = writeln!(out, "  {:<14} {:>5.1}%", other.condition, other.probability);
        }
    }

    let _ = writeln!(out, "\n{}", "Recommendations:".bold());
    for rec in outcome.recommendations() {
        let _ = writeln!(out, "  • {}", rec);
    }

    if outcome.is_fallback() {
        let _ = writeln!(
            out,
            "\n{}",
            "⚠ Analysis failed; this is placeholder data, not a real result.".yellow()
        );
    }

    out
}

/// Table of known conditions
pub fn conditions_table<'a>(conditions: impl IntoIterator<Item = &'a Condition>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "Known Conditions:".bold().cyan());
    for condition in conditions {
        let marker = if condition.screened {
            "screened".green()
        } else {
            "reference".dimmed()
        };
        let _ = writeln!(out, "  {:<12} [{}] {}", condition.name, marker, condition.description);
    }
    out
}
