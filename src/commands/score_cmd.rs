use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde_json::Value;
use std::fs::File;
use std::io::{self, Read};

use crate::food::analysis::units::is_truthy;
use crate::food::analysis::{compute_health_score, HealthScoreResult, NutritionRecord};

/// Score a nutrition JSON document read from `path` (`-` for stdin).
pub fn handle_command(path: &str, is_beverage: bool) -> Result<String> {
    let input: Box<dyn Read> = if path == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(path).with_context(|| format!("Failed to open {}", path))?)
    };

    let result = score_reader(input, is_beverage)?;
    Ok(format_report(&result))
}

/// Accepts either a bare nutrition object or a
/// `{"nutrition": {...}, "isBeverage": ...}` request body.
pub fn score_reader<R: Read>(reader: R, is_beverage: bool) -> Result<HealthScoreResult> {
    let document: Value = serde_json::from_reader(reader).context("Input is not valid JSON")?;

    let (nutrition, is_beverage) = match document.get("nutrition") {
        Some(nutrition) => (
            nutrition,
            is_beverage || document.get("isBeverage").map_or(false, is_truthy),
        ),
        None => (&document, is_beverage),
    };

    let record = NutritionRecord::from_value(nutrition)
        .ok_or_else(|| anyhow!("Nutrition data required"))?;
    Ok(compute_health_score(&record, is_beverage))
}

pub fn format_report(result: &HealthScoreResult) -> String {
    let score = result.health_score.to_string();
    let score = match result.health_score {
        70..=100 => score.green(),
        40..=69 => score.yellow(),
        _ => score.red(),
    };
    let details = &result.calculation_details;

    format!(
        "Health score: {}/100\n- Negative points: {}\n- Positive points: {}\n- FSA score: {}",
        score.bold(),
        details.negative_points,
        details.positive_points,
        details.fsa_score
    )
}
