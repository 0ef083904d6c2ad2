use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref VALUE_PATTERN: Regex =
        Regex::new(r"([0-9.]+)([a-zA-Z%]*)").expect("value pattern is valid");
}

const KJ_PER_KCAL: f64 = 4.184;

/// How a raw nutrient value is normalized into its canonical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientClass {
    /// kcal, with kJ converted.
    Energy,
    /// mg, with g converted.
    Sodium,
    /// g, with mg and mcg converted.
    Mass,
    /// Percent; anything without a `%` suffix counts as absent.
    Percentage,
    /// Taken as-is.
    Plain,
}

/// Mirrors the truthiness checks label data is usually produced with:
/// null, false, 0 and "" all count as "no value".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parse a raw nutrient value and convert it to the canonical unit of `class`.
///
/// Never fails: missing, empty or unparsable input yields 0.
pub fn parse_value(raw: Option<&Value>, class: NutrientClass) -> f64 {
    let raw = match raw {
        Some(value) if is_truthy(value) => value,
        _ => return 0.0,
    };

    let text = match raw {
        Value::String(s) => s.trim().to_string(),
        // Objects carry no readable value of their own.
        Value::Object(_) => return 0.0,
        other => other.to_string(),
    };

    let (value, unit) = match split_value(&text) {
        Some(parts) => parts,
        None => return 0.0,
    };

    match class {
        NutrientClass::Energy => {
            if unit == "kj" {
                value / KJ_PER_KCAL
            } else {
                value
            }
        }
        NutrientClass::Sodium => {
            if unit == "g" {
                value * 1000.0
            } else {
                value
            }
        }
        NutrientClass::Mass => match unit.as_str() {
            "mg" => value / 1000.0,
            "mcg" => value / 1_000_000.0,
            _ => value,
        },
        NutrientClass::Percentage => {
            if unit == "%" {
                value
            } else {
                0.0
            }
        }
        NutrientClass::Plain => value,
    }
}

fn split_value(text: &str) -> Option<(f64, String)> {
    let captures = VALUE_PATTERN.captures(text)?;
    Some((lenient_float(&captures[1]), captures[2].to_lowercase()))
}

/// Parse the longest `digits[.digits]` prefix of a token made of digits and dots.
/// `"1.2.3"` reads as 1.2; a token without digits reads as 0. Tokens too large
/// for `f64` saturate at `f64::MAX`.
fn lenient_float(token: &str) -> f64 {
    let end = token
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .nth(1)
        .map_or(token.len(), |(i, _)| i);

    match token[..end].parse::<f64>() {
        Ok(v) if v.is_infinite() => f64::MAX,
        Ok(v) if !v.is_nan() => v,
        _ => 0.0,
    }
}
