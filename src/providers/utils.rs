use log::{error, warn};
use serde_json::Value;

use crate::food::analysis::LabelAnalysis;

const RAW_PREVIEW_CHARS: usize = 500;

pub const INVALID_FORMAT: &str = "Invalid response format";
pub const PARTIAL_JSON: &str =
    "Invalid or partial JSON response. Response may have been truncated due to size.";

/// Decode the model's JSON answer into a [`LabelAnalysis`].
///
/// Output cut off by the token limit is retried up to its last closing
/// brace. Anything still unreadable comes back as an analysis carrying an
/// error and a preview of the raw text.
pub fn parse_label_response(text: &str) -> LabelAnalysis {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => from_json(value),
        Err(e) => {
            error!("JSON parse error: {}", e);
            match salvage_truncated(text) {
                Some(value) => {
                    warn!("Parsed truncated response due to token limit");
                    from_json(value)
                }
                None => {
                    error!("Could not parse truncated JSON either");
                    LabelAnalysis {
                        raw: Some(preview(text)),
                        ..LabelAnalysis::failed(PARTIAL_JSON)
                    }
                }
            }
        }
    }
}

fn salvage_truncated(text: &str) -> Option<Value> {
    let last_brace = text.rfind('}').filter(|&i| i > 0)?;
    serde_json::from_str(&text[..=last_brace]).ok()
}

fn from_json(value: Value) -> LabelAnalysis {
    if !value.is_object() {
        error!("Invalid response format - not an object");
        return LabelAnalysis::failed(INVALID_FORMAT);
    }
    serde_json::from_value(value).unwrap_or_else(|e| {
        error!("Response does not match label schema: {}", e);
        LabelAnalysis::failed(INVALID_FORMAT)
    })
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(RAW_PREVIEW_CHARS).collect();
    format!("{}...", head)
}
