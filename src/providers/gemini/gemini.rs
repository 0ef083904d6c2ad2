use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info};
use reqwest::Client;
use serde_json::{json, Value};

use super::prompt::{response_schema, EXTRACTION_PROMPT, SYSTEM_INSTRUCTION};
use crate::config::ProviderConfig;
use crate::food::analysis::LabelAnalysis;
use crate::providers::traits::LabelExtractor;
use crate::providers::utils::{parse_label_response, INVALID_FORMAT};

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

#[derive(Clone)]
pub struct GeminiProvider {
    config: ProviderConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url, self.config.model
        )
    }

    fn request_body(&self, image: &[u8], mime_type: &str) -> Value {
        let mime_type = if mime_type.is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };

        json!({
            "systemInstruction": {
                "role": "system",
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "role": "user",
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": mime_type,
                            "data": STANDARD.encode(image)
                        }
                    },
                    { "text": EXTRACTION_PROMPT }
                ]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "topK": self.config.top_k,
                "maxOutputTokens": self.config.max_output_tokens,
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        })
    }
}

/// Concatenated text parts of the first candidate.
fn candidate_text(response: &Value) -> Option<String> {
    let parts = response["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|part| part["text"].as_str()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl LabelExtractor for GeminiProvider {
    async fn analyze_label(&self, image: &[u8], mime_type: &str) -> Result<LabelAnalysis> {
        info!(
            "Sending {} byte label image to {}",
            image.len(),
            self.config.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&self.request_body(image, mime_type))
            .send()
            .await
            .context("Failed to reach Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API returned {}: {}", status, body));
        }

        let response_json: Value = response
            .json()
            .await
            .context("Failed to decode Gemini response")?;
        debug!("Gemini raw response: {}", response_json);

        let text = candidate_text(&response_json).ok_or_else(|| anyhow!(INVALID_FORMAT))?;
        debug!("Gemini text output: {}", text);

        Ok(parse_label_response(&text))
    }

    fn get_model_info(&self) -> String {
        self.config.model.clone()
    }
}
