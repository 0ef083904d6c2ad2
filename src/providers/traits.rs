use anyhow::Result;
use async_trait::async_trait;

use crate::food::analysis::LabelAnalysis;

/// A multimodal model that turns a food label photo into structured data.
#[async_trait]
pub trait LabelExtractor: Send + Sync {
    async fn analyze_label(&self, image: &[u8], mime_type: &str) -> Result<LabelAnalysis>;

    fn get_model_info(&self) -> String;
}
