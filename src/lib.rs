pub mod api;
pub mod commands;
pub mod config;
pub mod food;
pub mod providers;

// Re-export commonly used items
pub use food::analysis::{compute_health_score, HealthScoreResult, NutritionRecord};
pub use providers::{GeminiProvider, LabelExtractor};
