pub mod analysis;

// Re-export common types
pub use analysis::{compute_health_score, HealthScoreResult, LabelAnalysis, NutritionRecord};
