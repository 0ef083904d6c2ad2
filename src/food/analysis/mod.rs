pub mod health_score;
pub mod nutrition;
pub mod units;

pub use health_score::{
    compute_health_score, negative_points, positive_points, HealthScoreResult, PositivePoints,
    ScoreBreakdown,
};
pub use nutrition::{LabelAnalysis, NutrientEntry, NutritionRecord};
pub use units::{parse_value, NutrientClass};
