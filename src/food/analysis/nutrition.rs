use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::units::{is_truthy, parse_value, NutrientClass};

/// Nutrient key lookups, ordered by precedence.
pub const ENERGY_KEYS: &[&str] = &["energy"];
pub const SUGARS_KEYS: &[&str] = &["TotalSugars", "sugars"];
pub const SATURATED_FAT_KEYS: &[&str] = &["saturatedFat"];
pub const SODIUM_KEYS: &[&str] = &["sodium"];
pub const FIBER_KEYS: &[&str] = &["dietaryfiber", "fiber"];
pub const PROTEIN_KEYS: &[&str] = &["protein"];
pub const FVNL_KEYS: &[&str] = &["fruitsVegetablesNuts"];

/// Raw per-100g (or per-100ml) nutrient values keyed by nutrient name.
///
/// Values are kept as JSON so numbers, numeric strings and strings with a
/// unit suffix ("380kcal", "0.4 g") can all be scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutritionRecord {
    values: Map<String, Value>,
}

impl NutritionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from an arbitrary JSON value.
    ///
    /// Returns `None` when there is no nutrition data at all (null, false, 0
    /// or ""). Any other non-object value carries no nutrients and scores as
    /// an empty record.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !is_truthy(value) {
            return None;
        }
        match value {
            Value::Object(values) => Some(Self {
                values: values.clone(),
            }),
            _ => Some(Self::default()),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// First candidate key holding a usable value.
    pub fn lookup(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.values.get(*key))
            .find(|value| is_truthy(value))
    }

    /// Resolve `keys` and normalize the value into the canonical unit of `class`.
    pub fn amount(&self, keys: &[&str], class: NutrientClass) -> f64 {
        parse_value(self.lookup(keys), class)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single row of a label's nutrition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientEntry {
    pub name: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

/// Structured data extracted from a food label image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub nutrition: Vec<NutrientEntry>,
    /// Scoring inputs as labelled strings, e.g. `"Energy": "380 kcal"`.
    #[serde(default)]
    pub healthscore: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Head of the unparsed model output, kept when parsing failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl LabelAnalysis {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether the label yielded anything worth returning.
    pub fn has_content(&self) -> bool {
        !self.ingredients.is_empty() || !self.nutrition.is_empty()
    }
}
