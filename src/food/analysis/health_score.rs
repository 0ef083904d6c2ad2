//! Nutri-Score style health scoring.
//!
//! Negative points accrue for energy, sugars, saturated fat and sodium;
//! positive points for fiber, protein and fruit/vegetable/nut/legume content.
//! The resulting FSA score is mapped onto 0-100, higher meaning healthier.

use serde::{Deserialize, Serialize};

use super::nutrition::{
    NutritionRecord, ENERGY_KEYS, FIBER_KEYS, FVNL_KEYS, PROTEIN_KEYS, SATURATED_FAT_KEYS,
    SODIUM_KEYS, SUGARS_KEYS,
};
use super::units::NutrientClass;

/// Ascending cut points for the negative nutrients, per 100g or per 100ml.
#[derive(Debug, Clone, Copy)]
pub struct NegativeThresholds {
    pub energy: &'static [f64],
    pub sugars: &'static [f64],
    pub saturated_fat: &'static [f64],
    pub sodium: &'static [f64],
}

pub const FOOD_THRESHOLDS: NegativeThresholds = NegativeThresholds {
    energy: &[80.0, 160.0, 240.0, 320.0, 400.0, 480.0, 560.0, 640.0, 720.0, 800.0],
    sugars: &[4.5, 9.0, 13.5, 18.0, 22.5, 27.0, 31.0, 36.0, 40.0, 45.0],
    saturated_fat: &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
    sodium: &[90.0, 180.0, 270.0, 360.0, 450.0, 540.0, 630.0, 720.0, 810.0, 900.0],
};

// Energy has nine cut points and saturated fat eleven.
pub const BEVERAGE_THRESHOLDS: NegativeThresholds = NegativeThresholds {
    energy: &[7.2, 14.3, 21.5, 28.5, 35.9, 43.0, 50.2, 57.4, 64.5],
    sugars: &[0.0, 1.5, 3.0, 4.5, 6.0, 7.5, 9.0, 10.5, 12.0, 13.5],
    saturated_fat: &[0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
    sodium: &[0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0, 360.0, 405.0],
};

pub const FIBER_THRESHOLDS: &[f64] = &[0.7, 1.4, 2.1, 2.8, 3.5];
pub const PROTEIN_THRESHOLDS: &[f64] = &[1.6, 3.2, 4.8, 6.4, 8.0];

/// Negative points at which protein stops counting unless FVNL is maxed out.
const PROTEIN_CAP_THRESHOLD: u32 = 11;
const MAX_FVNL_POINTS: u32 = 5;

const FSA_MIN: f64 = -15.0;
const FSA_MAX: f64 = 40.0;

impl NegativeThresholds {
    pub fn for_product(is_beverage: bool) -> &'static NegativeThresholds {
        if is_beverage {
            &BEVERAGE_THRESHOLDS
        } else {
            &FOOD_THRESHOLDS
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositivePoints {
    pub fvln: u32,
    pub fiber: u32,
    pub protein: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub negative_points: u32,
    pub positive_points: u32,
    pub fsa_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreResult {
    pub health_score: u8,
    pub calculation_details: ScoreBreakdown,
}

/// Number of thresholds strictly exceeded by `value`.
fn points_above(value: f64, thresholds: &[f64]) -> u32 {
    thresholds.iter().filter(|&&t| value > t).count() as u32
}

fn fvln_points(percent: f64) -> u32 {
    if percent >= 80.0 {
        5
    } else if percent >= 60.0 {
        2
    } else if percent >= 40.0 {
        1
    } else {
        0
    }
}

pub fn negative_points(record: &NutritionRecord, is_beverage: bool) -> u32 {
    let thresholds = NegativeThresholds::for_product(is_beverage);

    let energy = record.amount(ENERGY_KEYS, NutrientClass::Energy);
    let sugars = record.amount(SUGARS_KEYS, NutrientClass::Mass);
    let saturated_fat = record.amount(SATURATED_FAT_KEYS, NutrientClass::Mass);
    let sodium = record.amount(SODIUM_KEYS, NutrientClass::Sodium);

    points_above(energy, thresholds.energy)
        + points_above(sugars, thresholds.sugars)
        + points_above(saturated_fat, thresholds.saturated_fat)
        + points_above(sodium, thresholds.sodium)
}

/// Fiber and protein tables are shared by foods and beverages.
pub fn positive_points(record: &NutritionRecord, _is_beverage: bool) -> PositivePoints {
    let fvln = fvln_points(record.amount(FVNL_KEYS, NutrientClass::Percentage));
    let fiber = points_above(record.amount(FIBER_KEYS, NutrientClass::Mass), FIBER_THRESHOLDS);
    let protein = points_above(
        record.amount(PROTEIN_KEYS, NutrientClass::Mass),
        PROTEIN_THRESHOLDS,
    );

    PositivePoints {
        fvln,
        fiber,
        protein,
        total: fvln + fiber + protein,
    }
}

fn fsa_score(negative: u32, positive: &PositivePoints) -> i32 {
    let credited = if negative < PROTEIN_CAP_THRESHOLD || positive.fvln == MAX_FVNL_POINTS {
        positive.total
    } else {
        positive.fvln + positive.fiber
    };
    negative as i32 - credited as i32
}

/// Map an FSA score onto 0-100 where higher is healthier.
fn normalize(fsa: i32) -> u8 {
    let normalized = ((fsa as f64 - FSA_MIN) / (FSA_MAX - FSA_MIN)) * 100.0;
    (100.0 - normalized.clamp(0.0, 100.0)).round() as u8
}

pub fn compute_health_score(record: &NutritionRecord, is_beverage: bool) -> HealthScoreResult {
    let negative = negative_points(record, is_beverage);
    let positive = positive_points(record, is_beverage);
    let fsa = fsa_score(negative, &positive);

    HealthScoreResult {
        health_score: normalize(fsa),
        calculation_details: ScoreBreakdown {
            negative_points: negative,
            positive_points: positive.total,
            fsa_score: fsa,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_food() -> NutritionRecord {
        NutritionRecord::new()
            .with("energy", "400kcal")
            .with("sugars", "10g")
            .with("saturatedFat", "2g")
            .with("sodium", "200mg")
            .with("fiber", "3g")
            .with("protein", "5g")
            .with("fruitsVegetablesNuts", "50%")
    }

    #[test]
    fn test_sample_food_end_to_end() {
        let result = compute_health_score(&sample_food(), false);

        assert_eq!(result.calculation_details.negative_points, 9);
        assert_eq!(result.calculation_details.positive_points, 8);
        assert_eq!(result.calculation_details.fsa_score, 1);

        let expected = (100.0 - (16.0 / 55.0) * 100.0_f64).round() as u8;
        assert_eq!(result.health_score, expected);
        assert_eq!(result.health_score, 71);
    }

    #[test]
    fn test_empty_record_scores_zero_fsa() {
        let result = compute_health_score(&NutritionRecord::new(), false);
        assert_eq!(result.calculation_details.negative_points, 0);
        assert_eq!(result.calculation_details.positive_points, 0);
        assert_eq!(result.calculation_details.fsa_score, 0);
        // 15/55 of the range, inverted
        assert_eq!(result.health_score, 73);
    }

    #[test]
    fn test_threshold_counting_is_strict() {
        let at = NutritionRecord::new().with("sugars", "4.5g");
        let above = NutritionRecord::new().with("sugars", "4.51g");
        assert_eq!(negative_points(&at, false), 0);
        assert_eq!(negative_points(&above, false), 1);

        let protein = NutritionRecord::new().with("protein", "1.6g");
        assert_eq!(positive_points(&protein, false).protein, 0);
    }

    #[test]
    fn test_fvln_tiers() {
        let tier = |pct: &str| {
            positive_points(&NutritionRecord::new().with("fruitsVegetablesNuts", pct), false).fvln
        };
        assert_eq!(tier("39%"), 0);
        assert_eq!(tier("40%"), 1);
        assert_eq!(tier("59.9%"), 1);
        assert_eq!(tier("60%"), 2);
        assert_eq!(tier("79%"), 2);
        assert_eq!(tier("80%"), 5);
        assert_eq!(tier("100%"), 5);
        // without a percent sign the value is ignored
        assert_eq!(tier("90"), 0);
    }

    #[test]
    fn test_beverage_tables() {
        let drink = NutritionRecord::new()
            .with("energy", "20kcal")
            .with("sugars", "5g")
            .with("saturatedFat", "0")
            .with("sodium", "10mg");
        // energy > 7.2, 14.3 -> 2; sugars > 0,1.5,3,4.5 -> 4; sodium > 0 -> 1
        assert_eq!(negative_points(&drink, true), 7);
        // food tables are far more lenient for the same values
        assert_eq!(negative_points(&drink, false), 1);
    }

    #[test]
    fn test_beverage_saturated_fat_maxes_at_eleven() {
        let record = NutritionRecord::new().with("saturatedFat", "5g");
        assert_eq!(negative_points(&record, true), 11);
        assert_eq!(negative_points(&record, false), 4);
    }

    #[test]
    fn test_unit_conversion_feeds_scoring() {
        // 1g sodium is 1000mg: all ten food thresholds exceeded
        let record = NutritionRecord::new().with("sodium", "1g");
        assert_eq!(negative_points(&record, false), 10);

        // 1700kJ is about 406 kcal
        let record = NutritionRecord::new().with("energy", "1700kJ");
        assert_eq!(negative_points(&record, false), 5);
    }

    #[test]
    fn test_synonym_keys() {
        let record = NutritionRecord::new()
            .with("TotalSugars", "20g")
            .with("sugars", "1g")
            .with("dietaryfiber", "4g")
            .with("fiber", "0g");
        assert_eq!(negative_points(&record, false), 4);
        assert_eq!(positive_points(&record, false).fiber, 5);
    }

    #[test]
    fn test_override_excludes_protein_when_fvln_not_maxed() {
        let record = NutritionRecord::new()
            .with("energy", "900kcal")
            .with("sugars", "10g")
            .with("fiber", "3g")
            .with("protein", "10g")
            .with("fruitsVegetablesNuts", "65%");
        let n = negative_points(&record, false);
        let p = positive_points(&record, false);
        assert_eq!(n, 12);
        assert_eq!(p, PositivePoints { fvln: 2, fiber: 4, protein: 5, total: 11 });

        let result = compute_health_score(&record, false);
        assert_eq!(result.calculation_details.fsa_score, 12 - (2 + 4));
        assert_eq!(result.calculation_details.positive_points, 11);
    }

    #[test]
    fn test_override_keeps_protein_when_fvln_maxed() {
        let record = NutritionRecord::new()
            .with("energy", "900kcal")
            .with("sugars", "10g")
            .with("fiber", "3g")
            .with("protein", "10g")
            .with("fruitsVegetablesNuts", "85%");
        let result = compute_health_score(&record, false);
        assert_eq!(result.calculation_details.negative_points, 12);
        assert_eq!(result.calculation_details.fsa_score, 12 - 14);
    }

    #[test]
    fn test_score_is_clamped() {
        let worst = NutritionRecord::new()
            .with("energy", "5000kcal")
            .with("sugars", "100g")
            .with("saturatedFat", "50g")
            .with("sodium", "5000mg");
        let result = compute_health_score(&worst, true);
        assert_eq!(result.calculation_details.negative_points, 40);
        assert_eq!(result.calculation_details.fsa_score, 40);
        assert_eq!(result.health_score, 0);

        let as_food = worst.with("energy", "9000kcal");
        assert_eq!(compute_health_score(&as_food, false).health_score, 0);

        let best = NutritionRecord::new()
            .with("fiber", "10g")
            .with("protein", "20g")
            .with("fruitsVegetablesNuts", "95%");
        let result = compute_health_score(&best, false);
        assert_eq!(result.calculation_details.fsa_score, -15);
        assert_eq!(result.health_score, 100);
    }

    /// Amounts of `key` from 0 upwards in `step` increments, ending with a
    /// value far past any threshold.
    fn sweep(key: &str, unit: &str, step: f64, count: usize) -> Vec<NutritionRecord> {
        let mut records: Vec<_> = (0..=count)
            .map(|i| sample_food().with(key, format!("{:.2}{}", i as f64 * step, unit)))
            .collect();
        records.push(sample_food().with(key, format!("1{}{}", "0".repeat(400), unit)));
        records
    }

    fn assert_non_decreasing(records: &[NutritionRecord], points: impl Fn(&NutritionRecord) -> u32) {
        let values: Vec<u32> = records.iter().map(points).collect();
        for pair in values.windows(2) {
            assert!(pair[1] >= pair[0], "points dropped: {:?}", values);
        }
    }

    #[test]
    fn test_negative_points_are_monotonic() {
        let nutrients = [
            ("energy", "kcal", 1.0, 900),
            ("sugars", "g", 0.25, 200),
            ("saturatedFat", "g", 0.05, 240),
            ("sodium", "mg", 5.0, 200),
        ];

        for is_beverage in [false, true] {
            for (key, unit, step, count) in nutrients {
                let records = sweep(key, unit, step, count);
                assert_non_decreasing(&records, |r| negative_points(r, is_beverage));
            }
        }
    }

    #[test]
    fn test_positive_points_are_monotonic() {
        let nutrients = [
            ("fiber", "g", 0.05, 100),
            ("protein", "g", 0.1, 100),
            ("fruitsVegetablesNuts", "%", 1.0, 100),
        ];

        for is_beverage in [false, true] {
            for (key, unit, step, count) in nutrients {
                let records = sweep(key, unit, step, count);
                assert_non_decreasing(&records, |r| positive_points(r, is_beverage).total);
            }
        }
    }

    #[test]
    fn test_score_never_rises_with_sugars() {
        for is_beverage in [false, true] {
            let scores: Vec<u8> = sweep("sugars", "g", 1.0, 60)
                .iter()
                .map(|r| compute_health_score(r, is_beverage).health_score)
                .collect();
            for pair in scores.windows(2) {
                assert!(pair[1] <= pair[0], "score rose: {:?}", scores);
            }
        }
    }

    #[test]
    fn test_oversized_amount_scores_maximum_points() {
        let huge = NutritionRecord::new().with("sodium", format!("1{}mg", "0".repeat(400)));
        let regular = NutritionRecord::new().with("sodium", "1000mg");

        assert_eq!(negative_points(&huge, false), 10);
        assert_eq!(negative_points(&huge, true), 10);
        assert!(negative_points(&huge, false) >= negative_points(&regular, false));
    }

    #[test]
    fn test_numeric_values_are_accepted() {
        let record = NutritionRecord::new()
            .with("energy", json!(400))
            .with("protein", json!(5.0));
        assert_eq!(negative_points(&record, false), 4);
        assert_eq!(positive_points(&record, false).protein, 3);
    }

    #[test]
    fn test_repeat_calls_are_identical() {
        let record = sample_food();
        assert_eq!(
            compute_health_score(&record, false),
            compute_health_score(&record, false)
        );
        assert_eq!(
            compute_health_score(&record, true),
            compute_health_score(&record, true)
        );
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let value = serde_json::to_value(compute_health_score(&sample_food(), false)).unwrap();
        assert_eq!(
            value,
            json!({
                "healthScore": 71,
                "calculationDetails": {
                    "negativePoints": 9,
                    "positivePoints": 8,
                    "fsaScore": 1
                }
            })
        );
    }
}
