use serde_json::{json, Value};

/// Keys of the `healthscore` object the model must fill in.
pub const HEALTHSCORE_FIELDS: &[&str] = &[
    "Energy",
    "Sugars",
    "Sodium",
    "Protein",
    "Fiber",
    "FruitsVegetablesNuts",
    "SaturatedFat",
];

pub const SYSTEM_INSTRUCTION: &str = r#"You extract structured data from photos of food packaging: the product name, the ingredient list, the nutrition table and a set of health score inputs.

Name:
- Read the product name from the packaging. If it is not visible, infer a likely name.
- Keep it short and simple, two words at most, representative of the product.

Ingredients:
- Find the section labelled "Ingredients" or similar and keep the original order.
- Generalize names: drop marketing terms, quality descriptors, percentages and processing methods.
  "100% whole grain rolled oats" becomes "Rolled Oats", "Organic unbleached wheat flour" becomes "Wheat Flour", "Natural cane sugar" becomes "Sugar", "Sea salt" becomes "Salt".
- Drop values and percentages ("Wheat Flour (63%)" becomes "Wheat Flour").
- Drop bracketed sub-lists, but keep food additive codes such as "Emulsifier (E322)" or "Raising Agent (INS 500(ii))".
- Split compound ingredients into their components when clearly identifiable.
- Capitalize the first letter of each main word.

Nutrition:
- Find the "Nutrition Information" or "Nutritional Facts" table.
- Report values per 100g only. When both "Per Serving" and "Per 100g" columns exist, use "Per 100g". When only per-serving values and a serving size are given, scale them to 100g.
- Use these nutrient names (case-insensitive match): Energy, Protein, Total Fat, Saturated Fat, Carbohydrates, Fiber, Sugars, Calcium, Magnesium, Iron, Zinc, Iodine, Sodium, Potassium, Phosphorus, Copper, Selenium, Vitamin A, Vitamin C, Vitamin D, Vitamin E, Thiamine, Riboflavin, Niacin, Vitamin B6, Folate, Vitamin B12. Keep any other nutrient name as printed.

Health score inputs:
- From the nutrition data report Energy, Sugars, Sodium, Protein, Fiber, FruitsVegetablesNuts (as a percentage) and SaturatedFat.
- Each value is a string with its unit, e.g. "481 kcal" or "9.1 g". Use "0" for anything missing.

OCR noise:
- Correct common misreads such as 'O' for '0' or '1' for 'l', and use context to recover messy text.

Output:
- Return JSON with "name", "ingredients", "nutrition" (objects with "name", "value", "unit") and "healthscore".
- Use empty values ([] or {}) for sections that are missing or unclear.
- If the image is not a food product label, return an "error" field with a short message such as "Invalid product label" and empty values for the other sections."#;

pub const EXTRACTION_PROMPT: &str = r#"Extract the ingredients, nutritional information and health score inputs from this food label image, and determine the product name.

1. Copy numeric values exactly as printed, without rounding.
2. Generalize ingredient names: "100% whole grain rolled oats" is just "Rolled Oats"."#;

/// JSON schema passed as `responseSchema` so the model answers in our shape.
pub fn response_schema() -> Value {
    let healthscore_properties: serde_json::Map<String, Value> = HEALTHSCORE_FIELDS
        .iter()
        .map(|field| {
            (
                field.to_string(),
                json!({ "type": "string", "description": format!("{} value with unit", field) }),
            )
        })
        .collect();

    json!({
        "type": "object",
        "properties": {
            "name": {
                "type": "string",
                "description": "Product name (max 2 words)"
            },
            "ingredients": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of ingredients"
            },
            "nutrition": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Nutrient name" },
                        "value": { "type": "number", "description": "Numeric value exactly as shown on label" },
                        "unit": { "type": "string", "description": "Unit of measurement (e.g., g, mg, kcal)" }
                    },
                    "required": ["name", "value", "unit"]
                }
            },
            "healthscore": {
                "type": "object",
                "properties": healthscore_properties,
                "required": HEALTHSCORE_FIELDS
            }
        },
        "required": ["name", "ingredients", "nutrition", "healthscore"]
    })
}
