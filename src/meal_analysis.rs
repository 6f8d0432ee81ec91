use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Failed to read journal file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid meal analysis JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Meal analysis must be a JSON object")]
    NotAnObject,
    #[error("Journal must be a JSON array of meal analyses")]
    NotAnArray,
}

/// Severity the model assigns to a meal for one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn rank(self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Moderate => 2,
            RiskLevel::High => 3,
        }
    }

    /// Case-insensitive match against `Low`, `Moderate` and `High`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "moderate" => Some(RiskLevel::Moderate),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighPurineIngredient {
    pub ingredient: String,
    pub purine_level: f64, // mg per 100g
}

/// One analyzed meal as returned by the vision model.
///
/// Every field is optional on the wire. Deserialization never rejects a field
/// for having the wrong shape; it falls back to zero or empty instead. Both the
/// journal's own camelCase names and the model's tool-call names (`kcal`,
/// `sicknesses`, `riskLevels`, ...) are accepted. When a record carries both,
/// the journal name wins unless its value is `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysis {
    pub conditions: Vec<String>,
    pub calories: f64,
    pub protein_grams: f64,
    pub carb_grams: f64,
    pub fat_grams: f64,
    pub sugar_grams: f64,
    pub fiber_grams: f64,
    pub sodium_mg: f64,
    pub purines_mg: f64,
    pub ingredients: Vec<String>,
    pub high_purine_ingredients: Vec<HighPurineIngredient>,
    pub risk_by_condition: BTreeMap<String, RiskAssessment>,
    pub recommendations_by_condition: BTreeMap<String, Vec<String>>,
}

static NULL: Value = Value::Null;

/// Looks up `name`, then `alias`, skipping keys whose value is `null`.
fn field<'a>(fields: &'a Map<String, Value>, name: &str, alias: Option<&str>) -> &'a Value {
    std::iter::once(name)
        .chain(alias)
        .filter_map(|key| fields.get(key))
        .find(|value| !value.is_null())
        .unwrap_or(&NULL)
}

impl MealAnalysis {
    fn from_fields(fields: &Map<String, Value>) -> Self {
        let number = |name: &str, alias: &str| lenient::number(field(fields, name, Some(alias)));

        Self {
            conditions: lenient::strings(field(fields, "conditions", Some("sicknesses"))),
            calories: number("calories", "kcal"),
            protein_grams: number("proteinGrams", "protein"),
            carb_grams: number("carbGrams", "carbs"),
            fat_grams: number("fatGrams", "fat"),
            sugar_grams: number("sugarGrams", "sugar"),
            fiber_grams: number("fiberGrams", "fiber"),
            sodium_mg: number("sodiumMg", "sodium"),
            purines_mg: number("purinesMg", "purines"),
            ingredients: lenient::strings(field(fields, "ingredients", None)),
            high_purine_ingredients: lenient::purine_list(field(
                fields,
                "highPurineIngredients",
                None,
            )),
            risk_by_condition: lenient::risk_map(field(
                fields,
                "riskByCondition",
                Some("riskLevels"),
            )),
            recommendations_by_condition: lenient::recommendation_map(field(
                fields,
                "recommendationsByCondition",
                Some("recommendations"),
            )),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, JournalError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, JournalError> {
        match value {
            Value::Object(fields) => Ok(Self::from_fields(&fields)),
            _ => Err(JournalError::NotAnObject),
        }
    }

    pub fn risk_for(&self, condition: &str) -> Option<&RiskAssessment> {
        self.risk_by_condition.get(condition)
    }

    pub fn recommendations_for(&self, condition: &str) -> Option<&[String]> {
        self.recommendations_by_condition
            .get(condition)
            .map(Vec::as_slice)
    }
}

impl<'de> Deserialize<'de> for MealAnalysis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(fields) => Ok(Self::from_fields(&fields)),
            _ => Err(D::Error::custom("meal analysis must be a JSON object")),
        }
    }
}

/// Parses a JSON array of meal analyses, e.g. the contents of a journal file.
pub fn parse_journal(raw: &str) -> Result<Vec<MealAnalysis>, JournalError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(JournalError::NotAnArray);
    };
    items.into_iter().map(MealAnalysis::from_json_value).collect()
}

mod lenient {
    use super::{HighPurineIngredient, RiskAssessment, RiskLevel};
    use serde_json::Value;
    use std::collections::BTreeMap;

    pub(super) fn number(value: &Value) -> f64 {
        match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub(super) fn strings(value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect(),
            Value::String(s) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub(super) fn purine_list(value: &Value) -> Vec<HighPurineIngredient> {
        let Value::Array(items) = value else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| {
                let ingredient = item.get("ingredient")?.as_str()?;
                Some(HighPurineIngredient {
                    ingredient: ingredient.to_owned(),
                    purine_level: item.get("purineLevel").map(number).unwrap_or(0.0),
                })
            })
            .collect()
    }

    /// Accepts `{"gout": "High"}` as well as `{"gout": {"level": "High", "reason": "..."}}`.
    pub(super) fn risk_map(value: &Value) -> BTreeMap<String, RiskAssessment> {
        let Value::Object(entries) = value else {
            return BTreeMap::new();
        };
        let mut risks = BTreeMap::new();
        for (condition, raw) in entries {
            let (level, reason) = match raw {
                Value::String(level) => (level.as_str(), ""),
                Value::Object(fields) => (
                    fields.get("level").and_then(Value::as_str).unwrap_or_default(),
                    fields.get("reason").and_then(Value::as_str).unwrap_or_default(),
                ),
                _ => ("", ""),
            };
            match RiskLevel::parse(level) {
                Some(level) => {
                    risks.insert(
                        condition.clone(),
                        RiskAssessment {
                            level,
                            reason: reason.to_owned(),
                        },
                    );
                }
                None => tracing::warn!(
                    condition = %condition,
                    raw_level = level,
                    "Dropping risk entry with unrecognised level"
                ),
            }
        }
        risks
    }

    pub(super) fn recommendation_map(value: &Value) -> BTreeMap<String, Vec<String>> {
        let Value::Object(entries) = value else {
            return BTreeMap::new();
        };
        entries
            .iter()
            .map(|(condition, raw)| (condition.clone(), strings(raw)))
            .collect()
    }
}
