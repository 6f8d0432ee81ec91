use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::meal_analysis::{
    parse_journal, HighPurineIngredient, JournalError, MealAnalysis, RiskAssessment,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientTotals {
    pub calories: f64,
    pub protein_grams: f64,
    pub carb_grams: f64,
    pub fat_grams: f64,
    pub sugar_grams: f64,
    pub fiber_grams: f64,
    pub sodium_mg: f64,
    pub purines_mg: f64,
}

impl NutrientTotals {
    fn add_meal(&mut self, meal: &MealAnalysis) {
        let totals = self;
        macro_rules! accumulate {
            ($($field:ident),*) => {
                $( totals.$field += meal.$field; )*
            };
        }
        accumulate!(
            calories,
            protein_grams,
            carb_grams,
            fat_grams,
            sugar_grams,
            fiber_grams,
            sodium_mg,
            purines_mg
        );
    }
}

/// Condition-keyed map that keeps insertion order and serializes as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for ConditionMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> ConditionMap<V> {
    pub fn get(&self, condition: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(name, _)| name == condition)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, condition: &str) -> bool {
        self.get(condition).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Callers insert each condition once.
    fn push(&mut self, condition: String, value: V) {
        self.entries.push((condition, value));
    }
}

impl<V: Serialize> Serialize for ConditionMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (condition, value) in &self.entries {
            map.serialize_entry(condition, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSummary {
    pub totals: NutrientTotals,
    pub unique_ingredients: Vec<String>,
    pub merged_high_purine_ingredients: Vec<HighPurineIngredient>,
    pub conditions_seen: Vec<String>,
    pub risk_by_condition: ConditionMap<RiskAssessment>,
    pub recommendations_by_condition: ConditionMap<Vec<String>>,
}

fn first_seen<'a>(names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Highest-ranked risk any meal reports for `condition`, starting from `Low`
/// with no reason. Equal ranks keep the earlier entry.
fn worst_risk(records: &[MealAnalysis], condition: &str) -> RiskAssessment {
    records
        .iter()
        .filter_map(|record| record.risk_for(condition))
        .fold(RiskAssessment::default(), |worst, candidate| {
            if candidate.level.rank() > worst.level.rank() {
                candidate.clone()
            } else {
                worst
            }
        })
}

fn recommendation_union(records: &[MealAnalysis], condition: &str) -> Vec<String> {
    first_seen(
        records
            .iter()
            .filter_map(|record| record.recommendations_for(condition))
            .flatten(),
    )
}

/// Aggregates a journal of meal analyses into a single summary.
///
/// Only conditions listed in some record's `conditions` get risk and
/// recommendation entries; keys that appear solely inside the per-record maps
/// are ignored. Ingredient and condition names are compared exactly, without
/// case or whitespace normalization.
///
/// # Arguments
/// * `records`: The meals in journal order. Earlier meals win ties.
///
/// # Returns
/// A freshly computed `JournalSummary`. An empty slice yields zero totals and
/// empty collections.
pub fn summarize(records: &[MealAnalysis]) -> JournalSummary {
    let mut totals = NutrientTotals::default();
    for record in records {
        totals.add_meal(record);
    }

    let unique_ingredients = first_seen(records.iter().flat_map(|record| &record.ingredients));

    let mut seen_purine_names = HashSet::new();
    let merged_high_purine_ingredients: Vec<HighPurineIngredient> = records
        .iter()
        .flat_map(|record| &record.high_purine_ingredients)
        .filter(|item| seen_purine_names.insert(item.ingredient.as_str()))
        .cloned()
        .collect();

    let conditions_seen = first_seen(records.iter().flat_map(|record| &record.conditions));

    let mut risk_by_condition = ConditionMap::default();
    let mut recommendations_by_condition = ConditionMap::default();
    for condition in &conditions_seen {
        risk_by_condition.push(condition.clone(), worst_risk(records, condition));
        recommendations_by_condition
            .push(condition.clone(), recommendation_union(records, condition));
    }

    debug!(
        meals = records.len(),
        conditions = conditions_seen.len(),
        ingredients = unique_ingredients.len(),
        "Summarized journal"
    );

    JournalSummary {
        totals,
        unique_ingredients,
        merged_high_purine_ingredients,
        conditions_seen,
        risk_by_condition,
        recommendations_by_condition,
    }
}

/// The meals saved during one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journal {
    entries: Vec<MealAnalysis>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(entries: Vec<MealAnalysis>) -> Self {
        Self { entries }
    }

    /// Reads a JSON array of meal analyses from `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| JournalError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let entries = parse_journal(&raw)?;
        info!(path = %path.display(), meals = entries.len(), "Loaded journal");
        Ok(Self { entries })
    }

    pub fn add(&mut self, meal: MealAnalysis) {
        self.entries.push(meal);
    }

    /// Swaps the meal at `index` for `meal`, returning the old one.
    pub fn replace(&mut self, index: usize, meal: MealAnalysis) -> Option<MealAnalysis> {
        let slot = self.entries.get_mut(index)?;
        Some(std::mem::replace(slot, meal))
    }

    pub fn remove(&mut self, index: usize) -> Option<MealAnalysis> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn entries(&self) -> &[MealAnalysis] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> JournalSummary {
        summarize(&self.entries)
    }
}
