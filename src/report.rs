use std::io;

use crate::journal::JournalSummary;
use crate::meal_analysis::MealAnalysis;
use crate::nutrient_levels::meal_bands;

// Totals are shown in whole units.
fn whole(value: f64) -> i64 {
    value.round() as i64
}

/// Renders the journal view: totals, ingredients, health considerations,
/// high-purine ingredients and the individual meals.
pub fn render_summary(summary: &JournalSummary, entries: &[MealAnalysis]) -> String {
    if entries.is_empty() {
        return "No meal data available".to_string();
    }

    let totals = &summary.totals;
    let mut lines = vec![
        "Total Nutrition Summary".to_string(),
        format!("  Calories: {} kcal", whole(totals.calories)),
        format!("  Protein: {}g", whole(totals.protein_grams)),
        format!("  Carbs: {}g", whole(totals.carb_grams)),
        format!("  Fat: {}g", whole(totals.fat_grams)),
        format!(
            "  Sugar: {}g | Fiber: {}g | Sodium: {} mg | Purines: {} mg",
            whole(totals.sugar_grams),
            whole(totals.fiber_grams),
            whole(totals.sodium_mg),
            whole(totals.purines_mg)
        ),
        String::new(),
        "All Ingredients".to_string(),
    ];
    if summary.unique_ingredients.is_empty() {
        lines.push("  (none reported)".to_string());
    } else {
        lines.push(format!("  {}", summary.unique_ingredients.join(", ")));
    }

    lines.push(String::new());
    lines.push("Health Considerations".to_string());
    if summary.risk_by_condition.is_empty() {
        lines.push("  (no conditions selected)".to_string());
    }
    for (condition, risk) in summary.risk_by_condition.iter() {
        lines.push(format!("  {}: {} Risk", condition, risk.level));
        if !risk.reason.is_empty() {
            lines.push(format!("    {}", risk.reason));
        }
        let recommendations = summary
            .recommendations_by_condition
            .get(condition)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if !recommendations.is_empty() {
            lines.push("    Recommendations:".to_string());
            lines.extend(recommendations.iter().map(|rec| format!("      - {}", rec)));
        }
    }

    if !summary.merged_high_purine_ingredients.is_empty() {
        lines.push(String::new());
        lines.push("High Purine Ingredients".to_string());
        lines.extend(
            summary
                .merged_high_purine_ingredients
                .iter()
                .map(|item| format!("  {}: {} mg purines", item.ingredient, item.purine_level)),
        );
    }

    lines.push(String::new());
    lines.push("Individual Meal Entries".to_string());
    for (index, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "  Meal {}: {} kcal | Protein {}g | Carbs {}g | Fat {}g",
            index + 1,
            entry.calories,
            entry.protein_grams,
            entry.carb_grams,
            entry.fat_grams
        ));
        let bands: Vec<String> = meal_bands(entry)
            .into_iter()
            .map(|(nutrient, value, band)| {
                format!("{} {}{} ({})", nutrient.label(), value, nutrient.unit(), band)
            })
            .collect();
        lines.push(format!("    {}", bands.join(" | ")));
    }

    lines.join("\n")
}

const CSV_HEADER: [&str; 11] = [
    "meal",
    "calories",
    "protein_g",
    "carbs_g",
    "fat_g",
    "sugar_g",
    "fiber_g",
    "sodium_mg",
    "purines_mg",
    "conditions",
    "ingredients",
];

/// Writes one CSV row per meal. List columns are joined with `"; "`.
pub fn write_entries_csv<W: io::Write>(
    entries: &[MealAnalysis],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for (index, entry) in entries.iter().enumerate() {
        csv_writer.write_record([
            (index + 1).to_string(),
            entry.calories.to_string(),
            entry.protein_grams.to_string(),
            entry.carb_grams.to_string(),
            entry.fat_grams.to_string(),
            entry.sugar_grams.to_string(),
            entry.fiber_grams.to_string(),
            entry.sodium_mg.to_string(),
            entry.purines_mg.to_string(),
            entry.conditions.join("; "),
            entry.ingredients.join("; "),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
