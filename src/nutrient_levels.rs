use std::fmt;

use crate::meal_analysis::MealAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandedNutrient {
    Sugar,
    Fiber,
    Sodium,
    Purines,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutrientBand {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl fmt::Display for NutrientBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NutrientBand::Low => "Low",
            NutrientBand::Moderate => "Moderate",
            NutrientBand::High => "High",
            NutrientBand::VeryHigh => "Very High",
        };
        f.write_str(label)
    }
}

impl BandedNutrient {
    pub const ALL: [BandedNutrient; 4] = [
        BandedNutrient::Sugar,
        BandedNutrient::Fiber,
        BandedNutrient::Sodium,
        BandedNutrient::Purines,
    ];

    /// Per-meal band limits. Sugar and fiber in grams, sodium and purines in mg.
    pub fn thresholds(self) -> Thresholds {
        match self {
            BandedNutrient::Sugar => Thresholds {
                low: 10.0,
                moderate: 25.0,
                high: 50.0,
            },
            BandedNutrient::Fiber => Thresholds {
                low: 3.0,
                moderate: 5.0,
                high: 10.0,
            },
            BandedNutrient::Sodium => Thresholds {
                low: 500.0,
                moderate: 1500.0,
                high: 2300.0,
            },
            BandedNutrient::Purines => Thresholds {
                low: 100.0,
                moderate: 200.0,
                high: 300.0,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BandedNutrient::Sugar => "Sugar",
            BandedNutrient::Fiber => "Fiber",
            BandedNutrient::Sodium => "Sodium",
            BandedNutrient::Purines => "Purines",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            BandedNutrient::Sugar | BandedNutrient::Fiber => "g",
            BandedNutrient::Sodium | BandedNutrient::Purines => "mg",
        }
    }

    pub fn value_in(self, meal: &MealAnalysis) -> f64 {
        match self {
            BandedNutrient::Sugar => meal.sugar_grams,
            BandedNutrient::Fiber => meal.fiber_grams,
            BandedNutrient::Sodium => meal.sodium_mg,
            BandedNutrient::Purines => meal.purines_mg,
        }
    }

    /// Bands are inclusive at their upper limit.
    pub fn classify(self, value: f64) -> NutrientBand {
        let limits = self.thresholds();
        if value <= limits.low {
            NutrientBand::Low
        } else if value <= limits.moderate {
            NutrientBand::Moderate
        } else if value <= limits.high {
            NutrientBand::High
        } else {
            NutrientBand::VeryHigh
        }
    }
}

/// Bands for every tracked nutrient of one meal, in `BandedNutrient::ALL` order.
pub fn meal_bands(meal: &MealAnalysis) -> Vec<(BandedNutrient, f64, NutrientBand)> {
    BandedNutrient::ALL
        .iter()
        .map(|&nutrient| {
            let value = nutrient.value_in(meal);
            (nutrient, value, nutrient.classify(value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges_are_inclusive() {
        assert_eq!(BandedNutrient::Sugar.classify(10.0), NutrientBand::Low);
        assert_eq!(BandedNutrient::Sugar.classify(10.5), NutrientBand::Moderate);
        assert_eq!(BandedNutrient::Sugar.classify(50.0), NutrientBand::High);
        assert_eq!(BandedNutrient::Sugar.classify(50.1), NutrientBand::VeryHigh);
    }

    #[test]
    fn test_sodium_and_purine_bands() {
        assert_eq!(BandedNutrient::Sodium.classify(0.0), NutrientBand::Low);
        assert_eq!(BandedNutrient::Sodium.classify(1600.0), NutrientBand::High);
        assert_eq!(BandedNutrient::Purines.classify(150.0), NutrientBand::Moderate);
        assert_eq!(BandedNutrient::Purines.classify(480.0), NutrientBand::VeryHigh);
    }

    #[test]
    fn test_meal_bands_reads_each_field() {
        let meal = MealAnalysis {
            sugar_grams: 30.0,
            fiber_grams: 2.0,
            sodium_mg: 2400.0,
            purines_mg: 250.0,
            ..Default::default()
        };
        let bands: Vec<_> = meal_bands(&meal).into_iter().map(|(n, _, band)| (n, band)).collect();
        assert_eq!(
            bands,
            vec![
                (BandedNutrient::Sugar, NutrientBand::High),
                (BandedNutrient::Fiber, NutrientBand::Low),
                (BandedNutrient::Sodium, NutrientBand::VeryHigh),
                (BandedNutrient::Purines, NutrientBand::High),
            ]
        );
        assert_eq!(NutrientBand::VeryHigh.to_string(), "Very High");
    }
}
