pub mod api_connection;
pub mod cli;
pub mod config;
pub mod journal;
pub mod meal_analysis;
pub mod meal_analyzer;
pub mod nutrient_levels;
pub mod report;

pub use journal::{summarize, Journal, JournalSummary};
pub use meal_analysis::{JournalError, MealAnalysis, RiskLevel};
