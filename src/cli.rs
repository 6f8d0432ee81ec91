use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize a journal file (a JSON array of meal analyses)
    Summarize {
        /// Path to the journal JSON file
        #[arg(short, long)]
        journal: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Analyze a meal photo with the vision model
    Analyze {
        /// Image URL or path to a local image file
        #[arg(short, long)]
        image: String,
        /// Health condition to tailor the analysis to (repeatable)
        #[arg(short, long = "condition")]
        conditions: Vec<String>,
        /// Free-text notes about the meal
        #[arg(short, long)]
        notes: Option<String>,
        /// Journal to summarize together with the new meal
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_defaults_to_text() {
        let cli =
            Cli::try_parse_from(["meal_journal", "summarize", "--journal", "today.json"]).unwrap();
        match cli.command {
            Command::Summarize { journal, format } => {
                assert_eq!(journal, PathBuf::from("today.json"));
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_analyze_collects_repeated_conditions() {
        let cli = Cli::try_parse_from([
            "meal_journal",
            "analyze",
            "-i",
            "lunch.jpg",
            "-c",
            "gout",
            "--condition",
            "diabetes",
            "--notes",
            "no rice",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                image,
                conditions,
                notes,
                journal,
            } => {
                assert_eq!(image, "lunch.jpg");
                assert_eq!(conditions, vec!["gout", "diabetes"]);
                assert_eq!(notes.as_deref(), Some("no rice"));
                assert!(journal.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result =
            Cli::try_parse_from(["meal_journal", "summarize", "-j", "a.json", "-f", "xml"]);
        assert!(result.is_err());
    }
}
