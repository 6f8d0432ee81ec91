use anyhow::{Context, Result};
use meal_journal::cli::{parse_args, Command, OutputFormat};
use meal_journal::config::AnalyzerConfig;
use meal_journal::meal_analyzer::{analyze_meal, ImageSource, MealAnalysisRequest};
use meal_journal::report::{render_summary, write_entries_csv};
use meal_journal::Journal;
use tracing_subscriber::EnvFilter;

fn print_journal(journal: &Journal, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", render_summary(&journal.summary(), journal.entries()))
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&journal.summary())
                .context("Failed to encode journal summary")?
        ),
        OutputFormat::Csv => write_entries_csv(journal.entries(), std::io::stdout().lock())
            .context("Failed to write journal entries as CSV")?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("meal_journal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match parse_args().command {
        Command::Summarize { journal, format } => {
            let journal = Journal::load(&journal)
                .await
                .with_context(|| format!("Failed to load journal '{}'", journal.display()))?;
            print_journal(&journal, format)?;
        }
        Command::Analyze {
            image,
            conditions,
            notes,
            journal,
        } => {
            let config = AnalyzerConfig::from_env();
            let request = MealAnalysisRequest {
                image: ImageSource::resolve(&image)
                    .await
                    .with_context(|| format!("Failed to prepare image '{}'", image))?,
                conditions,
                notes,
            };

            let meal = analyze_meal(&request, &config)
                .await
                .context("Meal analysis failed")?;
            println!("{}", serde_json::to_string_pretty(&meal)?);

            if let Some(path) = journal {
                let mut journal = Journal::load(&path)
                    .await
                    .with_context(|| format!("Failed to load journal '{}'", path.display()))?;
                journal.add(meal);
                println!();
                print_journal(&journal, OutputFormat::Text)?;
            }
        }
    }

    Ok(())
}
