// pagekit-eval: evaluation harness for browser-automation scenarios
// `run` executes the scenario matrix and writes the summary artifact;
// `gate` turns that artifact into a CI pass/fail exit code.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use pagekit_eval::config::{DEFAULT_SUMMARY_PATH, RunConfig};
use pagekit_eval::{gate, runner, scenarios};

#[derive(Parser)]
#[command(name = "pagekit-eval")]
#[command(about = "Evaluate browser-automation scenarios across LLM backends")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenario matrix and write the summary artifact
    Run {
        /// Restrict the plan to a single scenario name. A name that
        /// matches nothing yields an empty run, not an error.
        scenario: Option<String>,
    },
    /// Check the summary artifact against the accuracy threshold
    Gate {
        /// Path to the summary artifact
        #[arg(long, default_value = DEFAULT_SUMMARY_PATH)]
        summary: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scenario } => {
            let config = RunConfig::from_env();
            let registry = scenarios::builtin_registry(&config);
            runner::run_eval(&config, &registry, scenario).await?;
        }
        Commands::Gate { summary } => {
            let verdict = gate::evaluate_gate(&summary);
            println!("{}", verdict.describe());
            std::process::exit(verdict.exit_code());
        }
    }

    Ok(())
}
