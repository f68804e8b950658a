//! Calc Tools CLI
//!
//! Command-line interface for the calculators and the text summarizer.
//! Run without a subcommand to get the interactive menu.

use anyhow::{anyhow, Context, Result};
use calc_tools::app::terminal::Terminal;
use calc_tools::policy::{self, export};
use calc_tools::{render, summarizer, tax, AppConfig, AppState, GeminiClient, PolicyPeriodInput};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "calc-tools")]
#[command(version, about = "ÖTV & KDV splitter, policy period calculator and AI summarizer")]
struct Cli {
    /// JSON config file (falls back to $CALC_TOOLS_CONFIG, then defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Split a tax-inclusive total into base price, ÖTV and KDV
    Tax {
        /// Total amount, e.g. "1.234,56"
        amount: String,
    },

    /// Prorate an amount over the calendar quarters of a policy period
    Policy {
        /// First covered day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Day after the last covered day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Total amount, e.g. "12.000,00"
        #[arg(long)]
        amount: String,

        /// Split each quarter into deductible and non-deductible (KKEG) parts
        #[arg(long)]
        passenger_car: bool,

        /// Round to whole cents that add up to the total
        #[arg(long)]
        reconcile_cents: bool,

        /// Also write the breakdown to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Summarize text from the argument, a file, or stdin
    Summarize {
        /// Text to summarize
        text: Option<String>,

        /// Read the text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Interactive menu
    Menu,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Tax { amount } => run_tax(&config, &amount),
        Command::Policy {
            start,
            end,
            amount,
            passenger_car,
            reconcile_cents,
            csv,
        } => {
            let input = PolicyPeriodInput {
                start: Some(start),
                end: Some(end),
                total_amount: amount,
                is_passenger_car: passenger_car,
            };
            run_policy(&config, &input, reconcile_cents, csv)
        }
        Command::Summarize { text, file } => run_summarize(&config, text, file).await,
        Command::Menu => run_menu(config).await,
    }
}

fn run_tax(config: &AppConfig, amount: &str) -> Result<()> {
    let result = tax::split_tax_input(amount, &config.tax)?;
    print!("{}", render::render_tax(&result, &config.tax));
    Ok(())
}

fn run_policy(
    config: &AppConfig,
    input: &PolicyPeriodInput,
    reconcile_cents: bool,
    csv: Option<PathBuf>,
) -> Result<()> {
    let results = policy::calculate(input, config.deduction_split(), reconcile_cents)?;

    print!(
        "{}",
        render::render_policy_periods(&results, config.deductible_share)
    );

    if let Some(path) = csv {
        export::write_csv_file(&results, &path)
            .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))?;
        println!("\nCSV written to {}", path.display());
    }

    Ok(())
}

async fn run_summarize(
    config: &AppConfig,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let client = GeminiClient::new(config.summarizer.clone())?;
    let summary = summarizer::summarize_text(&client, &text)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    println!("{}", summary);
    Ok(())
}

async fn run_menu(config: AppConfig) -> Result<()> {
    let client = GeminiClient::new(config.summarizer.clone())?;
    let mut state = AppState::new(config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut terminal = Terminal::new(stdin.lock(), stdout.lock());
    terminal
        .run(&mut state, &client)
        .await
        .context("terminal session failed")?;

    Ok(())
}
