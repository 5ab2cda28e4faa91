mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::ledger::{LedgerScheduleArgs, RecordPaymentArgs, RefreshArgs, SweepArgs};
use commands::loan::{OverdueArgs, ScheduleArgs, SummaryArgs};

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "CHITLOAN_LOG";

/// Loan repayment schedules and overdue tracking
#[derive(Parser)]
#[command(
    name = "chitloan",
    version,
    about = "Loan repayment schedules and overdue tracking",
    long_about = "Computes repayment schedules, overdue amounts and missed-payment counts \
                  for microfinance loans with decimal precision. Works on single loan \
                  snapshots or on a ledger file of loans and repayments."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine activity to stderr (overridden by CHITLOAN_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Overdue amount and missed payments for a loan snapshot
    Overdue(OverdueArgs),
    /// Period-by-period repayment schedule for a loan snapshot
    Schedule(ScheduleArgs),
    /// Repayment totals for a loan snapshot
    Summary(SummaryArgs),
    /// Record a repayment in a ledger file
    RecordPayment(RecordPaymentArgs),
    /// Recompute and store one loan's overdue fields in a ledger file
    Refresh(RefreshArgs),
    /// Schedule of a loan stored in a ledger file
    LedgerSchedule(LedgerScheduleArgs),
    /// Recompute the overdue fields of every active loan in a ledger file
    Sweep(SweepArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Overdue(args) => commands::loan::run_overdue(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Summary(args) => commands::loan::run_summary(args),
        Commands::RecordPayment(args) => commands::ledger::run_record_payment(args),
        Commands::Refresh(args) => commands::ledger::run_refresh(args),
        Commands::LedgerSchedule(args) => commands::ledger::run_ledger_schedule(args),
        Commands::Sweep(args) => commands::ledger::run_sweep(args),
        Commands::Version => {
            println!("chitloan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
