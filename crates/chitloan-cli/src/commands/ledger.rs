use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use chitloan_core::ledger::{self, InMemoryLedger};
use chitloan_core::repayment::payments::RecordPaymentRequest;
use chitloan_core::repayment::schedule::{ScheduleQuery, DEFAULT_PAGE_SIZE};
use chitloan_core::PaymentType;

use crate::commands::loan::StatusArg;
use crate::input;

/// Arguments for recording a repayment into a ledger file
#[derive(Args)]
pub struct RecordPaymentArgs {
    /// Path to the ledger file (.json, .yaml or .yml)
    #[arg(long)]
    pub ledger: String,

    /// Loan the repayment belongs to
    #[arg(long)]
    pub loan_id: u64,

    /// Scheduled period the repayment settles
    #[arg(long)]
    pub period: Option<u32>,

    /// Amount paid
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Date the repayment was made (YYYY-MM-DD)
    #[arg(long)]
    pub paid_date: Option<NaiveDate>,

    /// What the repayment covered
    #[arg(long, value_enum, default_value = "full")]
    pub payment_type: PaymentTypeArg,
}

/// Arguments for recomputing one loan's overdue fields
#[derive(Args)]
pub struct RefreshArgs {
    /// Path to the ledger file (.json, .yaml or .yml)
    #[arg(long)]
    pub ledger: String,

    /// Loan to refresh
    #[arg(long)]
    pub loan_id: u64,

    /// Reference date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for listing a stored loan's schedule
#[derive(Args)]
pub struct LedgerScheduleArgs {
    /// Path to the ledger file (.json, .yaml or .yml)
    #[arg(long)]
    pub ledger: String,

    /// Loan to list
    #[arg(long)]
    pub loan_id: u64,

    /// Reference date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Periods per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Only list periods with this status
    #[arg(long)]
    pub status: Option<StatusArg>,

    /// List every period up to maturity
    #[arg(long)]
    pub include_all: bool,
}

/// Arguments for refreshing every active loan
#[derive(Args)]
pub struct SweepArgs {
    /// Path to the ledger file (.json, .yaml or .yml)
    #[arg(long)]
    pub ledger: String,

    /// Reference date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Report without writing the refreshed fields back
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaymentTypeArg {
    Full,
    InterestOnly,
}

impl From<PaymentTypeArg> for PaymentType {
    fn from(arg: PaymentTypeArg) -> Self {
        match arg {
            PaymentTypeArg::Full => PaymentType::Full,
            PaymentTypeArg::InterestOnly => PaymentType::InterestOnly,
        }
    }
}

fn today_or(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

pub fn run_record_payment(args: RecordPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store: InMemoryLedger = input::file::read_document(&args.ledger)?;
    let request = RecordPaymentRequest {
        period: args.period,
        amount: args.amount,
        paid_date: args.paid_date,
        payment_type: Some(args.payment_type.into()),
    };

    let repayment = ledger::record_payment(&mut store, args.loan_id, &request)?;
    input::file::write_document(&args.ledger, &store)?;
    Ok(serde_json::json!({ "result": repayment }))
}

pub fn run_refresh(args: RefreshArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store: InMemoryLedger = input::file::read_document(&args.ledger)?;
    let summary = ledger::refresh_overdue(&mut store, args.loan_id, today_or(args.as_of))?;
    input::file::write_document(&args.ledger, &store)?;
    Ok(serde_json::json!({ "result": summary }))
}

pub fn run_ledger_schedule(args: LedgerScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let store: InMemoryLedger = input::file::read_document(&args.ledger)?;
    let query = ScheduleQuery {
        page: args.page,
        page_size: args.page_size,
        status: args.status.map(Into::into),
        include_all: args.include_all,
    };
    let page = ledger::fetch_schedule(&store, args.loan_id, &query, today_or(args.as_of))?;
    Ok(serde_json::json!({ "result": page }))
}

pub fn run_sweep(args: SweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut store: InMemoryLedger = input::file::read_document(&args.ledger)?;
    let report = ledger::sweep_overdue(&mut store, today_or(args.as_of));
    if !args.dry_run {
        input::file::write_document(&args.ledger, &store)?;
    }
    let mut warnings = Vec::new();
    for failure in &report.failures {
        warnings.push(format!("loan {}: {}", failure.loan_id, failure.error));
    }
    Ok(serde_json::json!({ "result": report, "warnings": warnings }))
}
