use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde_json::Value;

use chitloan_core::repayment::overdue::{self, OverdueInput};
use chitloan_core::repayment::schedule::{self, ScheduleInput};
use chitloan_core::repayment::summary;
use chitloan_core::PeriodStatus;

use crate::input;

/// Arguments for an overdue assessment
#[derive(Args)]
pub struct OverdueArgs {
    /// Path to JSON input file (loan, repayments, optional as_of)
    #[arg(long)]
    pub input: Option<String>,

    /// Reference date, overrides the input's as_of (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the dynamic repayment schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (loan, repayments, optional as_of and query)
    #[arg(long)]
    pub input: Option<String>,

    /// Reference date, overrides the input's as_of (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<u32>,

    /// Periods per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Only list periods with this status
    #[arg(long)]
    pub status: Option<StatusArg>,

    /// List every period up to maturity
    #[arg(long)]
    pub include_all: bool,
}

/// Arguments for a loan summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to JSON input file (loan, repayments, optional as_of)
    #[arg(long)]
    pub input: Option<String>,

    /// Reference date, overrides the input's as_of (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Paid,
    InterestOnlyPaid,
    Missed,
    Pending,
    Upcoming,
}

impl From<StatusArg> for PeriodStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Paid => PeriodStatus::Paid,
            StatusArg::InterestOnlyPaid => PeriodStatus::InterestOnlyPaid,
            StatusArg::Missed => PeriodStatus::Missed,
            StatusArg::Pending => PeriodStatus::Pending,
            StatusArg::Upcoming => PeriodStatus::Upcoming,
        }
    }
}

pub fn run_overdue(args: OverdueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut overdue_input: OverdueInput =
        input::stdin::load_input(args.input.as_deref(), "overdue assessment")?;
    if args.as_of.is_some() {
        overdue_input.as_of = args.as_of;
    }
    let result = overdue::assess_overdue(&overdue_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut schedule_input: ScheduleInput =
        input::stdin::load_input(args.input.as_deref(), "schedule listing")?;
    if args.as_of.is_some() {
        schedule_input.as_of = args.as_of;
    }

    let query = &mut schedule_input.query;
    if let Some(page) = args.page {
        query.page = page;
    }
    if let Some(page_size) = args.page_size {
        query.page_size = page_size;
    }
    if let Some(status) = args.status {
        query.status = Some(status.into());
    }
    if args.include_all {
        query.include_all = true;
    }

    let result = schedule::schedule_report(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut summary_input: OverdueInput =
        input::stdin::load_input(args.input.as_deref(), "loan summary")?;
    if args.as_of.is_some() {
        summary_input.as_of = args.as_of;
    }
    let result = summary::summary_report(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}
