//! Period-by-period repayment schedule derived from loan terms and
//! recorded repayments, filtered and paginated in memory.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar;
use crate::error::ChitLoanError;
use crate::repayment::overdue::repayment_warnings;
use crate::repayment::reconcile::{self, Settlement};
use crate::types::{with_metadata, ComputationOutput, Loan, Money, PeriodStatus, Repayment, RepaymentType};
use crate::ChitLoanResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Listing parameters for a schedule page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PeriodStatus>,
    /// List every period up to maturity instead of stopping at the next one due.
    #[serde(default)]
    pub include_all: bool,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ScheduleQuery {
    fn default() -> Self {
        ScheduleQuery {
            page: default_page(),
            page_size: default_page_size(),
            status: None,
            include_all: false,
        }
    }
}

/// A loan snapshot, its repayments and the listing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub loan: Loan,
    #[serde(default)]
    pub repayments: Vec<Repayment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub query: ScheduleQuery,
}

/// One scheduled installment with its reconciliation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedPeriod {
    pub period: u32,
    pub due_date: NaiveDate,
    /// Full installment due for the period.
    pub expected_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// Sum of every repayment recorded against the period.
    pub amount_paid: Money,
    /// This period's contribution to the loan's overdue amount.
    pub overdue_amount: Money,
    pub status: PeriodStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_paid_date: Option<NaiveDate>,
}

/// One page of derived periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePage {
    pub items: Vec<DerivedPeriod>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u32,
    pub total_pages: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive every period of `loan` and classify it as of `as_of`.
///
/// Loans that do not accrue (closed, or `current_month` zero) have no period
/// counted as due, so unpaid periods show as pending or upcoming.
pub fn derive_periods(
    loan: &Loan,
    repayments: &[Repayment],
    as_of: NaiveDate,
) -> ChitLoanResult<Vec<DerivedPeriod>> {
    derive_periods_through(loan, repayments, as_of, loan.duration)
}

/// Periods `1..=last` of `loan`, with `last` capped at the duration.
fn derive_periods_through(
    loan: &Loan,
    repayments: &[Repayment],
    as_of: NaiveDate,
    last: u32,
) -> ChitLoanResult<Vec<DerivedPeriod>> {
    reconcile::validate_loan_terms(loan)?;
    let last = last.min(loan.duration);

    let expected = if loan.is_accruing() {
        reconcile::expected_periods(loan, as_of)
    } else {
        0
    };
    let slice = reconcile::principal_portion(loan)?;
    let own: Vec<&Repayment> = reconcile::for_loan(loan, repayments).collect();
    let latest = reconcile::latest_by_period(own.iter().copied());

    let mut periods = Vec::with_capacity(last as usize);
    for period in 1..=last {
        let authoritative = latest.get(&period).copied();
        let settlement = Settlement::of(authoritative);
        let is_due = period <= expected;

        let status = match settlement {
            Settlement::Settled => PeriodStatus::Paid,
            Settlement::InterestOnly => PeriodStatus::InterestOnlyPaid,
            Settlement::Unpaid if is_due => PeriodStatus::Missed,
            Settlement::Unpaid if period == expected + 1 => PeriodStatus::Pending,
            Settlement::Unpaid => PeriodStatus::Upcoming,
        };

        let principal_portion =
            if loan.repayment_type == RepaymentType::Weekly && loan.duration > 1 && period == loan.duration {
                Decimal::ZERO
            } else {
                slice
            };

        let amount_paid = own
            .iter()
            .filter(|r| r.period == period)
            .try_fold(Decimal::ZERO, |total, r| reconcile::accumulate(total, r.amount, "amount"))?;

        periods.push(DerivedPeriod {
            period,
            due_date: calendar::due_date(loan.repayment_type, loan.disbursement_date, period)?,
            expected_amount: loan.installment_amount,
            principal_portion,
            interest_portion: loan.interest_rate,
            amount_paid,
            overdue_amount: if is_due {
                settlement.shortfall(loan.installment_amount, slice)
            } else {
                Decimal::ZERO
            },
            status,
            last_paid_date: authoritative.map(|r| r.paid_date),
        });
    }

    Ok(periods)
}

/// Build one page of the dynamic schedule.
///
/// Without `include_all` the listing stops at the first period not yet due.
/// The status filter is applied before pagination.
pub fn build_dynamic_schedule(
    loan: &Loan,
    repayments: &[Repayment],
    query: &ScheduleQuery,
    as_of: NaiveDate,
) -> ChitLoanResult<SchedulePage> {
    validate_query(query)?;

    let last = if query.include_all {
        loan.duration
    } else if loan.is_accruing() {
        reconcile::expected_periods(loan, as_of).saturating_add(1)
    } else {
        1
    };
    let mut periods = derive_periods_through(loan, repayments, as_of, last)?;

    if let Some(status) = query.status {
        periods.retain(|p| p.status == status);
    }

    let total_count = periods.len() as u32;
    let total_pages = total_count.div_ceil(query.page_size);
    let offset = (query.page as usize - 1) * query.page_size as usize;

    let items = periods
        .into_iter()
        .skip(offset)
        .take(query.page_size as usize)
        .collect();

    Ok(SchedulePage {
        items,
        page: query.page,
        page_size: query.page_size,
        total_count,
        total_pages,
    })
}

/// Schedule page wrapped in the standard output envelope.
pub fn schedule_report(input: &ScheduleInput) -> ChitLoanResult<ComputationOutput<SchedulePage>> {
    let start = Instant::now();
    let as_of = input.as_of.unwrap_or_else(|| Local::now().date_naive());
    let warnings = repayment_warnings(&input.loan, &input.repayments);

    let page = build_dynamic_schedule(&input.loan, &input.repayments, &input.query, as_of)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Dynamic repayment schedule — per-period reconciliation, filtered and paginated",
        &serde_json::json!({
            "loan_id": input.loan.id,
            "as_of": as_of.to_string(),
            "duration": input.loan.duration,
            "repayment_type": input.loan.repayment_type,
            "query": input.query,
        }),
        warnings,
        elapsed,
        page,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_query(query: &ScheduleQuery) -> ChitLoanResult<()> {
    if query.page == 0 {
        return Err(ChitLoanError::validation("page", "Page numbers start at 1"));
    }
    if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
        return Err(ChitLoanError::validation(
            "page_size",
            format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
