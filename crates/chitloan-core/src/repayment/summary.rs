//! Repayment totals for one loan, derived from the same period
//! classification as the schedule listing.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::repayment::overdue::{compute_overdue, repayment_warnings, OverdueInput, OverdueSummary};
use crate::repayment::reconcile;
use crate::repayment::schedule::derive_periods;
use crate::types::{with_metadata, ComputationOutput, Loan, Money, PeriodStatus, Repayment, RowId};
use crate::error::ChitLoanError;
use crate::ChitLoanResult;

/// Per-loan totals shown next to the overdue figure in listings and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub loan_id: RowId,
    pub total_paid: Money,
    /// Principal slices of periods settled in full.
    pub principal_repaid: Money,
    /// Flat interest of every serviced period, full or interest-only.
    pub interest_collected: Money,
    pub periods_paid: u32,
    pub periods_interest_only: u32,
    pub expected_periods: u32,
    /// Principal minus principal repaid, never negative.
    pub remaining_amount: Money,
    /// Due date of the earliest period not settled in full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
    pub overdue: OverdueSummary,
    /// Share of periods settled in full, as a percentage with two decimals.
    pub completion_pct: Decimal,
}

pub fn summarize_loan(
    loan: &Loan,
    repayments: &[Repayment],
    as_of: NaiveDate,
) -> ChitLoanResult<LoanSummary> {
    let periods = derive_periods(loan, repayments, as_of)?;
    let overdue = compute_overdue(loan, repayments, as_of)?;

    let mut principal_repaid = Decimal::ZERO;
    let mut periods_paid = 0u32;
    let mut periods_interest_only = 0u32;

    for p in &periods {
        match p.status {
            PeriodStatus::Paid => {
                principal_repaid = reconcile::accumulate(principal_repaid, p.principal_portion, "amount")?;
                periods_paid += 1;
            }
            PeriodStatus::InterestOnlyPaid => periods_interest_only += 1,
            _ => {}
        }
    }

    let total_paid = reconcile::for_loan(loan, repayments)
        .try_fold(Decimal::ZERO, |total, r| reconcile::accumulate(total, r.amount, "amount"))?;
    let interest_collected = loan
        .interest_rate
        .checked_mul(Decimal::from(periods_paid + periods_interest_only))
        .ok_or_else(|| {
            ChitLoanError::validation("interest_rate", "Interest collected exceeds the representable amount range")
        })?;
    let remaining_amount = (loan.amount - principal_repaid).max(Decimal::ZERO);
    let next_due_date = periods
        .iter()
        .find(|p| p.status != PeriodStatus::Paid)
        .map(|p| p.due_date);
    let completion_pct =
        (Decimal::from(periods_paid) / Decimal::from(loan.duration) * dec!(100)).round_dp(2);

    Ok(LoanSummary {
        loan_id: loan.id,
        total_paid,
        principal_repaid,
        interest_collected,
        periods_paid,
        periods_interest_only,
        expected_periods: overdue.expected_periods,
        remaining_amount,
        next_due_date,
        overdue,
        completion_pct,
    })
}

/// Loan summary wrapped in the standard output envelope.
pub fn summary_report(input: &OverdueInput) -> ChitLoanResult<ComputationOutput<LoanSummary>> {
    let start = Instant::now();
    let as_of = input.as_of.unwrap_or_else(|| Local::now().date_naive());
    let warnings = repayment_warnings(&input.loan, &input.repayments);

    let summary = summarize_loan(&input.loan, &input.repayments, as_of)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan summary — settled principal, serviced interest and overdue position",
        &serde_json::json!({
            "loan_id": input.loan.id,
            "as_of": as_of.to_string(),
            "amount": input.loan.amount.to_string(),
            "duration": input.loan.duration,
        }),
        warnings,
        elapsed,
        summary,
    ))
}
