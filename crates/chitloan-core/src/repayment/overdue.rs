//! Overdue amount and missed-payment count for a loan as of a date.
//!
//! The figures are a pure function of the loan terms, its repayment rows and
//! the reference date. They are recomputed from scratch on every call and
//! stored back over the previous values, never adjusted incrementally.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calendar;
use crate::repayment::reconcile::{self, Settlement};
use crate::types::{with_metadata, ComputationOutput, Loan, Money, Repayment};
use crate::ChitLoanResult;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// A loan snapshot together with its repayment rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueInput {
    pub loan: Loan,
    #[serde(default)]
    pub repayments: Vec<Repayment>,
    /// Reference date; today's local date when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

/// The two derived loan fields plus the period count they were based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueSummary {
    pub overdue_amount: Money,
    pub missed_payments: u32,
    /// Periods that should have been paid by the reference date.
    pub expected_periods: u32,
}

impl OverdueSummary {
    pub const NONE: OverdueSummary = OverdueSummary {
        overdue_amount: Decimal::ZERO,
        missed_payments: 0,
        expected_periods: 0,
    };
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the overdue amount and missed-payment count of `loan` as of `as_of`.
///
/// Loans that are not active, or whose `current_month` is still zero, owe
/// nothing. A loan with no repayments whose `next_payment_date` was moved past
/// the first due date counts as exactly one missed installment. Otherwise each
/// due period adds the full installment when unpaid, the principal slice when
/// only interest was paid, and nothing when settled in full.
pub fn compute_overdue(
    loan: &Loan,
    repayments: &[Repayment],
    as_of: NaiveDate,
) -> ChitLoanResult<OverdueSummary> {
    if !loan.is_accruing() {
        return Ok(OverdueSummary::NONE);
    }
    reconcile::validate_loan_terms(loan)?;

    let expected_periods = reconcile::expected_periods(loan, as_of);
    let latest = reconcile::latest_by_period(reconcile::for_loan(loan, repayments));

    if latest.is_empty() {
        let first_due = calendar::due_date(loan.repayment_type, loan.disbursement_date, 1)?;
        if loan.next_payment_date.is_some_and(|next| next > first_due) {
            return Ok(OverdueSummary {
                overdue_amount: loan.installment_amount,
                missed_payments: 1,
                expected_periods,
            });
        }
    }

    let principal_slice = reconcile::principal_portion(loan)?;
    let mut overdue_amount = Decimal::ZERO;
    let mut missed_payments = 0u32;

    for period in 1..=expected_periods {
        let settlement = Settlement::of(latest.get(&period).copied());
        overdue_amount = reconcile::accumulate(
            overdue_amount,
            settlement.shortfall(loan.installment_amount, principal_slice),
            "installment_amount",
        )?;
        if settlement.is_missed() {
            missed_payments += 1;
        }
    }

    Ok(OverdueSummary {
        overdue_amount,
        missed_payments,
        expected_periods,
    })
}

/// Overdue assessment wrapped in the standard output envelope.
pub fn assess_overdue(input: &OverdueInput) -> ChitLoanResult<ComputationOutput<OverdueSummary>> {
    let start = Instant::now();
    let as_of = input.as_of.unwrap_or_else(|| Local::now().date_naive());
    let warnings = repayment_warnings(&input.loan, &input.repayments);

    let summary = compute_overdue(&input.loan, &input.repayments, as_of)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Overdue reconciliation — latest repayment per period against elapsed schedule",
        &serde_json::json!({
            "loan_id": input.loan.id,
            "as_of": as_of.to_string(),
            "repayment_type": input.loan.repayment_type,
            "status": input.loan.status,
            "installment_amount": input.loan.installment_amount.to_string(),
            "repayments": input.repayments.len(),
        }),
        warnings,
        elapsed,
        summary,
    ))
}

/// Non-fatal observations about repayment rows the engine will skip.
pub(crate) fn repayment_warnings(loan: &Loan, repayments: &[Repayment]) -> Vec<String> {
    let mut warnings = Vec::new();

    if !loan.is_accruing() {
        warnings.push(format!(
            "Loan {} is {:?} with current_month {}; nothing accrues",
            loan.id, loan.status, loan.current_month
        ));
    }

    let foreign = repayments.iter().filter(|r| r.loan_id != loan.id).count();
    if foreign > 0 {
        warnings.push(format!(
            "{foreign} repayment(s) belong to another loan and were ignored"
        ));
    }

    for r in reconcile::for_loan(loan, repayments) {
        if r.period == 0 || r.period > loan.duration {
            warnings.push(format!(
                "Repayment {} targets period {} outside 1..={}",
                r.id, r.period, loan.duration
            ));
        }
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
