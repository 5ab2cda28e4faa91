//! Persistence seam and the request-level operations built on it.
//!
//! The ledger owns loan rows and their append-only repayments. Every
//! operation here reads one consistent snapshot of a loan, runs a pure
//! computation and performs at most one write. Transaction boundaries around
//! that sequence belong to the ledger implementation.

pub mod memory;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::repayment::overdue::{compute_overdue, OverdueSummary};
use crate::repayment::payments::{validate_payment, NewRepayment, RecordPaymentRequest};
use crate::repayment::schedule::{build_dynamic_schedule, ScheduleQuery, SchedulePage};
use crate::repayment::summary::{summarize_loan, LoanSummary};
use crate::types::{Loan, Money, Repayment, RowId};
use crate::ChitLoanResult;

pub use memory::InMemoryLedger;

/// Storage of loans and repayments.
pub trait LoanLedger {
    /// Snapshot of a loan row; `NotFound` when the id is unknown.
    fn loan(&self, loan_id: RowId) -> ChitLoanResult<Loan>;

    fn repayments_for(&self, loan_id: RowId) -> ChitLoanResult<Vec<Repayment>>;

    /// Append a repayment and return it with its assigned id.
    fn append_repayment(&mut self, repayment: NewRepayment) -> ChitLoanResult<Repayment>;

    /// Overwrite the loan's `overdue_amount` and `missed_payments`.
    fn store_overdue(&mut self, loan_id: RowId, summary: &OverdueSummary) -> ChitLoanResult<()>;

    fn active_loan_ids(&self) -> Vec<RowId>;
}

/// Validate and append a repayment. Earlier repayments are left untouched.
pub fn record_payment<L: LoanLedger + ?Sized>(
    ledger: &mut L,
    loan_id: RowId,
    request: &RecordPaymentRequest,
) -> ChitLoanResult<Repayment> {
    let loan = ledger.loan(loan_id)?;
    let row = validate_payment(&loan, request)?;
    let stored = ledger.append_repayment(row)?;
    info!(
        loan_id,
        repayment_id = stored.id,
        period = stored.period,
        amount = %stored.amount,
        payment_type = ?stored.payment_type,
        "recorded repayment"
    );
    Ok(stored)
}

/// Schedule page for a stored loan.
pub fn fetch_schedule<L: LoanLedger + ?Sized>(
    ledger: &L,
    loan_id: RowId,
    query: &ScheduleQuery,
    as_of: NaiveDate,
) -> ChitLoanResult<SchedulePage> {
    let loan = ledger.loan(loan_id)?;
    let repayments = ledger.repayments_for(loan_id)?;
    build_dynamic_schedule(&loan, &repayments, query, as_of)
}

/// Totals for a stored loan.
pub fn loan_summary<L: LoanLedger + ?Sized>(
    ledger: &L,
    loan_id: RowId,
    as_of: NaiveDate,
) -> ChitLoanResult<LoanSummary> {
    let loan = ledger.loan(loan_id)?;
    let repayments = ledger.repayments_for(loan_id)?;
    summarize_loan(&loan, &repayments, as_of)
}

/// Recompute a loan's overdue fields from scratch and write them back.
pub fn refresh_overdue<L: LoanLedger + ?Sized>(
    ledger: &mut L,
    loan_id: RowId,
    as_of: NaiveDate,
) -> ChitLoanResult<OverdueSummary> {
    let loan = ledger.loan(loan_id)?;
    let repayments = ledger.repayments_for(loan_id)?;
    let summary = compute_overdue(&loan, &repayments, as_of)?;
    debug!(loan_id, ?summary, %as_of, "computed overdue");

    ledger.store_overdue(loan_id, &summary)?;
    if summary.overdue_amount != loan.overdue_amount || summary.missed_payments != loan.missed_payments {
        info!(
            loan_id,
            previous = %loan.overdue_amount,
            overdue_amount = %summary.overdue_amount,
            missed_payments = summary.missed_payments,
            "overdue changed"
        );
    }
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Outcome of refreshing every active loan once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub as_of: NaiveDate,
    pub refreshed: Vec<RefreshedLoan>,
    pub failures: Vec<SweepFailure>,
    pub total_overdue: Money,
    pub loans_in_arrears: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedLoan {
    pub loan_id: RowId,
    pub overdue_amount: Money,
    pub missed_payments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFailure {
    pub loan_id: RowId,
    pub error: String,
}

/// Refresh the overdue fields of every active loan, one loan at a time.
///
/// A loan that fails is reported and skipped; the rest are still refreshed.
pub fn sweep_overdue<L: LoanLedger + ?Sized>(ledger: &mut L, as_of: NaiveDate) -> SweepReport {
    let loan_ids = ledger.active_loan_ids();
    info!(loans = loan_ids.len(), %as_of, "starting overdue sweep");

    let mut refreshed = Vec::with_capacity(loan_ids.len());
    let mut failures = Vec::new();

    for loan_id in loan_ids {
        match refresh_overdue(ledger, loan_id, as_of) {
            Ok(summary) => refreshed.push(RefreshedLoan {
                loan_id,
                overdue_amount: summary.overdue_amount,
                missed_payments: summary.missed_payments,
            }),
            Err(e) => {
                warn!(loan_id, error = %e, "overdue refresh failed");
                failures.push(SweepFailure {
                    loan_id,
                    error: e.to_string(),
                });
            }
        }
    }

    let mut total_overdue = Decimal::ZERO;
    for r in &refreshed {
        match total_overdue.checked_add(r.overdue_amount) {
            Some(total) => total_overdue = total,
            None => {
                warn!(loan_id = r.loan_id, "portfolio overdue total out of range; capped");
                total_overdue = Decimal::MAX;
                break;
            }
        }
    }
    let loans_in_arrears = refreshed
        .iter()
        .filter(|r| r.overdue_amount > Decimal::ZERO)
        .count() as u32;

    info!(
        refreshed = refreshed.len(),
        failed = failures.len(),
        total_overdue = %total_overdue,
        "overdue sweep finished"
    );

    SweepReport {
        as_of,
        refreshed,
        failures,
        total_overdue,
        loans_in_arrears,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChitLoanError;
    use crate::repayment::test_support::{date, monthly_loan, weekly_loan};
    use crate::types::{LoanStatus, PaymentType};
    use rust_decimal_macros::dec;

    fn seeded() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger.upsert_loan(monthly_loan());
        ledger.upsert_loan(weekly_loan(dec!(9000), 10));
        ledger
    }

    fn full_payment(period: u32, paid: NaiveDate) -> RecordPaymentRequest {
        RecordPaymentRequest {
            period: Some(period),
            amount: Some(dec!(1100)),
            paid_date: Some(paid),
            payment_type: None,
        }
    }

    // -----------------------------------------------------------------------
    // 1. Recording
    // -----------------------------------------------------------------------
    #[test]
    fn test_record_payment_appends_history() {
        let mut ledger = seeded();
        record_payment(&mut ledger, 1, &full_payment(1, date(2026, 2, 15))).unwrap();
        let mut again = full_payment(1, date(2026, 2, 20));
        again.payment_type = Some(PaymentType::InterestOnly);
        record_payment(&mut ledger, 1, &again).unwrap();

        let rows = ledger.repayments_for(1).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].payment_type, PaymentType::Full);
        assert_eq!(rows[1].payment_type, PaymentType::InterestOnly);
    }

    #[test]
    fn test_record_payment_unknown_loan() {
        let mut ledger = seeded();
        let err = record_payment(&mut ledger, 77, &full_payment(1, date(2026, 2, 15))).unwrap_err();
        assert!(matches!(err, ChitLoanError::NotFound { id: 77, .. }));
    }

    #[test]
    fn test_invalid_payment_appends_nothing() {
        let mut ledger = seeded();
        let err = record_payment(&mut ledger, 1, &full_payment(13, date(2026, 2, 15))).unwrap_err();
        assert!(matches!(err, ChitLoanError::Validation { .. }));
        assert!(ledger.repayments.is_empty());
    }

    // -----------------------------------------------------------------------
    // 2. Refresh and write-back
    // -----------------------------------------------------------------------
    #[test]
    fn test_refresh_writes_back_overdue_fields() {
        let mut ledger = seeded();
        record_payment(&mut ledger, 1, &full_payment(1, date(2026, 2, 15))).unwrap();

        let summary = refresh_overdue(&mut ledger, 1, date(2026, 7, 15)).unwrap();
        assert_eq!(summary.overdue_amount, dec!(5500));

        let loan = ledger.loan(1).unwrap();
        assert_eq!(loan.overdue_amount, dec!(5500));
        assert_eq!(loan.missed_payments, 5);
    }

    #[test]
    fn test_refresh_overwrites_stale_values() {
        let mut ledger = seeded();
        let mut stale = monthly_loan();
        stale.overdue_amount = dec!(999999);
        stale.missed_payments = 40;
        ledger.upsert_loan(stale);

        refresh_overdue(&mut ledger, 1, date(2026, 3, 15)).unwrap();
        let first = ledger.loan(1).unwrap();
        refresh_overdue(&mut ledger, 1, date(2026, 3, 15)).unwrap();
        let second = ledger.loan(1).unwrap();

        assert_eq!(first.overdue_amount, dec!(2200));
        assert_eq!(first.missed_payments, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fetch_schedule_and_summary_read_ledger_rows() {
        let mut ledger = seeded();
        record_payment(&mut ledger, 1, &full_payment(1, date(2026, 2, 15))).unwrap();

        let page = fetch_schedule(&ledger, 1, &ScheduleQuery::default(), date(2026, 3, 20)).unwrap();
        assert_eq!(page.total_count, 3);

        let summary = loan_summary(&ledger, 1, date(2026, 3, 20)).unwrap();
        assert_eq!(summary.periods_paid, 1);
        assert_eq!(summary.total_paid, dec!(1100));
    }

    // -----------------------------------------------------------------------
    // 3. Sweep
    // -----------------------------------------------------------------------
    #[test]
    fn test_sweep_refreshes_active_loans_only() {
        let mut ledger = seeded();
        let mut closed = monthly_loan();
        closed.id = 3;
        closed.status = LoanStatus::Closed;
        closed.overdue_amount = dec!(42);
        ledger.upsert_loan(closed);

        let report = sweep_overdue(&mut ledger, date(2026, 3, 15));
        let ids: Vec<RowId> = report.refreshed.iter().map(|r| r.loan_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(report.failures.is_empty());
        // 2 monthly installments + 2 weekly installments of 1050
        assert_eq!(report.total_overdue, dec!(4300));
        assert_eq!(report.loans_in_arrears, 2);
        assert_eq!(ledger.loan(3).unwrap().overdue_amount, dec!(42));
    }

    #[test]
    fn test_sweep_total_capped_when_out_of_range() {
        let mut ledger = InMemoryLedger::new();
        for id in [1, 3] {
            let mut loan = monthly_loan();
            loan.id = id;
            loan.installment_amount = Decimal::MAX;
            ledger.upsert_loan(loan);
        }

        // One installment due on each loan.
        let report = sweep_overdue(&mut ledger, date(2026, 2, 20));
        assert!(report.failures.is_empty());
        assert_eq!(report.refreshed.len(), 2);
        assert_eq!(report.total_overdue, Decimal::MAX);
        assert_eq!(report.loans_in_arrears, 2);
        assert_eq!(ledger.loan(3).unwrap().overdue_amount, Decimal::MAX);
    }

    #[test]
    fn test_sweep_continues_past_failing_loan() {
        let mut ledger = seeded();
        let mut broken = monthly_loan();
        broken.id = 4;
        broken.duration = 0;
        ledger.upsert_loan(broken);

        let report = sweep_overdue(&mut ledger, date(2026, 3, 15));
        assert_eq!(report.refreshed.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].loan_id, 4);
        assert!(report.failures[0].error.contains("duration"));
    }
}
