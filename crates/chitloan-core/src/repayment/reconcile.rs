//! Matching recorded repayments against scheduled periods.
//!
//! A period may carry several repayments. The one with the latest
//! `paid_date` decides how the period is settled; repayments sharing a
//! `paid_date` are ordered by insertion sequence, so the later row wins.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar;
use crate::error::ChitLoanError;
use crate::types::{Loan, Money, PaymentType, Repayment, RepaymentType};
use crate::ChitLoanResult;

/// Longest schedule the engine derives, a century of monthly periods.
pub const MAX_DURATION: u32 = 1200;

/// How the authoritative repayment of a period left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Latest repayment covered the full installment.
    Settled,
    /// Latest repayment serviced interest only; principal still outstanding.
    InterestOnly,
    /// Nothing recorded for the period.
    Unpaid,
}

impl Settlement {
    pub fn of(latest: Option<&Repayment>) -> Self {
        match latest.map(|r| r.payment_type) {
            Some(PaymentType::Full) => Settlement::Settled,
            Some(PaymentType::InterestOnly) => Settlement::InterestOnly,
            None => Settlement::Unpaid,
        }
    }

    /// Shortfall this period adds to the overdue amount once it is due.
    pub fn shortfall(self, installment: Money, principal_slice: Money) -> Money {
        match self {
            Settlement::Settled => Decimal::ZERO,
            Settlement::InterestOnly => principal_slice,
            Settlement::Unpaid => installment,
        }
    }

    /// Whether a due period in this state counts as a missed payment.
    pub fn is_missed(self) -> bool {
        self != Settlement::Settled
    }
}

/// Repayments that belong to `loan`, in input order.
pub fn for_loan<'a>(
    loan: &Loan,
    repayments: &'a [Repayment],
) -> impl Iterator<Item = &'a Repayment> + 'a {
    let loan_id = loan.id;
    repayments.iter().filter(move |r| r.loan_id == loan_id)
}

/// Map each period to its authoritative (most recent) repayment.
pub fn latest_by_period<'a, I>(repayments: I) -> BTreeMap<u32, &'a Repayment>
where
    I: IntoIterator<Item = &'a Repayment>,
{
    let mut latest: BTreeMap<u32, &Repayment> = BTreeMap::new();
    for repayment in repayments {
        latest
            .entry(repayment.period)
            .and_modify(|current| {
                if (repayment.paid_date, repayment.id) > (current.paid_date, current.id) {
                    *current = repayment;
                }
            })
            .or_insert(repayment);
    }
    latest
}

/// Principal share of one installment.
///
/// Monthly loans spread principal over every period. Weekly loans spread it
/// over `duration - 1` periods, the final week carrying no principal slice;
/// a single-week loan puts the whole principal in its only period.
pub fn principal_portion(loan: &Loan) -> ChitLoanResult<Money> {
    let divisor = match loan.repayment_type {
        RepaymentType::Monthly => loan.duration,
        RepaymentType::Weekly => loan.duration.saturating_sub(1).max(1),
    };

    if divisor == 0 {
        return Err(ChitLoanError::DivisionByZero {
            context: format!("principal slice of loan {}", loan.id),
        });
    }

    Ok(loan.amount / Decimal::from(divisor))
}

/// Number of periods due by `as_of`, clamped to `[0, duration]`.
pub fn expected_periods(loan: &Loan, as_of: NaiveDate) -> u32 {
    calendar::periods_elapsed(loan.repayment_type, loan.disbursement_date, as_of).min(loan.duration)
}

/// Add `amount` to a running total, reporting overflow against `field`.
pub(crate) fn accumulate(total: Money, amount: Money, field: &str) -> ChitLoanResult<Money> {
    total
        .checked_add(amount)
        .ok_or_else(|| ChitLoanError::validation(field, "Total exceeds the representable amount range"))
}

/// Reject loan terms the engine cannot schedule.
pub fn validate_loan_terms(loan: &Loan) -> ChitLoanResult<()> {
    if loan.duration == 0 {
        return Err(ChitLoanError::validation(
            "duration",
            "Duration must be at least one period",
        ));
    }
    if loan.duration > MAX_DURATION {
        return Err(ChitLoanError::validation(
            "duration",
            format!("Duration cannot exceed {MAX_DURATION} periods"),
        ));
    }
    if loan.amount <= Decimal::ZERO {
        return Err(ChitLoanError::validation("amount", "Principal must be positive"));
    }
    if loan.installment_amount < Decimal::ZERO {
        return Err(ChitLoanError::validation(
            "installment_amount",
            "Installment amount cannot be negative",
        ));
    }
    if loan.interest_rate < Decimal::ZERO {
        return Err(ChitLoanError::validation(
            "interest_rate",
            "Per-period interest charge cannot be negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repayment::test_support::{date, monthly_loan, repayment, weekly_loan};
    use rust_decimal_macros::dec;

    #[test]
    fn test_latest_by_paid_date_wins() {
        let rows = vec![
            repayment(1, 1, dec!(1100), date(2026, 3, 20), PaymentType::Full),
            repayment(2, 1, dec!(100), date(2026, 2, 20), PaymentType::InterestOnly),
        ];
        let latest = latest_by_period(&rows);
        assert_eq!(latest[&1].id, 1);
        assert_eq!(Settlement::of(latest.get(&1).copied()), Settlement::Settled);
    }

    #[test]
    fn test_identical_paid_date_later_insertion_wins() {
        let rows = vec![
            repayment(4, 2, dec!(1100), date(2026, 3, 20), PaymentType::Full),
            repayment(9, 2, dec!(100), date(2026, 3, 20), PaymentType::InterestOnly),
        ];
        let latest = latest_by_period(&rows);
        assert_eq!(latest[&2].id, 9);

        // Input order must not matter.
        let reversed: Vec<Repayment> = rows.into_iter().rev().collect();
        assert_eq!(latest_by_period(&reversed)[&2].id, 9);
    }

    #[test]
    fn test_principal_portion_monthly() {
        assert_eq!(principal_portion(&monthly_loan()).unwrap(), dec!(1000));
    }

    #[test]
    fn test_principal_portion_weekly_uses_duration_minus_one() {
        let loan = weekly_loan(dec!(9000), 10);
        assert_eq!(principal_portion(&loan).unwrap(), dec!(1000));
    }

    #[test]
    fn test_principal_portion_single_week_guarded() {
        let loan = weekly_loan(dec!(500), 1);
        assert_eq!(principal_portion(&loan).unwrap(), dec!(500));
    }

    #[test]
    fn test_principal_portion_zero_monthly_duration_errors() {
        let mut loan = monthly_loan();
        loan.duration = 0;
        assert!(matches!(
            principal_portion(&loan).unwrap_err(),
            ChitLoanError::DivisionByZero { .. }
        ));
    }

    #[test]
    fn test_shortfall_by_settlement() {
        let (inst, slice) = (dec!(1100), dec!(1000));
        assert_eq!(Settlement::Unpaid.shortfall(inst, slice), dec!(1100));
        assert_eq!(Settlement::InterestOnly.shortfall(inst, slice), dec!(1000));
        assert_eq!(Settlement::Settled.shortfall(inst, slice), Decimal::ZERO);
        assert!(Settlement::InterestOnly.is_missed());
        assert!(!Settlement::Settled.is_missed());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let mut loan = monthly_loan();
        loan.duration = 0;
        match validate_loan_terms(&loan).unwrap_err() {
            ChitLoanError::Validation { field, .. } => assert_eq!(field, "duration"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_runaway_duration() {
        let mut loan = weekly_loan(dec!(900), 4);
        loan.duration = u32::MAX;
        match validate_loan_terms(&loan).unwrap_err() {
            ChitLoanError::Validation { field, .. } => assert_eq!(field, "duration"),
            other => panic!("Expected Validation, got {:?}", other),
        }

        loan.duration = MAX_DURATION;
        assert!(validate_loan_terms(&loan).is_ok());
    }

    #[test]
    fn test_accumulate_reports_overflow() {
        assert_eq!(accumulate(dec!(1100), dec!(1000), "amount").unwrap(), dec!(2100));
        match accumulate(Decimal::MAX, dec!(1), "installment_amount").unwrap_err() {
            ChitLoanError::Validation { field, .. } => assert_eq!(field, "installment_amount"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_expected_periods_clamped_to_duration() {
        let loan = monthly_loan();
        assert_eq!(expected_periods(&loan, date(2030, 1, 15)), loan.duration);
    }
}
