pub mod overdue;
pub mod payments;
pub mod reconcile;
pub mod schedule;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::types::{Loan, LoanStatus, PaymentType, Repayment, RepaymentType};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 12,000 over 12 months at a flat 100 per month, disbursed 15 Jan 2026.
    pub fn monthly_loan() -> Loan {
        Loan {
            id: 1,
            borrower: Some("Lakshmi Self-Help Group".into()),
            amount: dec!(12000),
            interest_rate: dec!(100),
            duration: 12,
            disbursement_date: date(2026, 1, 15),
            repayment_type: RepaymentType::Monthly,
            installment_amount: dec!(1100),
            status: LoanStatus::Active,
            current_month: 1,
            next_payment_date: Some(date(2026, 2, 15)),
            remaining_amount: dec!(12000),
            overdue_amount: Decimal::ZERO,
            missed_payments: 0,
        }
    }

    /// Weekly loan disbursed 1 Mar 2026 at a flat 50 per week.
    pub fn weekly_loan(amount: Decimal, duration: u32) -> Loan {
        let slice_divisor = Decimal::from(duration.saturating_sub(1).max(1));
        Loan {
            id: 2,
            borrower: None,
            amount,
            interest_rate: dec!(50),
            duration,
            disbursement_date: date(2026, 3, 1),
            repayment_type: RepaymentType::Weekly,
            installment_amount: amount / slice_divisor + dec!(50),
            status: LoanStatus::Active,
            current_month: 1,
            next_payment_date: Some(date(2026, 3, 8)),
            remaining_amount: amount,
            overdue_amount: Decimal::ZERO,
            missed_payments: 0,
        }
    }

    /// Repayment against loan 1.
    pub fn repayment(
        id: u64,
        period: u32,
        amount: Decimal,
        paid_date: NaiveDate,
        payment_type: PaymentType,
    ) -> Repayment {
        Repayment {
            id,
            loan_id: 1,
            period,
            amount,
            paid_date,
            payment_type,
        }
    }
}
