//! Validation of incoming repayment records.
//!
//! Request bodies arrive with every field optional; `validate_payment`
//! enumerates the required ones and turns the request into a typed row that
//! the ledger can append.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ChitLoanError;
use crate::types::{Loan, Money, PaymentType, Repayment, RowId};
use crate::ChitLoanResult;

/// Repayment as submitted by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    #[serde(default)]
    pub period: Option<u32>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    /// Defaults to `full`.
    #[serde(default)]
    pub payment_type: Option<PaymentType>,
}

/// A validated repayment that has not been assigned a row id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRepayment {
    pub loan_id: RowId,
    pub period: u32,
    pub amount: Money,
    pub paid_date: NaiveDate,
    pub payment_type: PaymentType,
}

impl NewRepayment {
    pub fn into_repayment(self, id: RowId) -> Repayment {
        Repayment {
            id,
            loan_id: self.loan_id,
            period: self.period,
            amount: self.amount,
            paid_date: self.paid_date,
            payment_type: self.payment_type,
        }
    }
}

/// Check a payment request against the loan it is recorded for.
pub fn validate_payment(loan: &Loan, request: &RecordPaymentRequest) -> ChitLoanResult<NewRepayment> {
    let period = request
        .period
        .ok_or_else(|| ChitLoanError::validation("period", "Period is required"))?;
    let amount = request
        .amount
        .ok_or_else(|| ChitLoanError::validation("amount", "Amount is required"))?;
    let paid_date = request
        .paid_date
        .ok_or_else(|| ChitLoanError::validation("paid_date", "Paid date is required"))?;

    if period == 0 || period > loan.duration {
        return Err(ChitLoanError::validation(
            "period",
            format!("Period {period} is outside 1..={}", loan.duration),
        ));
    }
    if amount <= Decimal::ZERO {
        return Err(ChitLoanError::validation("amount", "Amount must be positive"));
    }

    Ok(NewRepayment {
        loan_id: loan.id,
        period,
        amount,
        paid_date,
        payment_type: request.payment_type.unwrap_or_default(),
    })
}
