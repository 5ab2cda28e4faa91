use serde::{Deserialize, Serialize};

use crate::error::ChitLoanError;
use crate::ledger::LoanLedger;
use crate::repayment::overdue::OverdueSummary;
use crate::repayment::payments::NewRepayment;
use crate::types::{Loan, LoanStatus, Repayment, RowId};
use crate::ChitLoanResult;

/// Loans and their append-only repayments held in memory.
///
/// Serializes to `{ "loans": [...], "repayments": [...] }`, which is also the
/// on-disk ledger file format used by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub repayments: Vec<Repayment>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a loan row.
    pub fn upsert_loan(&mut self, loan: Loan) {
        match self.loans.iter_mut().find(|l| l.id == loan.id) {
            Some(existing) => *existing = loan,
            None => self.loans.push(loan),
        }
    }

    fn loan_mut(&mut self, loan_id: RowId) -> ChitLoanResult<&mut Loan> {
        self.loans
            .iter_mut()
            .find(|l| l.id == loan_id)
            .ok_or_else(|| not_found(loan_id))
    }

    fn next_repayment_id(&self) -> RowId {
        self.repayments.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }
}

fn not_found(loan_id: RowId) -> ChitLoanError {
    ChitLoanError::NotFound {
        entity: "Loan".into(),
        id: loan_id,
    }
}

impl LoanLedger for InMemoryLedger {
    fn loan(&self, loan_id: RowId) -> ChitLoanResult<Loan> {
        self.loans
            .iter()
            .find(|l| l.id == loan_id)
            .cloned()
            .ok_or_else(|| not_found(loan_id))
    }

    fn repayments_for(&self, loan_id: RowId) -> ChitLoanResult<Vec<Repayment>> {
        Ok(self
            .repayments
            .iter()
            .filter(|r| r.loan_id == loan_id)
            .cloned()
            .collect())
    }

    fn append_repayment(&mut self, repayment: NewRepayment) -> ChitLoanResult<Repayment> {
        if !self.loans.iter().any(|l| l.id == repayment.loan_id) {
            return Err(not_found(repayment.loan_id));
        }
        let row = repayment.into_repayment(self.next_repayment_id());
        self.repayments.push(row.clone());
        Ok(row)
    }

    fn store_overdue(&mut self, loan_id: RowId, summary: &OverdueSummary) -> ChitLoanResult<()> {
        let loan = self.loan_mut(loan_id)?;
        loan.overdue_amount = summary.overdue_amount;
        loan.missed_payments = summary.missed_payments;
        Ok(())
    }

    fn active_loan_ids(&self) -> Vec<RowId> {
        self.loans
            .iter()
            .filter(|l| l.status == LoanStatus::Active)
            .map(|l| l.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repayment::test_support::{date, monthly_loan};
    use crate::types::PaymentType;
    use rust_decimal_macros::dec;

    fn new_row(loan_id: RowId) -> NewRepayment {
        NewRepayment {
            loan_id,
            period: 1,
            amount: dec!(1100),
            paid_date: date(2026, 2, 15),
            payment_type: PaymentType::Full,
        }
    }

    #[test]
    fn test_repayment_ids_are_sequential() {
        let mut ledger = InMemoryLedger::new();
        ledger.upsert_loan(monthly_loan());
        let a = ledger.append_repayment(new_row(1)).unwrap();
        let b = ledger.append_repayment(new_row(1)).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(ledger.repayments_for(1).unwrap().len(), 2);
    }

    #[test]
    fn test_append_to_unknown_loan_fails() {
        let mut ledger = InMemoryLedger::new();
        let err = ledger.append_repayment(new_row(5)).unwrap_err();
        assert!(matches!(err, ChitLoanError::NotFound { id: 5, .. }));
        assert!(ledger.repayments.is_empty());
    }

    #[test]
    fn test_upsert_replaces_existing_loan() {
        let mut ledger = InMemoryLedger::new();
        ledger.upsert_loan(monthly_loan());
        let mut closed = monthly_loan();
        closed.status = LoanStatus::Closed;
        ledger.upsert_loan(closed);
        assert_eq!(ledger.loans.len(), 1);
        assert!(ledger.active_loan_ids().is_empty());
    }

    #[test]
    fn test_ledger_file_shape() {
        let ledger: InMemoryLedger = serde_json::from_str(r#"{ "loans": [] }"#).unwrap();
        assert!(ledger.repayments.is_empty());
    }
}
