pub mod ledger;
pub mod loan;
