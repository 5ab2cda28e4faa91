pub mod calendar;
pub mod error;
pub mod types;

#[cfg(feature = "repayment")]
pub mod repayment;

#[cfg(feature = "ledger")]
pub mod ledger;

pub use error::ChitLoanError;
pub use types::*;

/// Standard result type for all chitloan operations
pub type ChitLoanResult<T> = Result<T, ChitLoanError>;
