use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Identifier of a loan or repayment row as handed out by the ledger.
pub type RowId = u64;

/// Repayment cadence of a loan. One period is one month or one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepaymentType {
    #[default]
    Monthly,
    Weekly,
}

/// Lifecycle state of a loan. Only `Active` loans accrue overdue amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    #[default]
    Active,
    Closed,
    Defaulted,
    Pending,
}

/// What a single repayment settled for its period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentType {
    #[default]
    Full,
    InterestOnly,
}

/// Classification of one scheduled period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodStatus {
    Paid,
    InterestOnlyPaid,
    Missed,
    Pending,
    Upcoming,
}

/// Snapshot of a loan row. The engine reads the terms and only ever
/// overwrites `overdue_amount` and `missed_payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: RowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrower: Option<String>,
    /// Principal disbursed.
    pub amount: Money,
    /// Flat money charge per period, not a percentage.
    pub interest_rate: Money,
    /// Number of periods.
    pub duration: u32,
    pub disbursement_date: NaiveDate,
    #[serde(default)]
    pub repayment_type: RepaymentType,
    /// Precomputed full payment for one period (principal share + interest).
    pub installment_amount: Money,
    #[serde(default)]
    pub status: LoanStatus,
    /// Periods elapsed as tracked by the host application. Zero means the
    /// loan has not been activated yet.
    #[serde(default)]
    pub current_month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub remaining_amount: Money,
    #[serde(default)]
    pub overdue_amount: Money,
    #[serde(default)]
    pub missed_payments: u32,
}

impl Loan {
    /// Whether the loan is in a state where periods can fall overdue.
    pub fn is_accruing(&self) -> bool {
        self.status == LoanStatus::Active && self.current_month > 0
    }
}

/// An appended repayment row. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
    /// Insertion sequence; breaks ties between repayments sharing a `paid_date`.
    pub id: RowId,
    pub loan_id: RowId,
    pub period: u32,
    pub amount: Money,
    pub paid_date: NaiveDate,
    #[serde(default)]
    pub payment_type: PaymentType,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
