use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use chitloan_core::repayment::payments::RecordPaymentRequest;
use chitloan_core::Loan;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Overdue
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_overdue(input_json: String) -> NapiResult<String> {
    let input: chitloan_core::repayment::overdue::OverdueInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chitloan_core::repayment::overdue::assess_overdue(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: chitloan_core::repayment::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chitloan_core::repayment::schedule::schedule_report(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_loan(input_json: String) -> NapiResult<String> {
    let input: chitloan_core::repayment::overdue::OverdueInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        chitloan_core::repayment::summary::summary_report(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ValidatePaymentInput {
    loan: Loan,
    request: RecordPaymentRequest,
}

/// Validate a repayment request against its loan. The host persists the
/// returned row and assigns its id.
#[napi]
pub fn validate_payment(input_json: String) -> NapiResult<String> {
    let input: ValidatePaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let row = chitloan_core::repayment::payments::validate_payment(&input.loan, &input.request)
        .map_err(to_napi_error)?;
    serde_json::to_string(&row).map_err(to_napi_error)
}
