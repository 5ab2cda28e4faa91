use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::ChitLoanError;
use crate::types::RepaymentType;
use crate::ChitLoanResult;

const DAYS_PER_WEEK: i64 = 7;

/// Number of whole periods between disbursement and `as_of`.
///
/// A monthly period only counts once the disbursement day-of-month has
/// recurred; a weekly period once seven full days have passed. Dates before
/// disbursement yield zero. The result is not clamped to the loan duration.
pub fn periods_elapsed(cadence: RepaymentType, disbursed: NaiveDate, as_of: NaiveDate) -> u32 {
    let elapsed = match cadence {
        RepaymentType::Monthly => {
            let mut months = i64::from(as_of.year() - disbursed.year()) * 12
                + i64::from(as_of.month())
                - i64::from(disbursed.month());
            if as_of.day() < disbursed.day() {
                months -= 1;
            }
            months
        }
        RepaymentType::Weekly => (as_of - disbursed).num_days() / DAYS_PER_WEEK,
    };

    u32::try_from(elapsed.max(0)).unwrap_or(u32::MAX)
}

/// Due date of `period`: disbursement plus `period` cadence units.
///
/// Month arithmetic clamps to the last day of shorter months
/// (31 Jan + 1 month = 28/29 Feb).
pub fn due_date(
    cadence: RepaymentType,
    disbursed: NaiveDate,
    period: u32,
) -> ChitLoanResult<NaiveDate> {
    let shifted = match cadence {
        RepaymentType::Monthly => disbursed.checked_add_months(Months::new(period)),
        RepaymentType::Weekly => disbursed.checked_add_days(Days::new(7 * u64::from(period))),
    };

    shifted.ok_or_else(|| {
        ChitLoanError::DateError(format!(
            "period {period} from {disbursed} overflows the calendar"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_counts_full_months() {
        let n = periods_elapsed(RepaymentType::Monthly, date(2026, 1, 10), date(2026, 7, 10));
        assert_eq!(n, 6);
    }

    #[test]
    fn test_monthly_not_due_before_day_of_month() {
        let n = periods_elapsed(RepaymentType::Monthly, date(2026, 1, 10), date(2026, 7, 9));
        assert_eq!(n, 5);
    }

    #[test]
    fn test_monthly_across_year_boundary() {
        let n = periods_elapsed(RepaymentType::Monthly, date(2025, 11, 5), date(2026, 2, 20));
        assert_eq!(n, 3);
    }

    #[test]
    fn test_weekly_floor_division() {
        let d0 = date(2026, 3, 1);
        assert_eq!(periods_elapsed(RepaymentType::Weekly, d0, date(2026, 3, 4)), 0);
        assert_eq!(periods_elapsed(RepaymentType::Weekly, d0, date(2026, 3, 8)), 1);
        assert_eq!(periods_elapsed(RepaymentType::Weekly, d0, date(2026, 3, 21)), 2);
    }

    #[test]
    fn test_before_disbursement_is_zero() {
        let d0 = date(2026, 3, 1);
        assert_eq!(periods_elapsed(RepaymentType::Monthly, d0, date(2025, 12, 1)), 0);
        assert_eq!(periods_elapsed(RepaymentType::Weekly, d0, date(2026, 2, 1)), 0);
    }

    #[test]
    fn test_due_date_monthly_clamps_month_end() {
        let due = due_date(RepaymentType::Monthly, date(2026, 1, 31), 1).unwrap();
        assert_eq!(due, date(2026, 2, 28));
    }

    #[test]
    fn test_due_date_weekly() {
        let due = due_date(RepaymentType::Weekly, date(2026, 3, 1), 3).unwrap();
        assert_eq!(due, date(2026, 3, 22));
    }

    #[test]
    fn test_due_date_overflow_is_date_error() {
        let err = due_date(RepaymentType::Monthly, NaiveDate::MAX, 1).unwrap_err();
        assert!(matches!(err, ChitLoanError::DateError(_)));
    }
}
