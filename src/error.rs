//! Error types for the credit schedule.

use crate::money::Money;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for schedule operations
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors that can occur while configuring or calculating a schedule.
///
/// Every input error carries the offending values; none is recovered
/// automatically.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Interest rates must be non-negative
    #[error("Negative rate {rate} on {date}")]
    NegativeRate { date: NaiveDate, rate: Decimal },

    /// Draws must be non-negative (repayments may be negative corrections)
    #[error("Negative payment {amount} on {date}")]
    NegativePayment { date: NaiveDate, amount: Money },

    /// The schedule window must satisfy start < end
    #[error("Schedule start {start} is later than or equal to end {end}")]
    StartIsLaterOrEqualToEnd { start: NaiveDate, end: NaiveDate },

    /// The first repayment date must lie within the schedule window
    ///
    /// Also known as `FirstRepaymentExceedesSchedule`.
    #[error("First repayment date {date} is outside the schedule {start}..{end}")]
    FirstRepaymentExceedsSchedule {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Unrecognized period granularity token
    #[error("Unknown period type '{token}' (expected monthly, quarterly, halfYearly or yearly)")]
    UnknownPeriodType { token: String },

    /// Unrecognized repayment style token
    #[error("Unknown repayment style '{token}' (expected manual, linear, balloon or annuity)")]
    UnknownRepaymentStyle { token: String },

    /// No installment covers the requested date
    ///
    /// Also known as `InstallmentDonoex`.
    #[error("No installment covers {date}")]
    InstallmentNotFound { date: NaiveDate },

    /// Failed to open or read the plan file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid plan record
    #[error("Invalid plan record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing plan file argument
    #[error("Missing plan file argument. Usage: credit-schedule <plan.csv> [--table]")]
    MissingArgument,
}
