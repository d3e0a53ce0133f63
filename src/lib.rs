//! # Credit Schedule
//!
//! Computes a period-by-period amortization schedule for a credit: interest
//! accrued, capital repaid and outstanding balance for every calendar month,
//! quarter, half-year or year of the schedule window.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: money kept in cents via `rust_decimal`
//! - **Day-granularity timelines**: draws, repayments and rates are step
//!   functions of the date, sampled and run-compressed per installment
//! - **Exact invariants**: every automatic repayment style schedules exactly
//!   the net principal; rounding residuals land on the last installment
//! - **Idempotent calculation**: `calc()` recomputes all derived state
//!
//! ## Example
//!
//! ```
//! use credit_schedule::{Money, PeriodType, Schedule};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! let today = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();
//! let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
//! let mut schedule = Schedule::new(
//!     Money::from_units(1000),
//!     Decimal::from_str("0.05").unwrap(),
//!     today,
//!     end,
//!     PeriodType::Month,
//! )
//! .unwrap();
//! schedule.set_balloon();
//! schedule.calc();
//!
//! assert_eq!(schedule.installments().len(), 12);
//! assert_eq!(schedule.total_capital(), Money::from_units(1000));
//! ```

pub mod accrual;
pub mod error;
pub mod installment;
pub mod ledger;
pub mod money;
pub mod period;
pub mod plan;
pub mod rates;
pub mod render;
pub mod repayment;
pub mod schedule;

pub use accrual::{AccrualBasis, Tick};
pub use error::{Result, ScheduleError};
pub use installment::{Installment, InstallmentSeries};
pub use ledger::{EngagementTimeline, FlowEntry, FlowKind, FlowLedger};
pub use money::Money;
pub use period::{Period, PeriodType, ScheduleWindow};
pub use plan::{Plan, PlanEntry, PlanRecord};
pub use rates::{RateEntry, RateTimeline};
pub use repayment::{AnnuityState, RepaymentStyle};
pub use schedule::Schedule;
