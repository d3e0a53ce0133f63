//! Repayment styles deciding how much capital each installment repays.
//!
//! Every automatic style (linear, balloon, annuity) schedules exactly the net
//! principal over the eligible installments: the last eligible installment
//! always takes whatever is still outstanding, so rounding never leaks.

use crate::error::{Result, ScheduleError};
use crate::money::Money;
use crate::period::Period;
use log::debug;
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How capital is distributed over the installments of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RepaymentStyle {
    /// Capital comes only from repayments registered by the caller.
    #[default]
    Manual,

    /// Equal capital per eligible installment, remainder on the last one.
    Linear,

    /// All capital on the last eligible installment.
    Balloon,

    /// Level total payment (interest + capital) per eligible installment.
    ///
    /// `first_capital` optionally fixes the capital of the first eligible
    /// installment; the level payment is then set over the remaining ones.
    Annuity { first_capital: Option<Money> },
}

/// Everything a style needs to know about the installment being settled.
#[derive(Debug, Clone)]
pub struct CapitalContext<'a> {
    pub period: &'a Period,
    /// Interest already accrued for this installment.
    pub interest: Money,
    /// Annual rate on the period's first day.
    pub rate: Decimal,
    /// Net principal of the whole schedule.
    pub principal: Money,
    /// Principal not yet scheduled by previous installments.
    pub remaining: Money,
    /// Balance drawn and not yet repaid at the end of the period.
    pub outstanding: Money,
    /// Whether the installment is at or after the grace boundary.
    pub eligible: bool,
    /// Number of eligible installments in the schedule.
    pub eligible_total: u32,
    /// Eligible installments left, this one included.
    pub eligible_left: u32,
    /// Repayments registered by the caller within the period.
    pub registered_repayments: Money,
}

impl CapitalContext<'_> {
    fn is_last_eligible(&self) -> bool {
        self.eligible && self.eligible_left <= 1
    }

    /// Most capital a non-final installment may repay: never more than is
    /// still unscheduled, nor more than has actually been drawn.
    fn ceiling(&self) -> Money {
        self.remaining.min(self.outstanding).max(Money::ZERO)
    }
}

impl RepaymentStyle {
    /// Returns `true` if the style schedules capital on its own rather than
    /// reading it from registered repayments.
    pub fn schedules_capital(&self) -> bool {
        !matches!(self, RepaymentStyle::Manual)
    }

    /// Capital repaid by the installment described by `ctx`.
    pub fn capital(&self, ctx: &CapitalContext<'_>, state: &mut AnnuityState) -> Money {
        match self {
            RepaymentStyle::Manual => ctx.registered_repayments,
            _ if !ctx.eligible => Money::ZERO,
            _ if ctx.is_last_eligible() => ctx.remaining,
            RepaymentStyle::Balloon => Money::ZERO,
            RepaymentStyle::Linear => linear_capital(ctx),
            RepaymentStyle::Annuity { .. } => state.capital(ctx),
        }
    }

    /// Fresh accumulator for one calculation pass.
    pub fn annuity_state(&self) -> AnnuityState {
        match self {
            RepaymentStyle::Annuity { first_capital } => AnnuityState::new(*first_capital),
            _ => AnnuityState::new(None),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            RepaymentStyle::Manual => "manual",
            RepaymentStyle::Linear => "linear",
            RepaymentStyle::Balloon => "balloon",
            RepaymentStyle::Annuity { .. } => "annuity",
        }
    }
}

impl FromStr for RepaymentStyle {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(RepaymentStyle::Manual),
            "linear" => Ok(RepaymentStyle::Linear),
            "balloon" => Ok(RepaymentStyle::Balloon),
            "annuity" => Ok(RepaymentStyle::Annuity {
                first_capital: None,
            }),
            _ => Err(ScheduleError::UnknownRepaymentStyle {
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RepaymentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

fn linear_capital(ctx: &CapitalContext<'_>) -> Money {
    if ctx.eligible_total == 0 {
        return Money::ZERO;
    }
    let each = Money::truncated(ctx.principal.amount() / Decimal::from(ctx.eligible_total));
    each.clamp_to(Money::ZERO, ctx.ceiling())
}

/// Running state of the annuity style across one ordered calculation pass.
///
/// Created fresh for every pass, so repeated calculations never see the
/// corrections of a previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnuityState {
    /// Level total payment currently targeted.
    pub level_payment: Option<Money>,
    /// Rate the level payment was fixed at.
    pub fixed_rate: Option<Decimal>,
    /// Sub-cent residual carried from previous installments.
    pub global_diff: Decimal,
    /// Capital override for the first eligible installment, consumed once.
    pub first_capital_possible: Option<Money>,
}

impl AnnuityState {
    pub fn new(first_capital: Option<Money>) -> Self {
        AnnuityState {
            first_capital_possible: first_capital,
            ..AnnuityState::default()
        }
    }

    fn capital(&mut self, ctx: &CapitalContext<'_>) -> Money {
        let ceiling = ctx.ceiling();

        if let Some(first) = self.first_capital_possible.take() {
            debug!("{}: first capital fixed at {}", ctx.period.name, first);
            return first.clamp_to(Money::ZERO, ceiling);
        }

        let level = match self.level_payment {
            Some(level) if self.fixed_rate == Some(ctx.rate) => level,
            _ => self.fix_level_payment(ctx),
        };

        let raw = (level.amount() - ctx.interest.amount() + self.global_diff)
            .clamp(Decimal::ZERO, ceiling.amount());
        let capital = Money::new(raw);
        self.global_diff = raw - capital.amount();
        capital
    }

    /// Sets the level payment amortizing `remaining` over the eligible
    /// installments left at the current periodic rate.
    fn fix_level_payment(&mut self, ctx: &CapitalContext<'_>) -> Money {
        let periods = ctx.eligible_left.max(1);
        let periodic_rate = ctx.rate * ctx.period.percent_of_year;
        let remaining = ctx.remaining.amount();

        let linear = remaining / Decimal::from(periods);
        let level = if periodic_rate.is_zero() {
            linear
        } else {
            annuity_payment(remaining, periodic_rate, periods).unwrap_or(linear)
        };
        let level = Money::new(level);

        debug!(
            "{}: level payment {} over {} periods at {}",
            ctx.period.name, level, periods, ctx.rate
        );
        self.level_payment = Some(level);
        self.fixed_rate = Some(ctx.rate);
        self.global_diff = Decimal::ZERO;
        level
    }
}

/// Level payment `R·p / (1 − (1+p)^−k)`.
///
/// `None` when the payment is not representable; a growth factor too large
/// to represent discounts to zero, leaving the interest-only payment `R·p`.
fn annuity_payment(remaining: Decimal, periodic_rate: Decimal, periods: u32) -> Option<Decimal> {
    let discount = match (Decimal::ONE + periodic_rate).checked_powu(u64::from(periods)) {
        Some(growth) => Decimal::ONE.checked_div(growth)?,
        None => Decimal::ZERO,
    };
    remaining
        .checked_mul(periodic_rate)?
        .checked_div(Decimal::ONE - discount)
}
