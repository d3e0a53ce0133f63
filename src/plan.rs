//! Plan file models: CSV records describing a schedule and its flows.
//!
//! A plan is a `type,date,value` CSV. Rows that cannot be parsed are logged
//! and skipped; a plan that cannot produce a valid schedule is an error.

use crate::error::{Result, ScheduleError};
use crate::money::Money;
use crate::repayment::RepaymentStyle;
use crate::schedule::Schedule;
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

/// Raw plan record as read from CSV.
#[derive(Debug, Deserialize)]
pub struct PlanRecord {
    /// Record type: open, end, period, rate, payment, repayment, style,
    /// first_capital, grace, daily
    #[serde(rename = "type")]
    pub kind: String,

    /// ISO date (`YYYY-MM-DD`), absent for option records
    pub date: Option<String>,

    /// Amount, rate or option token depending on the record type
    pub value: Option<String>,
}

impl PlanRecord {
    /// Parses the raw CSV record into a typed plan entry.
    ///
    /// Returns `None` if the record is invalid (unknown type, missing date or
    /// value, unparseable number).
    pub fn parse(&self) -> Option<PlanEntry> {
        let kind = self.kind.trim().to_lowercase();

        match kind.as_str() {
            "open" => Some(PlanEntry::Open {
                today: self.parse_date()?,
                principal: Money::from_str(self.value_str()?).ok()?,
            }),
            "end" => Some(PlanEntry::End(self.parse_date()?)),
            "period" => Some(PlanEntry::Period(self.value_str()?.to_string())),
            "rate" => Some(PlanEntry::Rate {
                date: self.parse_date()?,
                rate: Decimal::from_str(self.value_str()?).ok()?,
            }),
            "payment" => Some(PlanEntry::Payment {
                date: self.parse_date()?,
                amount: Money::from_str(self.value_str()?).ok()?,
            }),
            "repayment" => Some(PlanEntry::Repayment {
                date: self.parse_date()?,
                amount: Money::from_str(self.value_str()?).ok()?,
            }),
            "style" => Some(PlanEntry::Style(self.value_str()?.to_string())),
            "first_capital" => Some(PlanEntry::FirstCapital(
                Money::from_str(self.value_str()?).ok()?,
            )),
            "grace" => Some(PlanEntry::Grace(self.parse_date()?)),
            "daily" => Some(PlanEntry::Daily(
                self.value_str()?.to_lowercase().parse().ok()?,
            )),
            _ => None,
        }
    }

    fn value_str(&self) -> Option<&str> {
        let trimmed = self.value.as_deref()?.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    fn parse_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

/// A parsed plan entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntry {
    /// Reference date (schedule starts the day after) and initial draw.
    Open { today: NaiveDate, principal: Money },

    /// Last schedule day.
    End(NaiveDate),

    /// Period granularity token.
    Period(String),

    /// Annual rate effective from a date.
    Rate { date: NaiveDate, rate: Decimal },

    /// Additional draw.
    Payment { date: NaiveDate, amount: Money },

    /// Registered repayment.
    Repayment { date: NaiveDate, amount: Money },

    /// Repayment style token.
    Style(String),

    /// Annuity capital of the first eligible installment.
    FirstCapital(Money),

    /// First repayment date (grace boundary).
    Grace(NaiveDate),

    /// Day-exact accrual flag.
    Daily(bool),
}

/// A parsed plan: entries with the CSV row they came from.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    entries: Vec<(usize, PlanEntry)>,
}

impl Plan {
    /// Reads plan records from CSV in streaming fashion.
    ///
    /// Invalid records are logged at warn level and skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Plan> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut plan = Plan::default();
        for (row_idx, result) in csv_reader.deserialize::<PlanRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => match record.parse() {
                    Some(entry) => {
                        debug!("Row {}: {:?}", row_num, entry);
                        plan.entries.push((row_num, entry));
                    }
                    None => warn!("Row {}: Failed to parse plan record", row_num),
                },
                Err(e) => warn!("Row {}: CSV parse error: {}", row_num, e),
            }
        }

        Ok(plan)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().map(|(_, entry)| entry)
    }

    /// Builds the configured (not yet calculated) schedule.
    pub fn to_schedule(&self) -> Result<Schedule> {
        let (today, principal) = self
            .entries()
            .find_map(|e| match e {
                PlanEntry::Open { today, principal } => Some((*today, *principal)),
                _ => None,
            })
            .ok_or_else(|| missing("open"))?;
        let end = self
            .entries()
            .find_map(|e| match e {
                PlanEntry::End(date) => Some(*date),
                _ => None,
            })
            .ok_or_else(|| missing("end"))?;
        let period = self
            .entries()
            .find_map(|e| match e {
                PlanEntry::Period(token) => Some(token.as_str()),
                _ => None,
            })
            .unwrap_or("monthly");

        // Opens at rate zero; a rate record dated `today` replaces it.
        let mut schedule =
            Schedule::with_period_token(principal, Decimal::ZERO, today, end, period)?;
        let mut first_capital = None;

        for (row, entry) in &self.entries {
            match entry {
                PlanEntry::Rate { date, rate } => schedule.add_rate(*date, *rate)?,
                PlanEntry::Payment { date, amount } => schedule.add_payment(*date, *amount, false)?,
                PlanEntry::Repayment { date, amount } => {
                    schedule.add_repayment(*date, *amount, false)?
                }
                PlanEntry::Style(token) => {
                    schedule.set_repayment_style(token.parse::<RepaymentStyle>()?)
                }
                PlanEntry::FirstCapital(amount) => first_capital = Some((*row, *amount)),
                PlanEntry::Grace(date) => schedule.set_first_repayment_date(*date)?,
                PlanEntry::Daily(daily) => schedule.set_is_calc_daily(*daily),
                PlanEntry::Open { .. } | PlanEntry::End(_) | PlanEntry::Period(_) => {}
            }
        }

        if let Some((row, amount)) = first_capital {
            match schedule.repayment_style() {
                RepaymentStyle::Annuity { .. } => schedule.set_annuity(Some(amount)),
                style => {
                    return Err(ScheduleError::InvalidRecord {
                        row,
                        message: format!("first_capital requires annuity style, got {style}"),
                    })
                }
            }
        }

        Ok(schedule)
    }
}

fn missing(kind: &str) -> ScheduleError {
    ScheduleError::InvalidRecord {
        row: 0,
        message: format!("plan has no valid '{kind}' record"),
    }
}
