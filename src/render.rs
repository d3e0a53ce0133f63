//! Output of a calculated schedule as CSV or as a fixed-width text table.

use crate::error::Result;
use crate::schedule::Schedule;
use std::io::Write;

/// CSV header of a rendered schedule.
pub const CSV_HEADER: [&str; 8] = [
    "number", "period", "start", "stop", "length", "interests", "capital", "whole",
];

/// Writes one CSV row per installment, in schedule order.
///
/// Money values are formatted with exactly 2 decimal places, dates as ISO.
pub fn write_csv<W: Write>(schedule: &Schedule, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;

    for installment in schedule.installments().iter() {
        csv_writer.write_record([
            installment.order().to_string(),
            installment.name().to_string(),
            installment.first_day().to_string(),
            installment.last_day().to_string(),
            installment.length().to_string(),
            installment.interest().to_string(),
            installment.capital().to_string(),
            installment.total().to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes a fixed-width text table with a totals line.
pub fn write_table<W: Write>(schedule: &Schedule, mut writer: W) -> Result<()> {
    let line = "-".repeat(92);

    writeln!(
        writer,
        "{:>6} {:<8} {:<10} {:<10} {:>6} {:>15} {:>15} {:>15}",
        "No.", "Period", "Start", "Stop", "Days", "Interest", "Capital", "Total"
    )?;
    writeln!(writer, "{line}")?;

    for installment in schedule.installments().iter() {
        writeln!(
            writer,
            "{:>6} {:<8} {:<10} {:<10} {:>6} {:>15} {:>15} {:>15}",
            installment.order(),
            installment.name(),
            installment.first_day().to_string(),
            installment.last_day().to_string(),
            installment.length(),
            installment.interest().to_string(),
            installment.capital().to_string(),
            installment.total().to_string(),
        )?;
    }

    writeln!(writer, "{line}")?;
    writeln!(
        writer,
        "{:>6} {:<8} {:<10} {:<10} {:>6} {:>15} {:>15} {:>15}",
        "",
        "Total",
        "",
        "",
        "",
        schedule.total_interest().to_string(),
        schedule.total_capital().to_string(),
        schedule.total().to_string(),
    )?;

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::period::PeriodType;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn calculated() -> Schedule {
        let mut schedule = Schedule::new(
            Money::from_units(1200),
            dec!(0.10),
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            PeriodType::Quarter,
        )
        .unwrap();
        schedule.set_linear();
        schedule.calc();
        schedule
    }

    #[test]
    fn test_csv_output_format() {
        let mut output = Vec::new();
        write_csv(&calculated(), &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        let lines: Vec<_> = output_str.lines().collect();
        assert_eq!(lines[0], "number,period,start,stop,length,interests,capital,whole");
        assert_eq!(lines.len(), 5);
        // 1200 * 10% / 4 interest, 300 capital
        assert_eq!(lines[1], "1,2020Q1,2020-01-01,2020-03-31,91,30.00,300.00,330.00");
        assert!(lines[4].starts_with("4,2020Q4,2020-10-01,2020-12-31,92,"));
    }

    #[test]
    fn test_table_output_has_totals() {
        let mut output = Vec::new();
        write_table(&calculated(), &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("Interest"));
        assert!(output_str.contains("2020Q3"));
        let totals = output_str.lines().last().unwrap();
        assert!(totals.contains("Total"));
        assert!(totals.contains("1200.00"));
    }
}
