//! Credit Schedule CLI
//!
//! Reads a plan CSV, calculates the schedule and writes it to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- plan.csv > schedule.csv
//! cargo run -- plan.csv --table
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use credit_schedule::{render, Plan, Result, ScheduleError};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(ScheduleError::MissingArgument);
    }

    let input_path = &args[1];
    let as_table = args[2..].iter().any(|a| a == "--table");

    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let mut schedule = Plan::from_reader(reader)?.to_schedule()?;
    schedule.calc();

    let stdout = io::stdout();
    let handle = stdout.lock();
    if as_table {
        render::write_table(&schedule, handle)?;
    } else {
        render::write_csv(&schedule, handle)?;
    }

    Ok(())
}
