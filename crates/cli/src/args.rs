//! Command-line arguments.

use apod_core::RecordId;
use chrono::NaiveDate;
use clap::{ArgGroup, Parser};

/// Cache NASA's Astronomy Picture of the Day and print where it lives.
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(
    name = "apod",
    version,
    about = "Cache the Astronomy Picture of the Day",
    group(ArgGroup::new("action").args(["date", "info", "list", "verify"]).multiple(false))
)]
pub struct Cli {
    /// Date to cache as YYYY-MM-DD (default: today)
    #[arg(value_name = "DATE", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Print title, explanation and path of a record
    #[arg(long, value_name = "ID", value_parser = clap::value_parser!(i64).range(1..))]
    pub info: Option<RecordId>,

    /// Print the titles of every cached APOD
    #[arg(long)]
    pub list: bool,

    /// Check a record's file against its stored hash
    #[arg(long, value_name = "ID", value_parser = clap::value_parser!(i64).range(1..))]
    pub verify: Option<RecordId>,
}

/// What the binary was asked to do.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Cache { date: Option<NaiveDate> },
    Info { id: RecordId },
    List,
    Verify { id: RecordId },
}

impl Cli {
    pub fn action(&self) -> Command {
        if let Some(id) = self.info {
            Command::Info { id }
        } else if let Some(id) = self.verify {
            Command::Verify { id }
        } else if self.list {
            Command::List
        } else {
            Command::Cache { date: self.date }
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| format!("invalid date '{value}', expected YYYY-MM-DD"))
}
