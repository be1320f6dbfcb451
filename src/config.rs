use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::{consumption::EndDatePolicy, db::models::RoomId};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    /// How `--to YYYY-MM-DD` is expanded to an instant.
    /// `inclusive` (default) covers the whole end day, `exclusive` stops at
    /// its midnight.
    pub end_date_policy: EndDatePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: optional("DB_MAX_CONNECTIONS", "10")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            end_date_policy: optional("WINDOW_END_DATE", "inclusive")
                .parse()
                .context("WINDOW_END_DATE must be 'inclusive' or 'exclusive'")?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

// ---------------------------------------------------------------------------
// Report arguments
// ---------------------------------------------------------------------------

/// `--room <id> --from <YYYY-MM-DD> --to <YYYY-MM-DD>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArgs {
    pub room_id: RoomId,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportArgs {
    pub fn parse(args: &[String]) -> Result<Self> {
        let room_id = flag(args, "--room")?
            .parse::<i64>()
            .context("--room must be an integer room id")?;
        Ok(Self {
            room_id: RoomId(room_id),
            from: parse_date(flag(args, "--from")?, "--from")?,
            to: parse_date(flag(args, "--to")?, "--to")?,
        })
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Result<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
        .with_context(|| format!("missing required argument: {name}"))
}

fn parse_date(raw: &str, name: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("{name} must be a date in YYYY-MM-DD format, got: {raw:?}"))
}
