use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use crashdump_core::platform::Clock;
use crashdump_core::timestamp::Timestamp;

/// Parses `YYYY-MM-DD HH:MM:SS` into an RTC timestamp.
pub fn parse_timestamp(text: &str) -> Result<Timestamp> {
    let parsed = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("invalid timestamp `{text}`"))?;
    Ok(from_datetime(&parsed))
}

fn from_datetime<T: Datelike + Timelike>(value: &T) -> Timestamp {
    // Every field is below 100 after the year is folded into the century.
    let two_digits = |field: u32| u8::try_from(field % 100).unwrap_or_default();
    Timestamp::from_decimal(
        two_digits(value.year().rem_euclid(100).unsigned_abs()),
        two_digits(value.month()),
        two_digits(value.day()),
        two_digits(value.hour()),
        two_digits(value.minute()),
        two_digits(value.second()),
    )
}

/// Host wall clock, or a pinned time for reproducible dumps.
pub struct HostClock {
    fixed: Option<Timestamp>,
}

impl HostClock {
    pub fn system() -> Self {
        Self { fixed: None }
    }

    pub fn fixed(timestamp: Timestamp) -> Self {
        Self {
            fixed: Some(timestamp),
        }
    }
}

impl Clock for HostClock {
    fn now(&mut self) -> Timestamp {
        self.fixed
            .unwrap_or_else(|| from_datetime(&Local::now().naive_local()))
    }
}
