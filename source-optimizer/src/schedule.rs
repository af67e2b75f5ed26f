use crate::types::{OptimizerError, Result};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use std::fmt;

/// When the scheduler runs a fetch + maintenance pass, in local wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Daily { at: NaiveTime },
    Weekly { day: Weekday, at: NaiveTime },
}

impl Schedule {
    pub fn daily(at: &str) -> Result<Self> {
        Ok(Self::Daily {
            at: parse_time_of_day(at)?,
        })
    }

    pub fn weekly(day: &str, at: &str) -> Result<Self> {
        let day = day
            .trim()
            .parse::<Weekday>()
            .map_err(|_| OptimizerError::InvalidSchedule(format!("unknown weekday '{}'", day)))?;
        Ok(Self::Weekly {
            day,
            at: parse_time_of_day(at)?,
        })
    }

    /// First scheduled instant strictly after `now`.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Self::Daily { at } => {
                let candidate = now.date().and_time(at);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(1)
                }
            }
            Self::Weekly { day, at } => {
                let today = now.weekday().num_days_from_monday();
                let target = day.num_days_from_monday();
                let days_ahead = (target + 7 - today) % 7;
                let candidate = (now.date() + Duration::days(days_ahead as i64)).and_time(at);
                if candidate > now {
                    candidate
                } else {
                    candidate + Duration::days(7)
                }
            }
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily { at } => write!(f, "daily at {}", at.format("%H:%M")),
            Self::Weekly { day, at } => write!(f, "every {} at {}", day, at.format("%H:%M")),
        }
    }
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| OptimizerError::InvalidSchedule(format!("expected HH:MM, got '{}'", raw)))
}
