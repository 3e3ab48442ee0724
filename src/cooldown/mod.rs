use crate::configuration::GameConfig;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Ready,
    Waiting { remaining_seconds: i64 },
}

pub struct CooldownGate {
    enforce: bool,
    cooldown_seconds: i64,
}

impl CooldownGate {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            enforce: config.enforce_cooldown,
            cooldown_seconds: config.cooldown_seconds,
        }
    }

    pub fn cooldown_seconds(&self) -> i64 {
        self.cooldown_seconds
    }

    /// Decides whether a user may change their value again. A stored
    /// timestamp that fails to parse allows the request: rate limiting is a
    /// convenience, not a security boundary.
    pub fn check(&self, last_change: Option<&str>, now: DateTime<Utc>) -> CooldownState {
        if !self.enforce {
            return CooldownState::Ready;
        }
        let Some(raw) = last_change else {
            return CooldownState::Ready;
        };
        let last = match parse_stored_timestamp(raw) {
            Ok(ts) => ts,
            Err(e) => {
                warn!("Could not parse last change timestamp '{}': {}", raw, e);
                return CooldownState::Ready;
            }
        };
        let elapsed = (now - last).num_seconds();
        if elapsed >= self.cooldown_seconds {
            CooldownState::Ready
        } else {
            CooldownState::Waiting {
                remaining_seconds: self.cooldown_seconds - elapsed,
            }
        }
    }
}

/// SQLite CURRENT_TIMESTAMP stores 'YYYY-MM-DD HH:MM:SS' in UTC; RFC 3339
/// values are accepted as a fallback.
pub fn parse_stored_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
}

/// Formats a remaining wait as 'H:MM'. Minutes round up when leftover
/// seconds exist; a full 60 minutes after rounding carries into the hour.
pub fn format_remaining(seconds_total: i64) -> String {
    let seconds_total = seconds_total.max(0);
    let mut hours = seconds_total / 3600;
    let leftover = seconds_total % 3600;
    let mut minutes = if leftover > 0 { (leftover + 59) / 60 } else { 0 };
    if minutes == 60 {
        hours += 1;
        minutes = 0;
    }
    format!("{}:{:02}", hours, minutes)
}
