use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// How long a toast stays on screen, in milliseconds.
pub const TOAST_DURATION_MS: u64 = 3000;

/// Days before the end of a membership at which it counts as expiring.
pub const EXPIRING_WINDOW_DAYS: i64 = 7;

pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Client-side persisted keys.
pub mod storage_keys {
    pub const AUTH_TOKEN: &str = "fitlady_auth_token";
    pub const REFRESH_TOKEN: &str = "fitlady_refresh_token";
    pub const USER_INFO: &str = "fitlady_user_info";
    pub const USER_MODE: &str = "fitlady_user_mode";
    pub const REMEMBER_ME: &str = "fitlady_remember_me";
}

/// `(name, duration in days, price in won)`
pub const DEFAULT_MEMBERSHIP_TYPES: [(&str, u32, u64); 4] = [
    ("1개월권", 30, 80_000),
    ("3개월권", 90, 210_000),
    ("6개월권", 180, 390_000),
    ("1년권", 365, 720_000),
];

#[derive(Debug, Clone, Copy)]
pub struct OperatingHours {
    pub weekday_start: NaiveTime,
    pub weekday_end: NaiveTime,
    pub weekend_start: NaiveTime,
    pub weekend_end: NaiveTime,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            weekday_start: hm(6, 0),
            weekday_end: hm(22, 0),
            weekend_start: hm(8, 0),
            weekend_end: hm(20, 0),
        }
    }
}

impl OperatingHours {
    pub fn for_weekday(&self, weekday: Weekday) -> (NaiveTime, NaiveTime) {
        match weekday {
            Weekday::Sat | Weekday::Sun => (self.weekend_start, self.weekend_end),
            _ => (self.weekday_start, self.weekday_end),
        }
    }

    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        let (start, end) = self.for_weekday(now.weekday());
        let time = now.time();
        time >= start && time < end
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub session_ttl: chrono::Duration,
    pub remember_ttl: chrono::Duration,
    pub operating_hours: OperatingHours,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/state.json"),
            session_ttl: chrono::Duration::hours(12),
            remember_ttl: chrono::Duration::days(30),
            operating_hours: OperatingHours::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            data_path: env::var("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            session_ttl: env_parse("FITLADY_SESSION_HOURS")
                .map(chrono::Duration::hours)
                .unwrap_or(defaults.session_ttl),
            remember_ttl: env_parse("FITLADY_REMEMBER_DAYS")
                .map(chrono::Duration::days)
                .unwrap_or(defaults.remember_ttl),
            operating_hours: defaults.operating_hours,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    /// Where the client keeps its session keys; `None` keeps them in memory.
    pub state_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            state_path: Some(PathBuf::from("data/client-state.json")),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("FITLADY_API_BASE_URL").unwrap_or(defaults.base_url),
            state_path: env::var("FITLADY_CLIENT_STATE")
                .map(PathBuf::from)
                .ok()
                .or(defaults.state_path),
            ..defaults
        }
    }

    pub fn in_memory(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state_path: None,
            ..Self::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn weekend_hours_are_shorter() {
        let hours = OperatingHours::default();
        // 2026-01-03 is a Saturday.
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert!(!hours.is_open(saturday.and_hms_opt(7, 0, 0).unwrap()));
        assert!(hours.is_open(saturday.and_hms_opt(8, 0, 0).unwrap()));
        assert!(!hours.is_open(saturday.and_hms_opt(20, 0, 0).unwrap()));

        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert!(hours.is_open(monday.and_hms_opt(6, 30, 0).unwrap()));
        assert!(hours.is_open(monday.and_hms_opt(21, 59, 0).unwrap()));
    }
}
