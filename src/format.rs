use chrono::{Duration, NaiveDate, NaiveDateTime};

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_date_time(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_time(value: NaiveDateTime) -> String {
    value.format("%H:%M").to_string()
}

/// "방금 전", "5분 전", "3일 전" ...
pub fn relative_time(then: NaiveDateTime, now: NaiveDateTime) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = days / 365;

    if seconds < 60 {
        "방금 전".to_string()
    } else if minutes < 60 {
        format!("{minutes}분 전")
    } else if hours < 24 {
        format!("{hours}시간 전")
    } else if days < 30 {
        format!("{days}일 전")
    } else if months < 12 {
        format!("{months}개월 전")
    } else {
        format!("{years}년 전")
    }
}

pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days().abs()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// `12450000` becomes `12,450,000`.
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_currency(value: u64) -> String {
    format!("{}원", format_number(value))
}

pub fn percentage(value: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((value as f64 / total as f64) * 100.0).round() as u32
}

/// `90` becomes `1시간 30분`.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{m}분"),
        (h, 0) => format!("{h}시간"),
        (h, m) => format!("{h}시간 {m}분"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn currency_uses_thousands_separators() {
        assert_eq!(format_currency(0), "0원");
        assert_eq!(format_currency(1000), "1,000원");
        assert_eq!(format_currency(12_450_000), "12,450,000원");
        assert_eq!(format_number(999), "999");
    }

    #[test]
    fn relative_time_buckets() {
        let now = at(2026, 3, 10, 12, 0);
        assert_eq!(relative_time(at(2026, 3, 10, 11, 59), now), "1분 전");
        assert_eq!(relative_time(now, now), "방금 전");
        assert_eq!(relative_time(at(2026, 3, 10, 9, 0), now), "3시간 전");
        assert_eq!(relative_time(at(2026, 3, 1, 12, 0), now), "9일 전");
        assert_eq!(relative_time(at(2025, 12, 1, 12, 0), now), "3개월 전");
        assert_eq!(relative_time(at(2024, 1, 1, 12, 0), now), "2년 전");
    }

    #[test]
    fn durations_and_percentages() {
        assert_eq!(format_duration(90), "1시간 30분");
        assert_eq!(format_duration(45), "45분");
        assert_eq!(format_duration(120), "2시간");
        assert_eq!(percentage(15, 31), 48);
        assert_eq!(percentage(3, 0), 0);
    }

    #[test]
    fn day_arithmetic() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = add_days(a, 90);
        assert_eq!(format_date(b), "2024-03-31");
        assert_eq!(days_between(b, a), 90);
    }
}
