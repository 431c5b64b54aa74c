use crate::errors::{DomainError, DomainResult};
use crate::members::csv_row;
use crate::models::{AppData, AttendanceRecord, AttendanceStats, MemberStatus, MonthlyAttendance};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use tracing::info;

pub fn check_in(data: &mut AppData, member_id: u64, now: NaiveDateTime) -> DomainResult<AttendanceRecord> {
    let member = data
        .member(member_id)
        .ok_or_else(|| DomainError::not_found("회원을 찾을 수 없습니다."))?;
    if member.status_on(now.date()) != MemberStatus::Active {
        return Err(DomainError::Forbidden(
            "유효한 회원권이 있어야 출석할 수 있습니다.".to_string(),
        ));
    }
    let member_name = member.name.clone();
    if data.attendance.iter().any(|r| r.member_id == member_id && r.is_open()) {
        return Err(DomainError::conflict("이미 입장 처리되었습니다."));
    }

    let record = AttendanceRecord {
        id: data.sequences.next_attendance(),
        member_id,
        member_name,
        date: now.date(),
        check_in: now,
        check_out: None,
        duration: None,
    };
    data.attendance.push(record.clone());
    info!(attendance_id = record.id, member_id, "checked in");
    Ok(record)
}

pub fn check_out(data: &mut AppData, member_id: u64, now: NaiveDateTime) -> DomainResult<AttendanceRecord> {
    let record = data
        .attendance
        .iter_mut()
        .find(|r| r.member_id == member_id && r.is_open())
        .ok_or_else(|| DomainError::conflict("입장 기록이 없습니다."))?;
    let minutes = (now - record.check_in).num_minutes().max(0);
    record.check_out = Some(now);
    record.duration = Some(minutes);
    info!(attendance_id = record.id, member_id, minutes, "checked out");
    Ok(record.clone())
}

/// The member's open record, if they are currently inside.
pub fn open_record(data: &AppData, member_id: u64) -> Option<&AttendanceRecord> {
    data.attendance.iter().find(|r| r.member_id == member_id && r.is_open())
}

pub fn by_date(data: &AppData, date: NaiveDate) -> Vec<AttendanceRecord> {
    let mut records: Vec<AttendanceRecord> = data
        .attendance
        .iter()
        .filter(|r| r.date == date)
        .cloned()
        .collect();
    records.sort_by(|a, b| b.check_in.cmp(&a.check_in));
    records
}

pub fn today(data: &AppData, today: NaiveDate) -> Vec<AttendanceRecord> {
    by_date(data, today)
}

/// Most recent visits first.
pub fn member_history(data: &AppData, member_id: u64, limit: Option<usize>) -> Vec<AttendanceRecord> {
    let mut records: Vec<AttendanceRecord> = data
        .attendance
        .iter()
        .filter(|r| r.member_id == member_id)
        .cloned()
        .collect();
    records.sort_by(|a, b| b.check_in.cmp(&a.check_in));
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Days in a row with a visit, counting back from today, or from yesterday
/// when the member has not come in yet today.
fn consecutive_days(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = if dates.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut streak = 0;
    while dates.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

pub fn member_monthly_stats(
    data: &AppData,
    member_id: u64,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> MonthlyAttendance {
    let visits: Vec<&AttendanceRecord> = data
        .attendance
        .iter()
        .filter(|r| r.member_id == member_id)
        .collect();
    let in_month: Vec<&&AttendanceRecord> = visits
        .iter()
        .filter(|r| r.date.year() == year && r.date.month() == month)
        .collect();
    let attended: BTreeSet<NaiveDate> = in_month.iter().map(|r| r.date).collect();
    let all_dates: BTreeSet<NaiveDate> = visits.iter().map(|r| r.date).collect();
    let total_days = days_in_month(year, month);

    MonthlyAttendance {
        total_days,
        attended_days: attended.len() as u32,
        attendance_rate: crate::format::percentage(attended.len() as u64, u64::from(total_days)),
        consecutive_days: consecutive_days(&all_dates, today),
        total_workout_minutes: in_month.iter().filter_map(|r| r.duration).sum(),
    }
}

fn distinct_members(records: impl Iterator<Item = u64>) -> usize {
    records.collect::<BTreeSet<_>>().len()
}

/// Attendance figures for the admin dashboard. The weekly average is taken
/// over the days of the current week (from Monday) up to today.
pub fn admin_stats(data: &AppData, today: NaiveDate) -> AttendanceStats {
    let today_count = distinct_members(
        data.attendance
            .iter()
            .filter(|r| r.date == today)
            .map(|r| r.member_id),
    );

    let elapsed = today.weekday().num_days_from_monday() + 1;
    let week_start = today - Duration::days(i64::from(elapsed - 1));
    let weekly_visits: usize = (0..elapsed)
        .map(|offset| {
            let day = week_start + Duration::days(i64::from(offset));
            distinct_members(data.attendance.iter().filter(|r| r.date == day).map(|r| r.member_id))
        })
        .sum();
    let weekly_average = (weekly_visits as f64 / f64::from(elapsed) * 10.0).round() / 10.0;

    let monthly_total = data
        .attendance
        .iter()
        .filter(|r| r.date.year() == today.year() && r.date.month() == today.month())
        .count();
    let active = data
        .members
        .iter()
        .filter(|m| m.status_on(today) == MemberStatus::Active)
        .count();

    AttendanceStats {
        today_count,
        weekly_average,
        monthly_total,
        attendance_rate: crate::format::percentage(today_count as u64, active as u64),
    }
}

pub fn export_csv(data: &AppData, date: NaiveDate) -> String {
    let mut out = csv_row(&[
        "회원명".into(),
        "날짜".into(),
        "입장".into(),
        "퇴장".into(),
        "운동시간(분)".into(),
    ]);
    for record in by_date(data, date) {
        out.push_str(&csv_row(&[
            record.member_name.clone(),
            record.date.to_string(),
            crate::format::format_time(record.check_in),
            record.check_out.map(crate::format::format_time).unwrap_or_default(),
            record.duration.map(|m| m.to_string()).unwrap_or_default(),
        ]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_data_at;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn seeded() -> AppData {
        seed_data_at(at(7, 8, 0))
    }

    fn member_id(data: &AppData, name: &str) -> u64 {
        data.members.iter().find(|m| m.name == name).unwrap().id
    }

    #[test]
    fn check_in_then_out_records_minutes() {
        let mut data = seeded();
        let kim = member_id(&data, "김회원");
        check_in(&mut data, kim, at(7, 9, 0)).unwrap();
        assert!(open_record(&data, kim).is_some());

        let err = check_in(&mut data, kim, at(7, 9, 5)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let record = check_out(&mut data, kim, at(7, 10, 30)).unwrap();
        assert_eq!(record.duration, Some(90));
        assert!(open_record(&data, kim).is_none());
        assert!(matches!(
            check_out(&mut data, kim, at(7, 11, 0)).unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn inactive_members_cannot_check_in() {
        let mut data = seeded();
        let sujin = member_id(&data, "이수진");
        assert!(matches!(
            check_in(&mut data, sujin, at(7, 9, 0)).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(matches!(
            check_in(&mut data, 999, at(7, 9, 0)).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn monthly_stats_track_streaks() {
        let mut data = seeded();
        let kim = member_id(&data, "김회원");
        for day in [4, 5, 6] {
            check_in(&mut data, kim, at(day, 9, 0)).unwrap();
            check_out(&mut data, kim, at(day, 10, 0)).unwrap();
        }
        let stats = member_monthly_stats(&data, kim, 2026, 1, at(7, 0, 0).date());
        assert_eq!(stats.total_days, 31);
        assert_eq!(stats.attended_days, 3);
        assert_eq!(stats.attendance_rate, 10);
        assert_eq!(stats.consecutive_days, 3);
        assert_eq!(stats.total_workout_minutes, 180);

        let later = member_monthly_stats(&data, kim, 2026, 1, at(9, 0, 0).date());
        assert_eq!(later.consecutive_days, 0);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn admin_stats_count_distinct_members() {
        let mut data = seeded();
        let kim = member_id(&data, "김회원");
        let minji = member_id(&data, "김민지");
        // 2026-01-05 is Monday; today is Wednesday the 7th.
        check_in(&mut data, kim, at(5, 9, 0)).unwrap();
        check_out(&mut data, kim, at(5, 10, 0)).unwrap();
        check_in(&mut data, kim, at(7, 9, 0)).unwrap();
        check_out(&mut data, kim, at(7, 9, 30)).unwrap();
        check_in(&mut data, kim, at(7, 18, 0)).unwrap();
        check_in(&mut data, minji, at(7, 18, 0)).unwrap();

        let stats = admin_stats(&data, at(7, 0, 0).date());
        assert_eq!(stats.today_count, 2);
        assert_eq!(stats.monthly_total, 4);
        assert_eq!(stats.weekly_average, 1.0);
        assert_eq!(stats.attendance_rate, 100);

        let history = member_history(&data, kim, Some(2));
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].check_in, at(7, 18, 0));

        let csv = export_csv(&data, at(7, 0, 0).date());
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.contains("김민지,2026-01-07,18:00,,"));
    }

    #[test]
    fn lapsed_membership_cannot_check_in() {
        let mut data = seeded();
        let kim = member_id(&data, "김회원");
        let end = data.member(kim).unwrap().membership_end.unwrap();
        let later = (end + Duration::days(5)).and_hms_opt(10, 0, 0).unwrap();

        assert!(matches!(
            check_in(&mut data, kim, later).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(open_record(&data, kim).is_none());
        assert!(check_in(&mut data, kim, end.and_hms_opt(10, 0, 0).unwrap()).is_ok());
    }
}
