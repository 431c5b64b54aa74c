use crate::errors::{DomainError, DomainResult};
use crate::models::{AdminDashboard, AppData, MemberDashboard};
use crate::{attendance, members, payments, schedule};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

pub fn admin_dashboard(data: &AppData) -> AdminDashboard {
    admin_dashboard_at(Local::now().date_naive(), data)
}

pub fn admin_dashboard_at(today: NaiveDate, data: &AppData) -> AdminDashboard {
    AdminDashboard {
        members: members::stats(data, today),
        payments: payments::stats(data, today),
        attendance: attendance::admin_stats(data, today),
        schedule: schedule::stats(data, today),
    }
}

pub fn member_dashboard(data: &AppData, member_id: u64) -> DomainResult<MemberDashboard> {
    member_dashboard_at(Local::now().naive_local(), data, member_id)
}

/// Profile, remaining membership, this month's attendance and the sessions
/// the member is booked on.
pub fn member_dashboard_at(now: NaiveDateTime, data: &AppData, member_id: u64) -> DomainResult<MemberDashboard> {
    let today = now.date();
    let member = data
        .member(member_id)
        .cloned()
        .ok_or_else(|| DomainError::not_found("회원 정보를 찾을 수 없습니다."))?;
    Ok(MemberDashboard {
        remaining_days: member.remaining_days(today),
        attendance: attendance::member_monthly_stats(data, member_id, today.year(), today.month(), today),
        upcoming: schedule::upcoming(data, member_id, now),
        member,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_data_at;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn admin_dashboard_aggregates_every_area() {
        let data = seed_data_at(now());
        let dashboard = admin_dashboard_at(now().date(), &data);
        assert_eq!(dashboard.members.total, 4);
        assert_eq!(dashboard.members.active, 2);
        assert_eq!(dashboard.schedule.pending_reservations, 1);
        assert_eq!(dashboard.attendance.today_count, 0);
        assert_eq!(dashboard.payments.new_payments, 0);
    }

    #[test]
    fn member_dashboard_shows_remaining_days() {
        let data = seed_data_at(now());
        let kim = data.members.iter().find(|m| m.name == "김회원").unwrap().id;
        let dashboard = member_dashboard_at(now(), &data, kim).unwrap();
        assert_eq!(dashboard.remaining_days, 60);
        assert_eq!(dashboard.upcoming.len(), 1);
        assert_eq!(dashboard.attendance.total_days, 31);
        assert!(member_dashboard_at(now(), &data, 999).is_err());
    }
}
