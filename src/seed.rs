use crate::auth::hash_password;
use crate::config::DEFAULT_MEMBERSHIP_TYPES;
use crate::models::{
    AppData, Member, MemberStatus, MembershipType, Payment, PaymentStatus, Reservation,
    ReservationStatus, Role, Schedule, ScheduleType, User,
};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::error;

pub fn seed_data() -> AppData {
    seed_data_at(Local::now().naive_local())
}

/// Demo data for a fresh install: the default membership types, one admin,
/// one member login and a few members, schedules and reservations around
/// `now`.
pub fn seed_data_at(now: NaiveDateTime) -> AppData {
    let today = now.date();
    let mut data = AppData::default();

    for (name, duration, price) in DEFAULT_MEMBERSHIP_TYPES {
        let id = data.sequences.next_membership_type();
        data.membership_types.push(MembershipType {
            id,
            name: name.to_string(),
            duration,
            price,
        });
    }

    let kim = add_member(&mut data, "김회원", "01012345678", today - Duration::days(30));
    let minji = add_member(&mut data, "김민지", "01023456789", today - Duration::days(10));
    let sujin = add_member(&mut data, "이수진", "01034567890", today - Duration::days(120));
    add_member(&mut data, "박지은", "01045678901", today - Duration::days(5));

    if let Some(member) = data.member_mut(kim) {
        member.email = Some("member1@example.com".to_string());
        member.birth_date = NaiveDate::from_ymd_opt(1990, 1, 1);
        member.gender = Some("여성".to_string());
        member.address = Some("서울시 강남구".to_string());
    }

    add_paid_membership(&mut data, kim, 2, today - Duration::days(30));
    add_paid_membership(&mut data, minji, 1, today - Duration::days(10));
    add_paid_membership(&mut data, sujin, 1, today - Duration::days(120));
    if let Some(member) = data.member_mut(sujin) {
        member.status = MemberStatus::Expired;
    }

    add_user(&mut data, "admin", "admin123", "관리자", Role::Admin, None);
    add_user(&mut data, "member1", "member123", "김회원", Role::Member, Some(kim));

    let tomorrow = today + Duration::days(1);
    let yoga = add_schedule(&mut data, "오전 요가", ScheduleType::Class, "김강사", tomorrow, (9, 0), (10, 0), 10);
    add_schedule(&mut data, "필라테스 그룹", ScheduleType::Class, "이강사", tomorrow, (14, 0), (15, 0), 8);
    add_schedule(&mut data, "개인 PT", ScheduleType::Pt, "박트레이너", today + Duration::days(2), (10, 30), (11, 30), 1);

    add_reservation(&mut data, yoga, kim, ReservationStatus::Approved, now - Duration::hours(20));
    add_reservation(&mut data, yoga, minji, ReservationStatus::Pending, now - Duration::hours(2));

    data
}

fn add_member(data: &mut AppData, name: &str, phone: &str, join_date: NaiveDate) -> u64 {
    let id = data.sequences.next_member();
    data.members.push(Member {
        id,
        name: name.to_string(),
        phone: crate::validation::format_phone(phone),
        email: None,
        birth_date: None,
        gender: None,
        address: None,
        membership_type: None,
        join_date,
        membership_start: None,
        membership_end: None,
        status: MemberStatus::Inactive,
    });
    id
}

fn add_paid_membership(data: &mut AppData, member_id: u64, type_id: u64, start: NaiveDate) {
    let Some(kind) = data.membership_type(type_id).cloned() else {
        return;
    };
    let end = start + Duration::days(i64::from(kind.duration));
    let Some(member) = data.member_mut(member_id) else {
        return;
    };
    member.membership_type = Some(kind.name.clone());
    member.membership_start = Some(start);
    member.membership_end = Some(end);
    member.status = MemberStatus::Active;
    let member_name = member.name.clone();

    let id = data.sequences.next_payment();
    data.payments.push(Payment {
        id,
        member_id,
        member_name,
        membership_type_id: kind.id,
        type_name: kind.name,
        amount: kind.price,
        paid_date: start,
        start_date: start,
        end_date: end,
        status: PaymentStatus::Completed,
    });
}

fn add_user(
    data: &mut AppData,
    username: &str,
    password: &str,
    name: &str,
    role: Role,
    member_id: Option<u64>,
) {
    let password_hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(err) => {
            error!(username, "failed to hash seed password: {err}");
            return;
        }
    };
    let email = member_id
        .and_then(|id| data.member(id))
        .and_then(|member| member.email.clone())
        .or_else(|| Some(format!("{username}@fitlady.com")));
    let id = data.sequences.next_user();
    data.users.push(User {
        id,
        username: username.to_string(),
        password_hash,
        name: name.to_string(),
        role,
        email,
        member_id,
    });
}

#[allow(clippy::too_many_arguments)]
fn add_schedule(
    data: &mut AppData,
    title: &str,
    kind: ScheduleType,
    instructor: &str,
    date: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
    capacity: u32,
) -> u64 {
    let id = data.sequences.next_schedule();
    data.schedules.push(Schedule {
        id,
        title: title.to_string(),
        kind,
        instructor: instructor.to_string(),
        date,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap_or(NaiveTime::MIN),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap_or(NaiveTime::MIN),
        capacity,
        booked: 0,
    });
    id
}

fn add_reservation(
    data: &mut AppData,
    schedule_id: u64,
    member_id: u64,
    status: ReservationStatus,
    reserved_at: NaiveDateTime,
) {
    let Some(member_name) = data.member(member_id).map(|member| member.name.clone()) else {
        return;
    };
    if let Some(schedule) = data.schedules.iter_mut().find(|s| s.id == schedule_id) {
        if status.is_active() {
            schedule.booked += 1;
        }
    }
    let id = data.sequences.next_reservation();
    data.reservations.push(Reservation {
        id,
        schedule_id,
        member_id,
        member_name,
        status,
        reserved_at,
        decided_at: (status != ReservationStatus::Pending).then_some(reserved_at),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_bookings_match_reservations() {
        let now = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let data = seed_data_at(now);
        for schedule in &data.schedules {
            let held = data
                .reservations
                .iter()
                .filter(|r| r.schedule_id == schedule.id && r.status.is_active())
                .count() as u32;
            assert_eq!(schedule.booked, held);
            assert!(schedule.booked <= schedule.capacity);
        }
        assert_eq!(data.users.len(), 2);
        assert_eq!(data.members.len(), 4);
    }
}
