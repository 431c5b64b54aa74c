//! PT/class schedules and the reservation approval workflow.
//!
//! A reservation holds a seat from the moment it is requested: `booked` on a
//! schedule always equals the number of its pending or approved reservations
//! and never exceeds `capacity`. Every status change goes through
//! [`transition`], which rejects anything [`ReservationStatus::can_transition_to`]
//! does not allow and releases the seat when a reservation stops being active.

use crate::errors::{DomainError, DomainResult};
use crate::members::csv_row;
use crate::models::{
    AppData, MemberStatus, NewSchedule, Reservation, ReservationStatus, ReservationView, Schedule,
    ScheduleFilter, ScheduleStats, ScheduleType, ScheduleUpdate, ScheduleView,
};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

const SCHEDULE_NOT_FOUND: &str = "일정을 찾을 수 없습니다.";
const RESERVATION_NOT_FOUND: &str = "예약을 찾을 수 없습니다.";

/// Who is asking to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin,
    Member(u64),
}

/// Turns raw filter input into typed filters; blank and `all` mean no filter.
pub fn parse_filter(filter: &ScheduleFilter) -> DomainResult<(Option<NaiveDate>, Option<ScheduleType>)> {
    let date = match filter.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| DomainError::invalid("날짜 형식이 올바르지 않습니다."))?,
        ),
    };
    let kind = match filter.kind.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            ScheduleType::parse(raw).ok_or_else(|| DomainError::invalid("일정 유형이 올바르지 않습니다."))?,
        ),
    };
    Ok((date, kind))
}

pub fn list(data: &AppData, date: Option<NaiveDate>, kind: Option<ScheduleType>) -> Vec<ScheduleView> {
    let mut schedules: Vec<&Schedule> = data
        .schedules
        .iter()
        .filter(|s| date.is_none_or(|date| s.date == date))
        .filter(|s| kind.is_none_or(|kind| s.kind == kind))
        .collect();
    schedules.sort_by_key(|s| (s.date, s.start_time, s.id));
    schedules.into_iter().map(ScheduleView::from).collect()
}

pub fn get(data: &AppData, id: u64) -> DomainResult<Schedule> {
    data.schedule(id)
        .cloned()
        .ok_or_else(|| DomainError::not_found(SCHEDULE_NOT_FOUND))
}

fn schedule_mut(data: &mut AppData, id: u64) -> DomainResult<&mut Schedule> {
    data.schedules
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| DomainError::not_found(SCHEDULE_NOT_FOUND))
}

fn validate_schedule(schedule: &Schedule) -> DomainResult<()> {
    let mut errors = crate::validation::Errors::default();
    errors.check(crate::validation::rules::required(&schedule.title, "일정 제목"));
    if schedule.capacity == 0 {
        errors.push("정원은 1명 이상이어야 합니다.");
    }
    if schedule.end_time <= schedule.start_time {
        errors.push("종료 시간은 시작 시간 이후여야 합니다.");
    }
    errors.into_result()
}

pub fn create(data: &mut AppData, input: NewSchedule) -> DomainResult<Schedule> {
    let mut schedule = Schedule {
        id: 0,
        title: input.title.trim().to_string(),
        kind: input.kind,
        instructor: input.instructor.trim().to_string(),
        date: input.date,
        start_time: input.start_time,
        end_time: input.end_time,
        capacity: input.capacity,
        booked: 0,
    };
    validate_schedule(&schedule)?;
    schedule.id = data.sequences.next_schedule();
    data.schedules.push(schedule.clone());
    info!(schedule_id = schedule.id, title = %schedule.title, "schedule created");
    Ok(schedule)
}

pub fn update(data: &mut AppData, id: u64, input: ScheduleUpdate) -> DomainResult<Schedule> {
    let mut next = get(data, id)?;
    if let Some(title) = input.title {
        next.title = title.trim().to_string();
    }
    if let Some(kind) = input.kind {
        next.kind = kind;
    }
    if let Some(instructor) = input.instructor {
        next.instructor = instructor.trim().to_string();
    }
    if let Some(date) = input.date {
        next.date = date;
    }
    if let Some(start) = input.start_time {
        next.start_time = start;
    }
    if let Some(end) = input.end_time {
        next.end_time = end;
    }
    if let Some(capacity) = input.capacity {
        next.capacity = capacity;
    }
    validate_schedule(&next)?;
    if next.capacity < next.booked {
        return Err(DomainError::conflict("예약 인원보다 적게 정원을 줄일 수 없습니다."));
    }
    let slot = schedule_mut(data, id)?;
    *slot = next.clone();
    info!(schedule_id = id, "schedule updated");
    Ok(next)
}

/// Removes a schedule; its pending and approved reservations become
/// cancelled.
pub fn delete(data: &mut AppData, id: u64, now: NaiveDateTime) -> DomainResult<Schedule> {
    let index = data
        .schedules
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| DomainError::not_found(SCHEDULE_NOT_FOUND))?;
    let mut cancelled = 0;
    for reservation in data
        .reservations
        .iter_mut()
        .filter(|r| r.schedule_id == id && r.status.is_active())
    {
        reservation.status = ReservationStatus::Cancelled;
        reservation.decided_at = Some(now);
        cancelled += 1;
    }
    let schedule = data.schedules.remove(index);
    info!(schedule_id = id, cancelled, "schedule deleted");
    Ok(schedule)
}

/// Books a seat for `member_id`. The reservation starts out pending and
/// holds its seat until it is rejected or cancelled.
pub fn reserve(
    data: &mut AppData,
    member_id: u64,
    schedule_id: u64,
    now: NaiveDateTime,
) -> DomainResult<Reservation> {
    let member = data
        .member(member_id)
        .cloned()
        .ok_or_else(|| DomainError::not_found("회원을 찾을 수 없습니다."))?;
    if member.status_on(now.date()) != MemberStatus::Active {
        return Err(DomainError::Forbidden(
            "유효한 회원권이 있어야 예약할 수 있습니다.".to_string(),
        ));
    }

    let schedule = get(data, schedule_id)?;
    if schedule.starts_at() <= now {
        return Err(DomainError::invalid("이미 시작된 일정은 예약할 수 없습니다."));
    }
    let duplicate = data
        .reservations
        .iter()
        .any(|r| r.schedule_id == schedule_id && r.member_id == member_id && r.status.is_active());
    if duplicate {
        return Err(DomainError::conflict("이미 예약한 일정입니다."));
    }
    if schedule.available() == 0 {
        warn!(schedule_id, member_id, "reservation refused: schedule full");
        return Err(DomainError::conflict("정원이 마감되었습니다."));
    }

    schedule_mut(data, schedule_id)?.booked += 1;
    let reservation = Reservation {
        id: data.sequences.next_reservation(),
        schedule_id,
        member_id,
        member_name: member.name,
        status: ReservationStatus::Pending,
        reserved_at: now,
        decided_at: None,
    };
    data.reservations.push(reservation.clone());
    info!(reservation_id = reservation.id, schedule_id, member_id, "reservation requested");
    Ok(reservation)
}

fn transition(
    data: &mut AppData,
    id: u64,
    next: ReservationStatus,
    now: NaiveDateTime,
) -> DomainResult<Reservation> {
    let index = data
        .reservations
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| DomainError::not_found(RESERVATION_NOT_FOUND))?;
    let current = data.reservations[index].status;
    if !current.can_transition_to(next) {
        return Err(DomainError::conflict(format!(
            "{} 상태의 예약은 {} 처리할 수 없습니다.",
            current.label(),
            next.label()
        )));
    }

    let schedule_id = data.reservations[index].schedule_id;
    if next == ReservationStatus::Approved {
        let schedule = data
            .schedule(schedule_id)
            .ok_or_else(|| DomainError::not_found(SCHEDULE_NOT_FOUND))?;
        if schedule.booked > schedule.capacity {
            return Err(DomainError::conflict("정원이 초과되었습니다."));
        }
    }
    if current.is_active() && !next.is_active() {
        if let Some(schedule) = data.schedules.iter_mut().find(|s| s.id == schedule_id) {
            schedule.booked = schedule.booked.saturating_sub(1);
        }
    }

    let reservation = &mut data.reservations[index];
    reservation.status = next;
    reservation.decided_at = Some(now);
    info!(
        reservation_id = id,
        from = current.as_str(),
        to = next.as_str(),
        "reservation status changed"
    );
    Ok(reservation.clone())
}

pub fn approve(data: &mut AppData, id: u64, now: NaiveDateTime) -> DomainResult<Reservation> {
    transition(data, id, ReservationStatus::Approved, now)
}

pub fn reject(data: &mut AppData, id: u64, now: NaiveDateTime) -> DomainResult<Reservation> {
    transition(data, id, ReservationStatus::Rejected, now)
}

/// Members may only cancel their own reservations; admins may cancel any.
pub fn cancel(data: &mut AppData, id: u64, actor: Actor, now: NaiveDateTime) -> DomainResult<Reservation> {
    let reservation = get_reservation(data, id)?;
    if let Actor::Member(member_id) = actor {
        if reservation.member_id != member_id {
            return Err(DomainError::forbidden());
        }
    }
    transition(data, id, ReservationStatus::Cancelled, now)
}

/// Cancels every active reservation of a member, freeing the seats.
pub fn release_member_reservations(data: &mut AppData, member_id: u64, now: NaiveDateTime) {
    let ids: Vec<u64> = data
        .reservations
        .iter()
        .filter(|r| r.member_id == member_id && r.status.is_active())
        .map(|r| r.id)
        .collect();
    for id in ids {
        if let Err(err) = transition(data, id, ReservationStatus::Cancelled, now) {
            warn!(reservation_id = id, "failed to release reservation: {err}");
        }
    }
}

pub fn get_reservation(data: &AppData, id: u64) -> DomainResult<Reservation> {
    data.reservations
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .ok_or_else(|| DomainError::not_found(RESERVATION_NOT_FOUND))
}

pub fn view(data: &AppData, reservation: &Reservation) -> ReservationView {
    let schedule = data.schedule(reservation.schedule_id);
    ReservationView {
        reservation: reservation.clone(),
        title: schedule
            .map(|s| s.title.clone())
            .unwrap_or_else(|| "삭제된 일정".to_string()),
        kind: schedule.map(|s| s.kind),
        instructor: schedule.map(|s| s.instructor.clone()).unwrap_or_default(),
        date: schedule.map(|s| s.date),
        time: schedule.map(Schedule::time_range).unwrap_or_default(),
    }
}

/// Every reservation, newest first, optionally by status.
pub fn list_reservations(data: &AppData, status: Option<ReservationStatus>) -> Vec<ReservationView> {
    let mut reservations: Vec<&Reservation> = data
        .reservations
        .iter()
        .filter(|r| status.is_none_or(|status| r.status == status))
        .collect();
    reservations.sort_by(|a, b| b.reserved_at.cmp(&a.reserved_at).then(b.id.cmp(&a.id)));
    reservations.into_iter().map(|r| view(data, r)).collect()
}

pub fn member_reservations(data: &AppData, member_id: u64) -> Vec<ReservationView> {
    let mut reservations: Vec<&Reservation> = data
        .reservations
        .iter()
        .filter(|r| r.member_id == member_id)
        .collect();
    reservations.sort_by(|a, b| b.reserved_at.cmp(&a.reserved_at).then(b.id.cmp(&a.id)));
    reservations.into_iter().map(|r| view(data, r)).collect()
}

/// Active reservations of a member whose session has not started yet.
pub fn upcoming(data: &AppData, member_id: u64, now: NaiveDateTime) -> Vec<ReservationView> {
    let mut items: Vec<(NaiveDateTime, ReservationView)> = data
        .reservations
        .iter()
        .filter(|r| r.member_id == member_id && r.status.is_active())
        .filter_map(|r| {
            let schedule = data.schedule(r.schedule_id)?;
            (schedule.starts_at() >= now).then(|| (schedule.starts_at(), view(data, r)))
        })
        .collect();
    items.sort_by_key(|(starts_at, _)| *starts_at);
    items.into_iter().map(|(_, view)| view).collect()
}

fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (start, start + Duration::days(6))
}

pub fn stats(data: &AppData, today: NaiveDate) -> ScheduleStats {
    let (week_start, week_end) = week_bounds(today);
    let this_week: Vec<&Schedule> = data
        .schedules
        .iter()
        .filter(|s| s.date >= week_start && s.date <= week_end)
        .collect();
    let booked: u64 = this_week.iter().map(|s| u64::from(s.booked)).sum();
    let capacity: u64 = this_week.iter().map(|s| u64::from(s.capacity)).sum();

    ScheduleStats {
        today_schedules: data.schedules.iter().filter(|s| s.date == today).count(),
        weekly_reservations: data
            .reservations
            .iter()
            .filter(|r| r.status.is_active())
            .filter(|r| this_week.iter().any(|s| s.id == r.schedule_id))
            .count(),
        pending_reservations: data
            .reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Pending)
            .count(),
        booking_rate: crate::format::percentage(booked, capacity),
    }
}

pub fn export_csv(data: &AppData) -> String {
    let mut out = csv_row(&[
        "일정 ID".into(),
        "일정 제목".into(),
        "유형".into(),
        "강사".into(),
        "날짜".into(),
        "시간".into(),
        "정원".into(),
        "예약 수".into(),
    ]);
    for view in list(data, None, None) {
        let s = &view.schedule;
        out.push_str(&csv_row(&[
            s.id.to_string(),
            s.title.clone(),
            s.kind.label().to_string(),
            s.instructor.clone(),
            s.date.to_string(),
            s.time_range(),
            s.capacity.to_string(),
            s.booked.to_string(),
        ]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMember;
    use crate::seed::seed_data_at;
    use chrono::NaiveTime;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn member(data: &AppData, name: &str) -> u64 {
        data.members.iter().find(|m| m.name == name).unwrap().id
    }

    fn schedule_named(data: &AppData, title: &str) -> u64 {
        data.schedules.iter().find(|s| s.title == title).unwrap().id
    }

    fn add_members(data: &mut AppData, count: usize) -> Vec<u64> {
        (0..count)
            .map(|i| {
                crate::members::create(
                    data,
                    NewMember {
                        name: format!("회원{i}"),
                        phone: "01012341234".into(),
                        ..NewMember::default()
                    },
                    now().date(),
                )
                .unwrap()
                .id
            })
            .collect()
    }

    fn assert_invariant(data: &AppData) {
        for schedule in &data.schedules {
            let held = data
                .reservations
                .iter()
                .filter(|r| r.schedule_id == schedule.id && r.status.is_active())
                .count() as u32;
            assert_eq!(schedule.booked, held, "schedule {}", schedule.id);
            assert!(schedule.booked <= schedule.capacity);
        }
    }

    #[test]
    fn reserve_holds_a_seat_while_pending() {
        let mut data = seed_data_at(now());
        let kim = member(&data, "김회원");
        let pilates = schedule_named(&data, "필라테스 그룹");
        let reservation = reserve(&mut data, kim, pilates, now()).unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(data.schedule(pilates).unwrap().booked, 1);
        assert_invariant(&data);
    }

    #[test]
    fn full_schedule_refuses_bookings() {
        let mut data = seed_data_at(now());
        let pt = schedule_named(&data, "개인 PT");
        let ids = add_members(&mut data, 2);
        reserve(&mut data, ids[0], pt, now()).unwrap();
        assert_eq!(data.schedule(pt).unwrap().available(), 0);
        let err = reserve(&mut data, ids[1], pt, now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_invariant(&data);
    }

    #[test]
    fn duplicate_reservation_is_refused() {
        let mut data = seed_data_at(now());
        let kim = member(&data, "김회원");
        let yoga = schedule_named(&data, "오전 요가");
        let err = reserve(&mut data, kim, yoga, now()).unwrap_err();
        assert_eq!(err.to_string(), "이미 예약한 일정입니다.");
    }

    #[test]
    fn expired_member_cannot_book() {
        let mut data = seed_data_at(now());
        let sujin = member(&data, "이수진");
        let yoga = schedule_named(&data, "오전 요가");
        assert!(matches!(
            reserve(&mut data, sujin, yoga, now()).unwrap_err(),
            DomainError::Forbidden(_)
        ));
    }

    #[test]
    fn started_schedule_cannot_be_booked() {
        let mut data = seed_data_at(now());
        let kim = member(&data, "김회원");
        let pilates = schedule_named(&data, "필라테스 그룹");
        let later = data.schedule(pilates).unwrap().starts_at();
        assert!(matches!(
            reserve(&mut data, kim, pilates, later).unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn approval_workflow_transitions() {
        let mut data = seed_data_at(now());
        let kim = member(&data, "김회원");
        let pilates = schedule_named(&data, "필라테스 그룹");
        let reservation = reserve(&mut data, kim, pilates, now()).unwrap();

        let approved = approve(&mut data, reservation.id, now()).unwrap();
        assert_eq!(approved.status, ReservationStatus::Approved);
        assert!(approved.decided_at.is_some());
        assert_eq!(data.schedule(pilates).unwrap().booked, 1);

        assert!(matches!(
            reject(&mut data, reservation.id, now()).unwrap_err(),
            DomainError::Conflict(_)
        ));

        let cancelled = cancel(&mut data, reservation.id, Actor::Member(kim), now()).unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(data.schedule(pilates).unwrap().booked, 0);

        assert!(cancel(&mut data, reservation.id, Actor::Member(kim), now()).is_err());
        assert_invariant(&data);
    }

    #[test]
    fn reject_releases_the_seat() {
        let mut data = seed_data_at(now());
        let yoga = schedule_named(&data, "오전 요가");
        let pending = data
            .reservations
            .iter()
            .find(|r| r.status == ReservationStatus::Pending)
            .unwrap()
            .id;
        let before = data.schedule(yoga).unwrap().booked;
        reject(&mut data, pending, now()).unwrap();
        assert_eq!(data.schedule(yoga).unwrap().booked, before - 1);
        assert_invariant(&data);
    }

    #[test]
    fn members_cannot_cancel_others() {
        let mut data = seed_data_at(now());
        let minji = member(&data, "김민지");
        let kim_reservation = data
            .reservations
            .iter()
            .find(|r| r.member_id == member(&data, "김회원"))
            .unwrap()
            .id;
        assert!(matches!(
            cancel(&mut data, kim_reservation, Actor::Member(minji), now()).unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(cancel(&mut data, kim_reservation, Actor::Admin, now()).is_ok());
    }

    #[test]
    fn capacity_cannot_drop_below_bookings() {
        let mut data = seed_data_at(now());
        let yoga = schedule_named(&data, "오전 요가");
        let err = update(
            &mut data,
            yoga,
            ScheduleUpdate {
                capacity: Some(1),
                ..ScheduleUpdate::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn deleting_a_schedule_cancels_its_reservations() {
        let mut data = seed_data_at(now());
        let yoga = schedule_named(&data, "오전 요가");
        delete(&mut data, yoga, now()).unwrap();
        assert!(
            data.reservations
                .iter()
                .filter(|r| r.schedule_id == yoga)
                .all(|r| r.status == ReservationStatus::Cancelled)
        );
        let views = list_reservations(&data, Some(ReservationStatus::Cancelled));
        assert!(views.iter().all(|v| v.title == "삭제된 일정"));
    }

    #[test]
    fn create_validates_times_and_capacity() {
        let mut data = seed_data_at(now());
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let err = create(
            &mut data,
            NewSchedule {
                title: "".into(),
                kind: ScheduleType::Pt,
                instructor: "박트레이너".into(),
                date: now().date(),
                start_time: nine,
                end_time: nine,
                capacity: 0,
            },
        )
        .unwrap_err();
        match err {
            DomainError::Validation(messages) => assert_eq!(messages.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn list_filters_by_date_and_type() {
        let data = seed_data_at(now());
        let tomorrow = now().date() + Duration::days(1);
        let (date, kind) = parse_filter(&ScheduleFilter {
            date: Some(tomorrow.to_string()),
            kind: Some("강습".into()),
        })
        .unwrap();
        let views = list(&data, date, kind);
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.schedule.kind == ScheduleType::Class));
        assert_eq!(views[0].schedule.title, "오전 요가");

        let (date, kind) = parse_filter(&ScheduleFilter {
            date: Some(String::new()),
            kind: Some("all".into()),
        })
        .unwrap();
        assert_eq!(list(&data, date, kind).len(), 3);
        assert!(parse_filter(&ScheduleFilter { date: Some("01/02".into()), kind: None }).is_err());
    }

    #[test]
    fn stats_count_this_week() {
        let data = seed_data_at(now());
        // 2026-01-05 is a Monday, so every seeded schedule falls in this week.
        let stats = stats(&data, now().date());
        assert_eq!(stats.today_schedules, 0);
        assert_eq!(stats.weekly_reservations, 2);
        assert_eq!(stats.pending_reservations, 1);
        assert_eq!(stats.booking_rate, crate::format::percentage(2, 19));
    }

    #[test]
    fn upcoming_lists_active_future_sessions() {
        let data = seed_data_at(now());
        let kim = member(&data, "김회원");
        let upcoming = upcoming(&data, kim, now());
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "오전 요가");
        assert_eq!(upcoming[0].time, "09:00-10:00");
    }

    #[test]
    fn lapsed_membership_cannot_book() {
        let mut data = seed_data_at(now());
        let kim = member(&data, "김회원");
        let pilates = schedule_named(&data, "필라테스 그룹");
        let end = data.member(kim).unwrap().membership_end.unwrap();
        let later = (end + Duration::days(5)).and_hms_opt(10, 0, 0).unwrap();
        if let Some(schedule) = data.schedules.iter_mut().find(|s| s.id == pilates) {
            schedule.date = later.date() + Duration::days(1);
        }
        assert_eq!(data.member(kim).unwrap().status, MemberStatus::Active);

        let err = reserve(&mut data, kim, pilates, later).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(data.schedule(pilates).unwrap().booked, 0);
        assert_invariant(&data);
    }
}
