use super::{Notice, layout, stat_cards};
use crate::format::{format_currency, format_date, format_date_time, format_duration, format_time};
use crate::models::{
    AttendanceRecord, MemberDashboard, MonthlyAttendance, Payment, PublicUser, ReservationView,
    ScheduleType, ScheduleView,
};
use chrono::{NaiveDateTime, NaiveTime};
use maud::{Markup, html};

fn reservation_list(reservations: &[ReservationView], cancellable: bool) -> Markup {
    html! {
        @if reservations.is_empty() {
            p.empty { "예약 내역이 없습니다." }
        } @else {
            table {
                thead { tr { th { "일정" } th { "날짜" } th { "시간" } th { "강사" } th { "상태" } th {} } }
                tbody {
                    @for view in reservations {
                        tr {
                            td { (view.title) }
                            td { (view.date.map(format_date).unwrap_or_default()) }
                            td { (view.time) }
                            td { (view.instructor) }
                            td { span class={"badge " (view.reservation.status.as_str())} { (view.reservation.status.label()) } }
                            td {
                                @if cancellable && view.reservation.status.is_active() {
                                    form.inline method="post" action={"/member/reservations/" (view.reservation.id) "/cancel"}
                                        onsubmit="return confirm('예약을 취소하시겠습니까?')" {
                                        button.danger type="submit" { "취소" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn info_page(
    user: &PublicUser,
    dashboard: &MemberDashboard,
    payments: &[Payment],
    notice: Option<&Notice>,
) -> Markup {
    let member = &dashboard.member;
    let content = html! {
        h1 { "내 정보" }
        (stat_cards(&[
            ("회원권", member.membership_type.clone().unwrap_or_else(|| "없음".to_string())),
            ("남은 기간", format!("{}일", dashboard.remaining_days)),
            ("이번 달 출석", format!("{}일", dashboard.attendance.attended_days)),
            ("연속 출석", format!("{}일", dashboard.attendance.consecutive_days)),
        ]))
        section.card {
            h2 { "회원 정보" }
            table {
                tbody {
                    tr { th { "회원번호" } td { (member.code()) } }
                    tr { th { "이름" } td { (member.name) } }
                    tr { th { "연락처" } td { (member.phone) } }
                    tr { th { "이메일" } td { (member.email.as_deref().unwrap_or("-")) } }
                    tr { th { "주소" } td { (member.address.as_deref().unwrap_or("-")) } }
                    tr { th { "가입일" } td { (format_date(member.join_date)) } }
                    tr {
                        th { "이용 기간" }
                        td {
                            @match (member.membership_start, member.membership_end) {
                                (Some(start), Some(end)) => { (format_date(start)) " ~ " (format_date(end)) }
                                _ => { "-" }
                            }
                        }
                    }
                    tr { th { "상태" } td { span class={"badge " (member.status.as_str())} { (member.status.label()) } } }
                }
            }
        }
        section.card {
            h2 { "다가오는 예약" }
            (reservation_list(&dashboard.upcoming, false))
        }
        section.card {
            h2 { "결제 내역" }
            @if payments.is_empty() {
                p.empty { "결제 내역이 없습니다." }
            } @else {
                table {
                    thead { tr { th { "결제일" } th { "회원권" } th { "금액" } th { "기간" } th { "상태" } } }
                    tbody {
                        @for payment in payments {
                            tr {
                                td { (format_date(payment.paid_date)) }
                                td { (payment.type_name) }
                                td { (format_currency(payment.amount)) }
                                td { (format_date(payment.start_date)) " ~ " (format_date(payment.end_date)) }
                                td { (payment.status.label()) }
                            }
                        }
                    }
                }
            }
        }
        section.card {
            h2 { "정보 수정" }
            form.grid method="post" action="/member/info" {
                label { "이름" input type="text" name="name" value=(member.name) required; }
                label { "이메일" input type="email" name="email" value=(member.email.as_deref().unwrap_or_default()); }
                label { "연락처" input type="tel" name="phone" value=(member.phone); }
                label { "주소" input type="text" name="address" value=(member.address.as_deref().unwrap_or_default()); }
                button type="submit" { "저장" }
            }
        }
        section.card {
            h2 { "비밀번호 변경" }
            form.grid method="post" action="/member/password" {
                label { "현재 비밀번호" input type="password" name="current_password" required; }
                label { "새 비밀번호" input type="password" name="new_password" minlength="6" required; }
                label { "새 비밀번호 확인" input type="password" name="confirm_password" minlength="6" required; }
                button type="submit" { "변경" }
            }
        }
        section.card {
            h2 { "회원 탈퇴" }
            p { "탈퇴하면 로그인 정보가 삭제되고 남은 예약이 모두 취소됩니다." }
            form method="post" action="/member/withdraw" onsubmit="return confirm('정말 탈퇴하시겠습니까?')" {
                button.danger type="submit" { "회원 탈퇴" }
            }
        }
    };
    layout("내 정보", Some(user), notice, content)
}

pub struct AttendanceView<'a> {
    pub open: Option<&'a AttendanceRecord>,
    pub monthly: &'a MonthlyAttendance,
    pub history: &'a [AttendanceRecord],
    pub hours: (NaiveTime, NaiveTime),
    pub gym_open: bool,
}

pub fn attendance_page(user: &PublicUser, view: AttendanceView<'_>, notice: Option<&Notice>) -> Markup {
    let (opens, closes) = view.hours;
    let content = html! {
        h1 { "출석" }
        (stat_cards(&[
            ("이번 달 출석", format!("{} / {}일", view.monthly.attended_days, view.monthly.total_days)),
            ("출석률", format!("{}%", view.monthly.attendance_rate)),
            ("연속 출석", format!("{}일", view.monthly.consecutive_days)),
            ("총 운동 시간", format_duration(view.monthly.total_workout_minutes)),
        ]))
        section.card {
            h2 { "오늘 운영 시간" }
            p {
                (opens.format("%H:%M").to_string()) " ~ " (closes.format("%H:%M").to_string())
                @if view.gym_open { " (운영 중)" } @else { " (운영 종료)" }
            }
            @if let Some(record) = view.open {
                p { (format_time(record.check_in)) "에 입장했습니다." }
                form method="post" action="/member/attendance/check-out" {
                    button.secondary type="submit" { "퇴장하기" }
                }
            } @else {
                form method="post" action="/member/attendance/check-in" {
                    button type="submit" { "입장하기" }
                }
            }
        }
        section.card {
            h2 { "최근 출석 기록" }
            @if view.history.is_empty() {
                p.empty { "출석 기록이 없습니다." }
            } @else {
                table {
                    thead { tr { th { "날짜" } th { "입장" } th { "퇴장" } th { "운동 시간" } } }
                    tbody {
                        @for record in view.history {
                            tr {
                                td { (format_date(record.date)) }
                                td { (format_time(record.check_in)) }
                                td { (record.check_out.map(format_time).unwrap_or_else(|| "운동 중".to_string())) }
                                td { (record.duration.map(format_duration).unwrap_or_else(|| "-".to_string())) }
                            }
                        }
                    }
                }
            }
        }
    };
    layout("출석", Some(user), notice, content)
}

pub struct ScheduleBoard<'a> {
    pub schedules: &'a [ScheduleView],
    pub mine: &'a [ReservationView],
    pub date: &'a str,
    pub kind: &'a str,
    pub now: NaiveDateTime,
}

fn booking_cell(item: &ScheduleView, mine: &[ReservationView], now: NaiveDateTime) -> Markup {
    let schedule = &item.schedule;
    let held = mine
        .iter()
        .any(|r| r.reservation.schedule_id == schedule.id && r.reservation.status.is_active());
    html! {
        @if held {
            button.secondary type="button" disabled { "예약됨" }
        } @else if schedule.starts_at() <= now {
            button.secondary type="button" disabled { "종료" }
        } @else if item.available == 0 {
            button type="button" disabled { "마감" }
        } @else {
            form.inline method="post" action="/member/reservations" {
                input type="hidden" name="schedule_id" value=(schedule.id);
                button type="submit" { "예약하기" }
            }
        }
    }
}

pub fn schedule_page(user: &PublicUser, view: ScheduleBoard<'_>, notice: Option<&Notice>) -> Markup {
    let content = html! {
        h1 { "일정 예약" }
        section.card {
            form.grid method="get" action="/member/schedule" {
                label { "날짜" input type="date" name="date" value=(view.date); }
                label {
                    "유형"
                    select name="type" {
                        option value="all" { "전체" }
                        @for kind in [ScheduleType::Class, ScheduleType::Pt] {
                            option value=(kind.label()) selected[view.kind == kind.label()] { (kind.label()) }
                        }
                    }
                }
                button type="submit" { "조회" }
            }
            @if view.schedules.is_empty() {
                p.empty { "예정된 일정이 없습니다." }
            } @else {
                table {
                    thead { tr { th { "날짜" } th { "시간" } th { "제목" } th { "유형" } th { "강사" } th { "잔여석" } th {} } }
                    tbody {
                        @for item in view.schedules {
                            tr {
                                td { (format_date(item.schedule.date)) }
                                td { (item.schedule.time_range()) }
                                td { (item.schedule.title) }
                                td { (item.schedule.kind.label()) }
                                td { (item.schedule.instructor) }
                                td { (item.available) " / " (item.schedule.capacity) }
                                td { (booking_cell(item, view.mine, view.now)) }
                            }
                        }
                    }
                }
            }
        }
        section.card {
            h2 { "내 예약" }
            (reservation_list(view.mine, true))
            @if let Some(latest) = view.mine.first() {
                p.empty { "최근 신청: " (format_date_time(latest.reservation.reserved_at)) }
            }
        }
    };
    layout("일정 예약", Some(user), notice, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::schedule;
    use crate::seed::seed_data_at;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn member_user(member_id: u64) -> PublicUser {
        PublicUser {
            id: 2,
            username: "member1".into(),
            name: "김회원".into(),
            role: Role::Member,
            email: None,
            member_id: Some(member_id),
        }
    }

    #[test]
    fn full_sessions_show_a_disabled_button() {
        let mut data = seed_data_at(now());
        let minji = data.members.iter().find(|m| m.name == "김민지").unwrap().id;
        let kim = data.members.iter().find(|m| m.name == "김회원").unwrap().id;
        let pt = data.schedules.iter().find(|s| s.title == "개인 PT").unwrap().id;
        schedule::reserve(&mut data, minji, pt, now()).unwrap();

        let schedules = schedule::list(&data, None, None);
        let mine = schedule::member_reservations(&data, kim);
        let page = schedule_page(
            &member_user(kim),
            ScheduleBoard {
                schedules: &schedules,
                mine: &mine,
                date: "",
                kind: "all",
                now: now(),
            },
            None,
        )
        .into_string();

        // Yoga is already booked, pilates is open, the PT slot is full.
        assert!(page.contains("예약됨"));
        assert_eq!(page.matches(r#"name="schedule_id""#).count(), 1);
        assert!(page.contains(r#"<button type="button" disabled>마감</button>"#));
    }
}
