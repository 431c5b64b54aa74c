use super::{Notice, layout, pagination, stat_cards};
use crate::format::{format_currency, format_date, format_date_time, format_duration, format_time};
use crate::members::total_pages;
use crate::models::{
    AdminDashboard, AttendanceRecord, AttendanceStats, Member, MemberPage, MemberStatus,
    MembershipType, PaymentPage, PaymentStats, PublicUser, ReservationStatus, ReservationView,
    ScheduleStats, ScheduleType, ScheduleView,
};
use chrono::NaiveDate;
use maud::{Markup, html};

fn member_badge(status: MemberStatus) -> Markup {
    html! { span class={"badge " (status.as_str())} { (status.label()) } }
}

fn reservation_badge(status: ReservationStatus) -> Markup {
    html! { span class={"badge " (status.as_str())} { (status.label()) } }
}

fn reservation_actions(view: &ReservationView) -> Markup {
    let id = view.reservation.id;
    html! {
        @if view.reservation.status == ReservationStatus::Pending {
            form.inline method="post" action={"/admin/reservations/" (id) "/approve"} {
                button type="submit" { "승인" }
            }
            " "
            form.inline method="post" action={"/admin/reservations/" (id) "/reject"} {
                button.secondary type="submit" { "거절" }
            }
        }
        @if view.reservation.status.is_active() {
            " "
            form.inline method="post" action={"/admin/reservations/" (id) "/cancel"} {
                button.danger type="submit" { "취소" }
            }
        }
    }
}

fn reservation_table(reservations: &[ReservationView]) -> Markup {
    html! {
        @if reservations.is_empty() {
            p.empty { "예약이 없습니다." }
        } @else {
            table {
                thead {
                    tr {
                        th { "회원" }
                        th { "일정" }
                        th { "날짜" }
                        th { "시간" }
                        th { "신청 시각" }
                        th { "상태" }
                        th {}
                    }
                }
                tbody {
                    @for view in reservations {
                        tr {
                            td { (view.reservation.member_name) }
                            td { (view.title) }
                            td { (view.date.map(format_date).unwrap_or_default()) }
                            td { (view.time) }
                            td { (format_date_time(view.reservation.reserved_at)) }
                            td { (reservation_badge(view.reservation.status)) }
                            td { (reservation_actions(view)) }
                        }
                    }
                }
            }
        }
    }
}

pub fn dashboard_page(
    user: &PublicUser,
    stats: &AdminDashboard,
    pending: &[ReservationView],
    notice: Option<&Notice>,
) -> Markup {
    let content = html! {
        h1 { "대시보드" }
        (stat_cards(&[
            ("전체 회원", stats.members.total.to_string()),
            ("활성 회원", stats.members.active.to_string()),
            ("이번 달 신규", stats.members.new_this_month.to_string()),
            ("만료 예정", stats.members.expiring_soon.to_string()),
        ]))
        (stat_cards(&[
            ("이번 달 매출", format_currency(stats.payments.monthly_revenue)),
            ("오늘 출석", stats.attendance.today_count.to_string()),
            ("오늘 일정", stats.schedule.today_schedules.to_string()),
            ("승인 대기", stats.schedule.pending_reservations.to_string()),
        ]))
        section.card {
            h2 { "승인 대기 예약" }
            (reservation_table(pending))
        }
    };
    layout("대시보드", Some(user), notice, content)
}

pub struct MembersView<'a> {
    pub page: &'a MemberPage,
    pub search: &'a str,
    pub status: &'a str,
    pub editing: Option<&'a Member>,
}

fn member_form(member: Option<&Member>) -> Markup {
    let action = match member {
        Some(member) => format!("/admin/members/{}", member.id),
        None => "/admin/members".to_string(),
    };
    let value = |pick: fn(&Member) -> Option<String>| member.and_then(pick).unwrap_or_default();
    html! {
        form.grid method="post" action=(action) {
            label { "이름" input type="text" name="name" value=(value(|m| Some(m.name.clone()))) required; }
            label { "연락처" input type="tel" name="phone" value=(value(|m| Some(m.phone.clone()))) placeholder="010-0000-0000"; }
            label { "이메일" input type="email" name="email" value=(value(|m| m.email.clone())); }
            label { "생년월일" input type="date" name="birth_date" value=(value(|m| m.birth_date.map(format_date))); }
            label {
                "성별"
                select name="gender" {
                    option value="" { "선택" }
                    @for gender in ["여성", "남성"] {
                        option value=(gender) selected[member.and_then(|m| m.gender.as_deref()) == Some(gender)] { (gender) }
                    }
                }
            }
            label { "주소" input type="text" name="address" value=(value(|m| m.address.clone())); }
            @if let Some(member) = member {
                label {
                    "상태"
                    select name="status" {
                        @for status in [MemberStatus::Active, MemberStatus::Inactive, MemberStatus::Expired] {
                            option value=(status.as_str()) selected[member.status == status] { (status.label()) }
                        }
                    }
                }
                button type="submit" { "수정" }
            } @else {
                button type="submit" { "회원 등록" }
            }
        }
    }
}

pub fn members_page(user: &PublicUser, view: MembersView<'_>, notice: Option<&Notice>) -> Markup {
    let page = view.page;
    let base = format!(
        "/admin/members?search={}&status={}",
        urlencoding::encode(view.search),
        urlencoding::encode(view.status)
    );
    let content = html! {
        h1 { "회원 관리" }
        section.card {
            @if let Some(member) = view.editing {
                h2 { (member.name) " 회원 정보 수정" }
            } @else {
                h2 { "신규 회원 등록" }
            }
            (member_form(view.editing))
        }
        section.card {
            form.grid method="get" action="/admin/members" {
                label { "검색" input type="search" name="search" value=(view.search) placeholder="이름 또는 연락처"; }
                label {
                    "상태"
                    select name="status" {
                        option value="" { "전체" }
                        @for status in [MemberStatus::Active, MemberStatus::Inactive, MemberStatus::Expired] {
                            option value=(status.as_str()) selected[view.status == status.as_str()] { (status.label()) }
                        }
                    }
                }
                button type="submit" { "검색" }
                a href="/admin/members/export" { "CSV 내보내기" }
            }
            p { "총 " (page.total) "명" }
            @if page.members.is_empty() {
                p.empty { "회원이 없습니다." }
            } @else {
                table {
                    thead {
                        tr {
                            th { "회원번호" }
                            th { "이름" }
                            th { "연락처" }
                            th { "회원권" }
                            th { "만료일" }
                            th { "상태" }
                            th {}
                        }
                    }
                    tbody {
                        @for member in &page.members {
                            tr {
                                td { (member.code()) }
                                td { (member.name) }
                                td { (member.phone) }
                                td { (member.membership_type.as_deref().unwrap_or("-")) }
                                td { (member.membership_end.map(format_date).unwrap_or_else(|| "-".to_string())) }
                                td { (member_badge(member.status)) }
                                td {
                                    a href={"/admin/members?edit=" (member.id)} { "수정" }
                                    " "
                                    form.inline method="post" action={"/admin/members/" (member.id) "/delete"}
                                        onsubmit="return confirm('정말 삭제하시겠습니까?')" {
                                        button.danger type="submit" { "삭제" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            (pagination(&base, page.page, total_pages(page.total, page.limit)))
        }
    };
    layout("회원 관리", Some(user), notice, content)
}

pub struct PaymentsView<'a> {
    pub page: &'a PaymentPage,
    pub stats: &'a PaymentStats,
    pub types: &'a [MembershipType],
    pub members: &'a [Member],
    pub search: &'a str,
    pub type_id: &'a str,
    pub month: &'a str,
    pub today: NaiveDate,
}

pub fn payments_page(user: &PublicUser, view: PaymentsView<'_>, notice: Option<&Notice>) -> Markup {
    let page = view.page;
    let base = format!(
        "/admin/payments?search={}&membershipTypeId={}&month={}",
        urlencoding::encode(view.search),
        urlencoding::encode(view.type_id),
        urlencoding::encode(view.month)
    );
    let content = html! {
        h1 { "결제 관리" }
        (stat_cards(&[
            ("이번 달 매출", format_currency(view.stats.monthly_revenue)),
            ("이번 달 결제", view.stats.new_payments.to_string()),
            ("만료 예정 회원", view.stats.expiring_soon.to_string()),
            ("평균 결제 금액", format_currency(view.stats.average_payment)),
        ]))
        section.card {
            h2 { "결제 등록" }
            form.grid method="post" action="/admin/payments" {
                label {
                    "회원"
                    select name="member_id" required {
                        @for member in view.members {
                            option value=(member.id) { (member.name) " (" (member.phone) ")" }
                        }
                    }
                }
                label {
                    "회원권"
                    select name="membership_type_id" required {
                        @for kind in view.types {
                            option value=(kind.id) { (kind.name) " - " (format_currency(kind.price)) }
                        }
                    }
                }
                label { "금액 (비우면 정가)" input type="number" name="amount" min="0"; }
                label { "결제일" input type="date" name="paid_date" value=(format_date(view.today)); }
                button type="submit" { "결제 등록" }
            }
        }
        section.card {
            h2 { "결제 내역" }
            form.grid method="get" action="/admin/payments" {
                label { "회원명" input type="search" name="search" value=(view.search); }
                label {
                    "회원권"
                    select name="membershipTypeId" {
                        option value="all" { "전체" }
                        @for kind in view.types {
                            option value=(kind.id) selected[view.type_id == kind.id.to_string()] { (kind.name) }
                        }
                    }
                }
                label { "월" input type="month" name="month" value=(view.month); }
                button type="submit" { "조회" }
                a href="/admin/payments/export" { "CSV 내보내기" }
            }
            @if page.payments.is_empty() {
                p.empty { "결제 내역이 없습니다." }
            } @else {
                table {
                    thead {
                        tr {
                            th { "결제일" }
                            th { "회원" }
                            th { "회원권" }
                            th { "금액" }
                            th { "기간" }
                            th { "상태" }
                            th {}
                        }
                    }
                    tbody {
                        @for payment in &page.payments {
                            tr {
                                td { (format_date(payment.paid_date)) }
                                td { (payment.member_name) }
                                td { (payment.type_name) }
                                td { (format_currency(payment.amount)) }
                                td { (format_date(payment.start_date)) " ~ " (format_date(payment.end_date)) }
                                td { span class={"badge " (payment.status.as_str())} { (payment.status.label()) } }
                                td {
                                    form.inline method="post" action={"/admin/payments/" (payment.id) "/refund"} {
                                        button.secondary type="submit" { "환불" }
                                    }
                                    " "
                                    form.inline method="post" action={"/admin/payments/" (payment.id) "/delete"}
                                        onsubmit="return confirm('결제 내역을 삭제하시겠습니까?')" {
                                        button.danger type="submit" { "삭제" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
            (pagination(&base, page.page, total_pages(page.total, page.limit)))
        }
        section.card {
            h2 { "회원권 종류" }
            table {
                thead { tr { th { "이름" } th { "기간" } th { "가격" } th {} } }
                tbody {
                    @for kind in view.types {
                        tr {
                            td { (kind.name) }
                            td { (kind.duration) "일" }
                            td { (format_currency(kind.price)) }
                            td {
                                form.inline method="post" action={"/admin/membership-types/" (kind.id) "/delete"} {
                                    button.danger type="submit" { "삭제" }
                                }
                            }
                        }
                    }
                }
            }
            form.grid method="post" action="/admin/membership-types" {
                label { "이름" input type="text" name="name" required; }
                label { "기간(일)" input type="number" name="duration" min="1" required; }
                label { "가격" input type="number" name="price" min="0" required; }
                button type="submit" { "회원권 추가" }
            }
        }
    };
    layout("결제 관리", Some(user), notice, content)
}

pub struct AttendanceView<'a> {
    pub date: NaiveDate,
    pub records: &'a [AttendanceRecord],
    pub stats: &'a AttendanceStats,
    pub members: &'a [Member],
}

pub fn attendance_page(user: &PublicUser, view: AttendanceView<'_>, notice: Option<&Notice>) -> Markup {
    let date = format_date(view.date);
    let content = html! {
        h1 { "출석 관리" }
        (stat_cards(&[
            ("오늘 출석", view.stats.today_count.to_string()),
            ("주간 평균", format!("{:.1}", view.stats.weekly_average)),
            ("이번 달 누적", view.stats.monthly_total.to_string()),
            ("출석률", format!("{}%", view.stats.attendance_rate)),
        ]))
        section.card {
            h2 { "입장 / 퇴장 처리" }
            form.grid method="post" action="/admin/attendance/check-in" {
                label {
                    "회원"
                    select name="member_id" required {
                        @for member in view.members {
                            option value=(member.id) { (member.name) " (" (member.phone) ")" }
                        }
                    }
                }
                button type="submit" { "입장" }
                button.secondary type="submit" formaction="/admin/attendance/check-out" { "퇴장" }
            }
        }
        section.card {
            form.grid method="get" action="/admin/attendance" {
                label { "날짜" input type="date" name="date" value=(date); }
                button type="submit" { "조회" }
                a href={"/admin/attendance/export?date=" (date)} { "CSV 내보내기" }
            }
            @if view.records.is_empty() {
                p.empty { "출석 기록이 없습니다." }
            } @else {
                table {
                    thead { tr { th { "회원" } th { "입장" } th { "퇴장" } th { "운동 시간" } } }
                    tbody {
                        @for record in view.records {
                            tr {
                                td { (record.member_name) }
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
    layout("출석 관리", Some(user), notice, content)
}

pub struct ScheduleAdminView<'a> {
    pub schedules: &'a [ScheduleView],
    pub reservations: &'a [ReservationView],
    pub stats: &'a ScheduleStats,
    pub date: &'a str,
    pub kind: &'a str,
    pub status: &'a str,
    pub today: NaiveDate,
}

pub fn schedule_page(user: &PublicUser, view: ScheduleAdminView<'_>, notice: Option<&Notice>) -> Markup {
    let content = html! {
        h1 { "일정 관리" }
        (stat_cards(&[
            ("오늘 일정", view.stats.today_schedules.to_string()),
            ("이번 주 예약", view.stats.weekly_reservations.to_string()),
            ("승인 대기", view.stats.pending_reservations.to_string()),
            ("예약률", format!("{}%", view.stats.booking_rate)),
        ]))
        section.card {
            h2 { "일정 등록" }
            form.grid method="post" action="/admin/schedule" {
                label { "제목" input type="text" name="title" required; }
                label {
                    "유형"
                    select name="type" {
                        @for kind in [ScheduleType::Class, ScheduleType::Pt] {
                            option value=(kind.label()) { (kind.label()) }
                        }
                    }
                }
                label { "강사" input type="text" name="instructor"; }
                label { "날짜" input type="date" name="date" value=(format_date(view.today)) required; }
                label { "시작" input type="time" name="start_time" required; }
                label { "종료" input type="time" name="end_time" required; }
                label { "정원" input type="number" name="capacity" min="1" value="10" required; }
                button type="submit" { "일정 등록" }
            }
        }
        section.card {
            h2 { "일정 목록" }
            form.grid method="get" action="/admin/schedule" {
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
                input type="hidden" name="status" value=(view.status);
                button type="submit" { "조회" }
                a href="/admin/schedule/export" { "CSV 내보내기" }
            }
            @if view.schedules.is_empty() {
                p.empty { "등록된 일정이 없습니다." }
            } @else {
                table {
                    thead {
                        tr { th { "날짜" } th { "시간" } th { "제목" } th { "유형" } th { "강사" } th { "예약/정원" } th {} }
                    }
                    tbody {
                        @for item in view.schedules {
                            @let schedule = &item.schedule;
                            tr {
                                td { (format_date(schedule.date)) }
                                td { (schedule.time_range()) }
                                td { (schedule.title) }
                                td { (schedule.kind.label()) }
                                td { (schedule.instructor) }
                                td { (schedule.booked) " / " (schedule.capacity) }
                                td {
                                    form.inline method="post" action={"/admin/schedule/" (schedule.id) "/delete"}
                                        onsubmit="return confirm('일정을 삭제하면 예약도 취소됩니다. 삭제하시겠습니까?')" {
                                        button.danger type="submit" { "삭제" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        section.card {
            h2 { "예약 관리" }
            form.grid method="get" action="/admin/schedule" {
                input type="hidden" name="date" value=(view.date);
                input type="hidden" name="type" value=(view.kind);
                label {
                    "상태"
                    select name="status" {
                        option value="" { "전체" }
                        @for status in [ReservationStatus::Pending, ReservationStatus::Approved, ReservationStatus::Rejected, ReservationStatus::Cancelled] {
                            option value=(status.as_str()) selected[view.status == status.as_str()] { (status.label()) }
                        }
                    }
                }
                button type="submit" { "조회" }
            }
            (reservation_table(view.reservations))
        }
    };
    layout("일정 관리", Some(user), notice, content)
}
