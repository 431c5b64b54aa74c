use super::{finish, non_blank};
use crate::auth::AdminPage;
use crate::errors::{DomainError, DomainResult};
use crate::handlers::{csv_download, now, today};
use crate::models::{
    MemberQuery, MemberStatus, MemberUpdate, NewMember, NewMembershipType, NewPayment,
    NewSchedule, PaymentQuery, PaymentStatus, PaymentUpdate, ReservationStatus, ScheduleFilter,
    ScheduleType,
};
use crate::schedule::Actor;
use crate::state::AppState;
use crate::ui::{self, NoticeQuery};
use crate::{attendance, members, payments, schedule, stats};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

fn parse_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::invalid("날짜 형식이 올바르지 않습니다."))
}

fn parse_time(raw: &str) -> DomainResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map_err(|_| DomainError::invalid("시간 형식이 올바르지 않습니다."))
}

fn parse_id(raw: &str, message: &str) -> DomainResult<u64> {
    raw.trim().parse().map_err(|_| DomainError::invalid(message))
}

pub async fn dashboard(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Query(notice): Query<NoticeQuery>,
) -> Html<String> {
    let data = state.lock().await;
    let dashboard = stats::admin_dashboard(&data);
    let pending = schedule::list_reservations(&data, Some(ReservationStatus::Pending));
    Html(ui::admin::dashboard_page(&user.user, &dashboard, &pending, notice.notice().as_ref()).into_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct MembersPageQuery {
    pub page: Option<usize>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub edit: Option<u64>,
}

pub async fn members_page(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Query(query): Query<MembersPageQuery>,
    Query(notice): Query<NoticeQuery>,
) -> Html<String> {
    let data = state.lock().await;
    let search = query.search.clone().unwrap_or_default();
    let status = query.status.clone().unwrap_or_default();
    let page = members::list(
        &data,
        &MemberQuery {
            page: query.page,
            limit: None,
            search: non_blank(query.search),
            status: non_blank(query.status),
        },
    );
    let editing = query.edit.and_then(|id| data.member(id));
    let view = ui::admin::MembersView {
        page: &page,
        search: &search,
        status: &status,
        editing,
    };
    Html(ui::admin::members_page(&user.user, view, notice.notice().as_ref()).into_string())
}

#[derive(Debug, Deserialize)]
pub struct MemberForm {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
}

impl MemberForm {
    fn birth_date(&self) -> DomainResult<Option<NaiveDate>> {
        match self.birth_date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_date(raw).map(Some),
        }
    }
}

pub async fn create_member(
    State(state): State<AppState>,
    _admin: AdminPage,
    Form(form): Form<MemberForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = form.birth_date().and_then(|birth_date| {
        members::create(
            &mut data,
            NewMember {
                name: form.name,
                phone: form.phone,
                email: non_blank(form.email),
                birth_date,
                gender: non_blank(form.gender),
                address: non_blank(form.address),
            },
            today(),
        )
    });
    finish(&state, &data, "/admin/members", outcome, "회원이 등록되었습니다.").await
}

pub async fn update_member(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
    Form(form): Form<MemberForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = form.birth_date().and_then(|birth_date| {
        members::update(
            &mut data,
            id,
            MemberUpdate {
                name: Some(form.name),
                phone: Some(form.phone),
                email: form.email,
                birth_date,
                gender: form.gender,
                address: form.address,
                status: form.status.as_deref().and_then(MemberStatus::parse),
            },
        )
    });
    finish(&state, &data, "/admin/members", outcome, "회원 정보가 수정되었습니다.").await
}

pub async fn delete_member(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = members::delete(&mut data, id, now());
    finish(&state, &data, "/admin/members", outcome, "회원이 삭제되었습니다.").await
}

pub async fn export_members(State(state): State<AppState>, _admin: AdminPage) -> Response {
    let data = state.lock().await;
    csv_download("members.csv", members::export_csv(&data))
}

pub async fn payments_page(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Query(query): Query<PaymentQuery>,
    Query(notice): Query<NoticeQuery>,
) -> Response {
    let data = state.lock().await;
    let page = match payments::list(&data, &query) {
        Ok(page) => page,
        Err(err) => {
            let location = ui::toast_url("/admin/payments", ui::NoticeKind::Error, &err.to_string());
            return Redirect::to(&location).into_response();
        }
    };
    let stats = payments::stats(&data, today());
    let view = ui::admin::PaymentsView {
        page: &page,
        stats: &stats,
        types: &data.membership_types,
        members: &data.members,
        search: query.search.as_deref().unwrap_or_default(),
        type_id: query.membership_type_id.as_deref().unwrap_or_default(),
        month: query.month.as_deref().unwrap_or_default(),
        today: today(),
    };
    Html(ui::admin::payments_page(&user.user, view, notice.notice().as_ref()).into_string()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub member_id: String,
    pub membership_type_id: String,
    pub amount: Option<String>,
    pub paid_date: Option<String>,
}

impl PaymentForm {
    fn into_new_payment(self) -> DomainResult<NewPayment> {
        let amount = match non_blank(self.amount) {
            Some(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| DomainError::invalid("금액은 숫자로 입력해주세요."))?,
            ),
            None => None,
        };
        let paid_date = match non_blank(self.paid_date) {
            Some(raw) => Some(parse_date(&raw)?),
            None => None,
        };
        Ok(NewPayment {
            member_id: parse_id(&self.member_id, "회원을 선택해주세요.")?,
            membership_type_id: parse_id(&self.membership_type_id, "회원권을 선택해주세요.")?,
            amount,
            paid_date,
        })
    }
}

pub async fn create_payment(
    State(state): State<AppState>,
    _admin: AdminPage,
    Form(form): Form<PaymentForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = form
        .into_new_payment()
        .and_then(|input| payments::create_payment(&mut data, input, today()));
    finish(&state, &data, "/admin/payments", outcome, "결제가 등록되었습니다.").await
}

pub async fn refund_payment(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = payments::update_payment(
        &mut data,
        id,
        PaymentUpdate {
            status: PaymentStatus::Refunded,
        },
    );
    finish(&state, &data, "/admin/payments", outcome, "환불 처리되었습니다.").await
}

pub async fn delete_payment(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = payments::delete_payment(&mut data, id);
    finish(&state, &data, "/admin/payments", outcome, "결제 내역이 삭제되었습니다.").await
}

pub async fn export_payments(State(state): State<AppState>, _admin: AdminPage) -> Response {
    let data = state.lock().await;
    csv_download("payments.csv", payments::export_csv(&data))
}

#[derive(Debug, Deserialize)]
pub struct MembershipTypeForm {
    pub name: String,
    pub duration: String,
    pub price: String,
}

pub async fn create_membership_type(
    State(state): State<AppState>,
    _admin: AdminPage,
    Form(form): Form<MembershipTypeForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let parsed = form
        .duration
        .trim()
        .parse::<u32>()
        .map_err(|_| DomainError::invalid("기간은 숫자로 입력해주세요."))
        .and_then(|duration| {
            let price = form
                .price
                .trim()
                .parse::<u64>()
                .map_err(|_| DomainError::invalid("가격은 숫자로 입력해주세요."))?;
            Ok(NewMembershipType {
                name: form.name,
                duration,
                price,
            })
        });
    let outcome = parsed.and_then(|input| payments::create_type(&mut data, input));
    finish(&state, &data, "/admin/payments", outcome, "회원권이 추가되었습니다.").await
}

pub async fn delete_membership_type(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = payments::delete_type(&mut data, id);
    finish(&state, &data, "/admin/payments", outcome, "회원권이 삭제되었습니다.").await
}

#[derive(Debug, Default, Deserialize)]
pub struct DatePageQuery {
    pub date: Option<String>,
}

impl DatePageQuery {
    fn date(&self) -> NaiveDate {
        non_blank(self.date.clone())
            .and_then(|raw| parse_date(&raw).ok())
            .unwrap_or_else(today)
    }
}

pub async fn attendance_page(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Query(query): Query<DatePageQuery>,
    Query(notice): Query<NoticeQuery>,
) -> Html<String> {
    let date = query.date();
    let data = state.lock().await;
    let records = attendance::by_date(&data, date);
    let stats = attendance::admin_stats(&data, today());
    let active: Vec<_> = data
        .members
        .iter()
        .filter(|m| m.status == MemberStatus::Active)
        .cloned()
        .collect();
    let view = ui::admin::AttendanceView {
        date,
        records: &records,
        stats: &stats,
        members: &active,
    };
    Html(ui::admin::attendance_page(&user.user, view, notice.notice().as_ref()).into_string())
}

#[derive(Debug, Deserialize)]
pub struct CheckForm {
    pub member_id: String,
}

pub async fn check_in(
    State(state): State<AppState>,
    _admin: AdminPage,
    Form(form): Form<CheckForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = parse_id(&form.member_id, "회원을 선택해주세요.")
        .and_then(|member_id| attendance::check_in(&mut data, member_id, now()));
    finish(&state, &data, "/admin/attendance", outcome, "입장 처리되었습니다.").await
}

pub async fn check_out(
    State(state): State<AppState>,
    _admin: AdminPage,
    Form(form): Form<CheckForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = parse_id(&form.member_id, "회원을 선택해주세요.")
        .and_then(|member_id| attendance::check_out(&mut data, member_id, now()));
    finish(&state, &data, "/admin/attendance", outcome, "퇴장 처리되었습니다.").await
}

pub async fn export_attendance(
    State(state): State<AppState>,
    _admin: AdminPage,
    Query(query): Query<DatePageQuery>,
) -> Response {
    let date = query.date();
    let data = state.lock().await;
    csv_download(&format!("attendance-{date}.csv"), attendance::export_csv(&data, date))
}

#[derive(Debug, Default, Deserialize)]
pub struct SchedulePageQuery {
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
}

pub async fn schedule_page(
    State(state): State<AppState>,
    AdminPage(user): AdminPage,
    Query(query): Query<SchedulePageQuery>,
    Query(notice): Query<NoticeQuery>,
) -> Response {
    let filter = ScheduleFilter {
        date: query.date.clone(),
        kind: query.kind.clone(),
    };
    let (date, kind) = match schedule::parse_filter(&filter) {
        Ok(parsed) => parsed,
        Err(err) => {
            let location = ui::toast_url("/admin/schedule", ui::NoticeKind::Error, &err.to_string());
            return Redirect::to(&location).into_response();
        }
    };
    let status = query.status.as_deref().and_then(ReservationStatus::parse);

    let data = state.lock().await;
    let schedules = schedule::list(&data, date, kind);
    let reservations = schedule::list_reservations(&data, status);
    let stats = schedule::stats(&data, today());
    let view = ui::admin::ScheduleAdminView {
        schedules: &schedules,
        reservations: &reservations,
        stats: &stats,
        date: query.date.as_deref().unwrap_or_default(),
        kind: query.kind.as_deref().unwrap_or("all"),
        status: query.status.as_deref().unwrap_or_default(),
        today: today(),
    };
    Html(ui::admin::schedule_page(&user.user, view, notice.notice().as_ref()).into_string()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ScheduleForm {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub instructor: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: String,
}

impl ScheduleForm {
    fn into_new_schedule(self) -> DomainResult<NewSchedule> {
        Ok(NewSchedule {
            kind: ScheduleType::parse(&self.kind)
                .ok_or_else(|| DomainError::invalid("일정 유형이 올바르지 않습니다."))?,
            date: parse_date(&self.date)?,
            start_time: parse_time(&self.start_time)?,
            end_time: parse_time(&self.end_time)?,
            capacity: self
                .capacity
                .trim()
                .parse()
                .map_err(|_| DomainError::invalid("정원은 숫자로 입력해주세요."))?,
            title: self.title,
            instructor: self.instructor,
        })
    }
}

pub async fn create_schedule(
    State(state): State<AppState>,
    _admin: AdminPage,
    Form(form): Form<ScheduleForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = form
        .into_new_schedule()
        .and_then(|input| schedule::create(&mut data, input));
    finish(&state, &data, "/admin/schedule", outcome, "일정이 등록되었습니다.").await
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = schedule::delete(&mut data, id, now());
    finish(&state, &data, "/admin/schedule", outcome, "일정이 삭제되었습니다.").await
}

pub async fn export_schedules(State(state): State<AppState>, _admin: AdminPage) -> Response {
    let data = state.lock().await;
    csv_download("schedules.csv", schedule::export_csv(&data))
}

pub async fn approve_reservation(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = schedule::approve(&mut data, id, now());
    finish(&state, &data, "/admin/schedule", outcome, "예약이 승인되었습니다.").await
}

pub async fn reject_reservation(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = schedule::reject(&mut data, id, now());
    finish(&state, &data, "/admin/schedule", outcome, "예약이 거절되었습니다.").await
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    _admin: AdminPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = schedule::cancel(&mut data, id, Actor::Admin, now());
    finish(&state, &data, "/admin/schedule", outcome, "예약이 취소되었습니다.").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_form_accepts_browser_time_inputs() {
        let form = ScheduleForm {
            title: "저녁 요가".into(),
            kind: "강습".into(),
            instructor: "김강사".into(),
            date: "2026-01-10".into(),
            start_time: "19:00".into(),
            end_time: "20:00:00".into(),
            capacity: "12".into(),
        };
        let schedule = form.into_new_schedule().unwrap();
        assert_eq!(schedule.kind, ScheduleType::Class);
        assert_eq!(schedule.capacity, 12);
        assert_eq!(schedule.end_time, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    }

    #[test]
    fn payment_form_treats_blank_amount_as_list_price() {
        let form = PaymentForm {
            member_id: "3".into(),
            membership_type_id: "1".into(),
            amount: Some(String::new()),
            paid_date: Some("".into()),
        };
        let payment = form.into_new_payment().unwrap();
        assert_eq!(payment.amount, None);
        assert_eq!(payment.paid_date, None);
        assert_eq!(payment.member_id, 3);
    }
}
