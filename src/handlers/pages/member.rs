use super::{finish, non_blank};
use crate::auth::{self, AUTH_COOKIE, MemberPage};
use crate::errors::DomainError;
use crate::handlers::now;
use crate::models::{MyInfoUpdate, PasswordChange, ScheduleFilter};
use crate::schedule::Actor;
use crate::state::AppState;
use crate::ui::{self, NoticeKind, NoticeQuery, toast_url};
use crate::{attendance, members, payments, schedule, stats};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Datelike, Duration};
use serde::Deserialize;

const HISTORY_LIMIT: usize = 20;

pub async fn info_page(
    State(state): State<AppState>,
    page: MemberPage,
    Query(notice): Query<NoticeQuery>,
) -> Response {
    let data = state.lock().await;
    let dashboard = match stats::member_dashboard(&data, page.member_id) {
        Ok(dashboard) => dashboard,
        Err(err) => return Redirect::to(&toast_url("/", NoticeKind::Error, &err.to_string())).into_response(),
    };
    let history = payments::member_payments(&data, page.member_id);
    Html(ui::member::info_page(&page.user.user, &dashboard, &history, notice.notice().as_ref()).into_string())
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct InfoForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub async fn save_info(
    State(state): State<AppState>,
    page: MemberPage,
    Form(form): Form<InfoForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = members::update_my_info(
        &mut data,
        page.member_id,
        MyInfoUpdate {
            name: form.name,
            email: form.email,
            phone: non_blank(form.phone),
            address: form.address,
        },
    );
    finish(&state, &data, "/member", outcome, "정보가 저장되었습니다.").await
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    page: MemberPage,
    Form(form): Form<PasswordForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = if form.new_password != form.confirm_password {
        Err(DomainError::invalid("새 비밀번호가 일치하지 않습니다."))
    } else {
        auth::change_password(
            &mut data,
            page.user.user.id,
            &PasswordChange {
                current_password: form.current_password,
                new_password: form.new_password,
            },
        )
    };
    finish(&state, &data, "/member", outcome, "비밀번호가 변경되었습니다.").await
}

pub async fn withdraw(State(state): State<AppState>, page: MemberPage, jar: CookieJar) -> Response {
    let mut data = state.lock().await;
    let outcome = members::delete(&mut data, page.member_id, now());
    if outcome.is_err() {
        return finish(&state, &data, "/member", outcome, "").await.into_response();
    }
    let redirect = finish(&state, &data, "/", outcome, "회원 탈퇴가 완료되었습니다.").await;
    (jar.remove(Cookie::build(AUTH_COOKIE).path("/")), redirect).into_response()
}

pub async fn attendance_page(
    State(state): State<AppState>,
    page: MemberPage,
    Query(notice): Query<NoticeQuery>,
) -> Html<String> {
    let now = now();
    let today = now.date();
    let data = state.lock().await;
    let monthly = attendance::member_monthly_stats(&data, page.member_id, today.year(), today.month(), today);
    let history = attendance::member_history(&data, page.member_id, Some(HISTORY_LIMIT));
    let hours = &state.config.operating_hours;
    let view = ui::member::AttendanceView {
        open: attendance::open_record(&data, page.member_id),
        monthly: &monthly,
        history: &history,
        hours: hours.for_weekday(today.weekday()),
        gym_open: hours.is_open(now),
    };
    Html(ui::member::attendance_page(&page.user.user, view, notice.notice().as_ref()).into_string())
}

pub async fn check_in(State(state): State<AppState>, page: MemberPage) -> Redirect {
    let mut data = state.lock().await;
    let outcome = attendance::check_in(&mut data, page.member_id, now());
    finish(&state, &data, "/member/attendance", outcome, "입장 처리되었습니다. 즐거운 운동 되세요!").await
}

pub async fn check_out(State(state): State<AppState>, page: MemberPage) -> Redirect {
    let mut data = state.lock().await;
    let outcome = attendance::check_out(&mut data, page.member_id, now());
    finish(&state, &data, "/member/attendance", outcome, "퇴장 처리되었습니다. 수고하셨습니다!").await
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Without a date filter members see the coming week.
pub async fn schedule_page(
    State(state): State<AppState>,
    page: MemberPage,
    Query(query): Query<ScheduleQuery>,
    Query(notice): Query<NoticeQuery>,
) -> Response {
    let filter = ScheduleFilter {
        date: query.date.clone(),
        kind: query.kind.clone(),
    };
    let (date, kind) = match schedule::parse_filter(&filter) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Redirect::to(&toast_url("/member/schedule", NoticeKind::Error, &err.to_string())).into_response();
        }
    };
    let now = now();
    let data = state.lock().await;
    let mut schedules = schedule::list(&data, date, kind);
    if date.is_none() {
        let horizon = now.date() + Duration::days(7);
        schedules.retain(|item| item.schedule.date >= now.date() && item.schedule.date <= horizon);
    }
    let mine = schedule::member_reservations(&data, page.member_id);
    let view = ui::member::ScheduleBoard {
        schedules: &schedules,
        mine: &mine,
        date: query.date.as_deref().unwrap_or_default(),
        kind: query.kind.as_deref().unwrap_or("all"),
        now,
    };
    Html(ui::member::schedule_page(&page.user.user, view, notice.notice().as_ref()).into_string()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ReserveForm {
    pub schedule_id: u64,
}

pub async fn reserve(
    State(state): State<AppState>,
    page: MemberPage,
    Form(form): Form<ReserveForm>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = schedule::reserve(&mut data, page.member_id, form.schedule_id, now());
    finish(
        &state,
        &data,
        "/member/schedule",
        outcome,
        "예약이 신청되었습니다. 관리자 승인 후 확정됩니다.",
    )
    .await
}

pub async fn cancel(
    State(state): State<AppState>,
    page: MemberPage,
    Path(id): Path<u64>,
) -> Redirect {
    let mut data = state.lock().await;
    let outcome = schedule::cancel(&mut data, id, Actor::Member(page.member_id), now());
    finish(&state, &data, "/member/schedule", outcome, "예약이 취소되었습니다.").await
}
