use super::{csv_download, now, today};
use crate::auth::{AdminUser, CurrentUser, MemberUser};
use crate::errors::{AppError, DomainError};
use crate::models::{
    ApiResponse, NewReservation, NewSchedule, Reservation, ReservationQuery, ReservationStatus,
    ReservationView, Schedule, ScheduleFilter, ScheduleStats, ScheduleUpdate, ScheduleView,
};
use crate::schedule::{self, Actor};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(filter): Query<ScheduleFilter>,
) -> Result<Json<ApiResponse<Vec<ScheduleView>>>, AppError> {
    let (date, kind) = schedule::parse_filter(&filter)?;
    let data = state.lock().await;
    Ok(Json(ApiResponse::ok(schedule::list(&data, date, kind))))
}

pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<ScheduleView>>, AppError> {
    let data = state.lock().await;
    let found = schedule::get(&data, id)?;
    Ok(Json(ApiResponse::ok(ScheduleView::from(&found))))
}

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> Json<ApiResponse<ScheduleStats>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(schedule::stats(&data, today())))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<NewSchedule>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    let mut data = state.lock().await;
    let created = schedule::create(&mut data, payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(created, "일정이 등록되었습니다.")))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
    Json(payload): Json<ScheduleUpdate>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    let mut data = state.lock().await;
    let updated = schedule::update(&mut data, id, payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(updated, "일정이 수정되었습니다.")))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    let mut data = state.lock().await;
    let deleted = schedule::delete(&mut data, id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(deleted, "일정이 삭제되었습니다.")))
}

pub async fn export(State(state): State<AppState>, _admin: AdminUser) -> Response {
    let data = state.lock().await;
    csv_download("schedules.csv", schedule::export_csv(&data))
}

/// Admins see every reservation, members only their own.
pub async fn list_reservations(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<ApiResponse<Vec<ReservationView>>>, AppError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            ReservationStatus::parse(raw)
                .ok_or_else(|| AppError::bad_request("예약 상태가 올바르지 않습니다."))?,
        ),
    };
    let data = state.lock().await;
    let views = if user.is_admin() {
        schedule::list_reservations(&data, status)
    } else {
        let member_id = user.member_id()?;
        schedule::member_reservations(&data, member_id)
            .into_iter()
            .filter(|view| status.is_none_or(|status| view.reservation.status == status))
            .collect()
    };
    Ok(Json(ApiResponse::ok(views)))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<ReservationView>>, AppError> {
    let data = state.lock().await;
    let reservation = schedule::get_reservation(&data, id)?;
    if !user.is_admin() && user.user.member_id != Some(reservation.member_id) {
        return Err(DomainError::forbidden().into());
    }
    Ok(Json(ApiResponse::ok(schedule::view(&data, &reservation))))
}

pub async fn reserve(
    State(state): State<AppState>,
    member: MemberUser,
    Json(payload): Json<NewReservation>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let mut data = state.lock().await;
    let reservation = schedule::reserve(&mut data, member.member_id, payload.schedule_id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(
        reservation,
        "예약이 신청되었습니다. 관리자 승인 후 확정됩니다.",
    )))
}

pub async fn approve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let mut data = state.lock().await;
    let reservation = schedule::approve(&mut data, id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(reservation, "예약이 승인되었습니다.")))
}

pub async fn reject(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let mut data = state.lock().await;
    let reservation = schedule::reject(&mut data, id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(reservation, "예약이 거절되었습니다.")))
}

pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let actor = if user.is_admin() {
        Actor::Admin
    } else {
        Actor::Member(user.member_id()?)
    };
    let mut data = state.lock().await;
    let reservation = schedule::cancel(&mut data, id, actor, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(reservation, "예약이 취소되었습니다.")))
}
