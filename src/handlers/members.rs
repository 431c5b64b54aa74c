use super::{csv_download, now, today};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::{
    ApiResponse, AttendanceRecord, Member, MemberPage, MemberQuery, MemberStats, MemberUpdate,
    NewMember, Payment, ReservationView,
};
use crate::state::AppState;
use crate::{attendance, members, payments, schedule};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<MemberQuery>,
) -> Json<ApiResponse<MemberPage>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(members::list(&data, &query)))
}

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> Json<ApiResponse<MemberStats>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(members::stats(&data, today())))
}

pub async fn get(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Member>>, AppError> {
    let data = state.lock().await;
    Ok(Json(ApiResponse::ok(members::get(&data, id)?)))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<NewMember>,
) -> Result<Json<ApiResponse<Member>>, AppError> {
    let mut data = state.lock().await;
    let member = members::create(&mut data, payload, today())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(member, "회원이 등록되었습니다.")))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
    Json(payload): Json<MemberUpdate>,
) -> Result<Json<ApiResponse<Member>>, AppError> {
    let mut data = state.lock().await;
    let member = members::update(&mut data, id, payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(member, "회원 정보가 수정되었습니다.")))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Member>>, AppError> {
    let mut data = state.lock().await;
    let member = members::delete(&mut data, id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(member, "회원이 삭제되었습니다.")))
}

pub async fn member_payments(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, AppError> {
    let data = state.lock().await;
    members::get(&data, id)?;
    Ok(Json(ApiResponse::ok(payments::member_payments(&data, id))))
}

pub async fn member_attendance(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecord>>>, AppError> {
    let data = state.lock().await;
    members::get(&data, id)?;
    Ok(Json(ApiResponse::ok(attendance::member_history(&data, id, None))))
}

pub async fn member_reservations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Vec<ReservationView>>>, AppError> {
    let data = state.lock().await;
    members::get(&data, id)?;
    Ok(Json(ApiResponse::ok(schedule::member_reservations(&data, id))))
}

pub async fn export(State(state): State<AppState>, _admin: AdminUser) -> Response {
    let data = state.lock().await;
    csv_download("members.csv", members::export_csv(&data))
}
