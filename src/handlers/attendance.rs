use super::{csv_download, now, today};
use crate::attendance;
use crate::auth::{AdminUser, CurrentUser};
use crate::errors::AppError;
use crate::models::{ApiResponse, AttendanceRecord, AttendanceStats, CheckRequest};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    response::Response,
};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    /// The requested day, today when none is given.
    pub fn resolve(&self) -> Result<NaiveDate, AppError> {
        match self.date.as_deref().map(str::trim) {
            None | Some("") => Ok(today()),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::bad_request("날짜 형식이 올바르지 않습니다.")),
        }
    }
}

/// Members check themselves in; admins name the member in the body.
fn target_member(user: &CurrentUser, request: &CheckRequest) -> Result<u64, AppError> {
    if user.is_admin() {
        return request
            .member_id
            .ok_or_else(|| AppError::bad_request("회원을 선택해주세요."));
    }
    Ok(user.member_id()?)
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<DateQuery>,
) -> Result<Json<ApiResponse<Vec<AttendanceRecord>>>, AppError> {
    let date = query.resolve()?;
    let data = state.lock().await;
    Ok(Json(ApiResponse::ok(attendance::by_date(&data, date))))
}

pub async fn today_list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Json<ApiResponse<Vec<AttendanceRecord>>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(attendance::today(&data, today())))
}

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> Json<ApiResponse<AttendanceStats>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(attendance::admin_stats(&data, today())))
}

pub async fn check_in(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Option<Json<CheckRequest>>,
) -> Result<Json<ApiResponse<AttendanceRecord>>, AppError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let member_id = target_member(&user, &request)?;
    let mut data = state.lock().await;
    let record = attendance::check_in(&mut data, member_id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(record, "입장 처리되었습니다.")))
}

pub async fn check_out(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Option<Json<CheckRequest>>,
) -> Result<Json<ApiResponse<AttendanceRecord>>, AppError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let member_id = target_member(&user, &request)?;
    let mut data = state.lock().await;
    let record = attendance::check_out(&mut data, member_id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(record, "퇴장 처리되었습니다.")))
}

pub async fn export(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<DateQuery>,
) -> Result<Response, AppError> {
    let date = query.resolve()?;
    let data = state.lock().await;
    Ok(csv_download(
        &format!("attendance-{date}.csv"),
        attendance::export_csv(&data, date),
    ))
}
