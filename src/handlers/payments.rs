use super::{csv_download, today};
use crate::auth::{AdminUser, CurrentUser};
use crate::errors::AppError;
use crate::models::{
    ApiResponse, MembershipType, NewMembershipType, NewPayment, Payment, PaymentPage,
    PaymentQuery, PaymentStats, PaymentUpdate,
};
use crate::payments;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<ApiResponse<PaymentPage>>, AppError> {
    let data = state.lock().await;
    Ok(Json(ApiResponse::ok(payments::list(&data, &query)?)))
}

pub async fn stats(State(state): State<AppState>, _admin: AdminUser) -> Json<ApiResponse<PaymentStats>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(payments::stats(&data, today())))
}

pub async fn get(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let data = state.lock().await;
    Ok(Json(ApiResponse::ok(payments::get_payment(&data, id)?)))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<NewPayment>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let mut data = state.lock().await;
    let payment = payments::create_payment(&mut data, payload, today())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(payment, "결제가 등록되었습니다.")))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
    Json(payload): Json<PaymentUpdate>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let mut data = state.lock().await;
    let payment = payments::update_payment(&mut data, id, payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(payment, "결제 정보가 수정되었습니다.")))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Payment>>, AppError> {
    let mut data = state.lock().await;
    let payment = payments::delete_payment(&mut data, id)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(payment, "결제 내역이 삭제되었습니다.")))
}

pub async fn export(State(state): State<AppState>, _admin: AdminUser) -> Response {
    let data = state.lock().await;
    csv_download("payments.csv", payments::export_csv(&data))
}

pub async fn list_types(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Json<ApiResponse<Vec<MembershipType>>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(payments::list_types(&data)))
}

pub async fn create_type(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<NewMembershipType>,
) -> Result<Json<ApiResponse<MembershipType>>, AppError> {
    let mut data = state.lock().await;
    let kind = payments::create_type(&mut data, payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(kind, "회원권이 추가되었습니다.")))
}

pub async fn update_type(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
    Json(payload): Json<NewMembershipType>,
) -> Result<Json<ApiResponse<MembershipType>>, AppError> {
    let mut data = state.lock().await;
    let kind = payments::update_type(&mut data, id, payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(kind, "회원권이 수정되었습니다.")))
}

pub async fn delete_type(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<MembershipType>>, AppError> {
    let mut data = state.lock().await;
    let kind = payments::delete_type(&mut data, id)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(kind, "회원권이 삭제되었습니다.")))
}
