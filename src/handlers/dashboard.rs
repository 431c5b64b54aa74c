use crate::auth::{AdminUser, MemberUser};
use crate::errors::AppError;
use crate::models::{AdminDashboard, ApiResponse, MemberDashboard};
use crate::state::AppState;
use crate::stats;
use axum::{Json, extract::State};

pub async fn admin_stats(State(state): State<AppState>, _admin: AdminUser) -> Json<ApiResponse<AdminDashboard>> {
    let data = state.lock().await;
    Json(ApiResponse::ok(stats::admin_dashboard(&data)))
}

pub async fn member_info(
    State(state): State<AppState>,
    member: MemberUser,
) -> Result<Json<ApiResponse<MemberDashboard>>, AppError> {
    let data = state.lock().await;
    Ok(Json(ApiResponse::ok(stats::member_dashboard(&data, member.member_id)?)))
}
