use super::now;
use crate::auth::{self, CurrentUser, MemberUser};
use crate::errors::AppError;
use crate::members;
use crate::models::{
    ApiResponse, LoginRequest, LoginResponse, Member, MyInfo, MyInfoUpdate, PasswordChange,
    PublicUser, RefreshRequest,
};
use crate::state::AppState;
use axum::{Json, extract::State};

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let mut data = state.lock().await;
    let response = auth::login(&mut data, &state.config, &payload, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(response, "로그인되었습니다.")))
}

pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut data = state.lock().await;
    auth::logout(&mut data, &user.token);
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message((), "로그아웃되었습니다.")))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let mut data = state.lock().await;
    let response = auth::refresh(&mut data, &state.config, &payload.refresh_token, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::ok(response)))
}

pub async fn verify(user: CurrentUser) -> Json<ApiResponse<PublicUser>> {
    Json(ApiResponse::ok(user.user))
}

pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<MyInfo>>, AppError> {
    let data = state.lock().await;
    let member = match user.user.member_id {
        Some(id) => Some(members::get(&data, id)?),
        None => None,
    };
    Ok(Json(ApiResponse::ok(MyInfo {
        user: user.user,
        member,
    })))
}

pub async fn update_me(
    State(state): State<AppState>,
    user: MemberUser,
    Json(payload): Json<MyInfoUpdate>,
) -> Result<Json<ApiResponse<Member>>, AppError> {
    let mut data = state.lock().await;
    let member = members::update_my_info(&mut data, user.member_id, payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message(member, "정보가 저장되었습니다.")))
}

/// Withdrawal: the member, its login and its sessions go away.
pub async fn withdraw(
    State(state): State<AppState>,
    user: MemberUser,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut data = state.lock().await;
    members::delete(&mut data, user.member_id, now())?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message((), "회원 탈퇴가 완료되었습니다.")))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<PasswordChange>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let mut data = state.lock().await;
    auth::change_password(&mut data, user.user.id, &payload)?;
    state.persist(&data).await?;
    Ok(Json(ApiResponse::with_message((), "비밀번호가 변경되었습니다.")))
}
