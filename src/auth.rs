//! Logins, sessions and the request extractors that resolve them.

use crate::config::{AppConfig, PASSWORD_MIN_LENGTH, storage_keys};
use crate::errors::{AppError, DomainError, DomainResult};
use crate::models::{
    AppData, LoginRequest, LoginResponse, PasswordChange, PublicUser, Role, Session,
};
use crate::state::AppState;
use crate::ui::toast_url;
use crate::ui::NoticeKind;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

/// Cookie carrying the session token for the HTML views.
pub const AUTH_COOKIE: &str = storage_keys::AUTH_TOKEN;

const BAD_CREDENTIALS: &str = "아이디 또는 비밀번호가 올바르지 않습니다.";
const SESSION_EXPIRED: &str = "세션이 만료되었습니다. 다시 로그인해주세요.";

pub fn hash_password(password: &str) -> DomainResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| DomainError::Internal(err.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn issue_session(
    data: &mut AppData,
    config: &AppConfig,
    user_id: u64,
    remember_me: bool,
    now: NaiveDateTime,
) -> Session {
    let ttl = if remember_me {
        config.remember_ttl
    } else {
        config.session_ttl
    };
    let session = Session {
        token: new_token(),
        refresh_token: new_token(),
        user_id,
        remember_me,
        created_at: now,
        expires_at: now + ttl,
    };
    data.sessions.insert(session.token.clone(), session.clone());
    session
}

pub fn purge_expired(data: &mut AppData, now: NaiveDateTime) -> usize {
    let before = data.sessions.len();
    data.sessions.retain(|_, session| session.expires_at > now);
    before - data.sessions.len()
}

pub fn login(
    data: &mut AppData,
    config: &AppConfig,
    request: &LoginRequest,
    now: NaiveDateTime,
) -> DomainResult<LoginResponse> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(DomainError::invalid("아이디를 입력해주세요."));
    }
    if request.password.is_empty() {
        return Err(DomainError::invalid("비밀번호를 입력해주세요."));
    }

    let Some(user) = data
        .users
        .iter()
        .find(|user| user.username == username)
        .cloned()
    else {
        warn!(username, "login rejected: unknown user");
        return Err(DomainError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };
    if !verify_password(&request.password, &user.password_hash) {
        warn!(username, "login rejected: bad password");
        return Err(DomainError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }
    if let Some(mode) = request.mode {
        if mode != user.role {
            warn!(username, mode = mode.as_str(), "login rejected: wrong mode");
            return Err(DomainError::forbidden());
        }
    }

    purge_expired(data, now);
    let session = issue_session(data, config, user.id, request.remember_me, now);
    info!(user_id = user.id, role = user.role.as_str(), "logged in");
    Ok(LoginResponse {
        token: session.token,
        refresh_token: session.refresh_token,
        user: PublicUser::from(&user),
    })
}

pub fn logout(data: &mut AppData, token: &str) -> bool {
    data.sessions.remove(token).is_some()
}

/// Trades a refresh token for a fresh token pair.
pub fn refresh(
    data: &mut AppData,
    config: &AppConfig,
    refresh_token: &str,
    now: NaiveDateTime,
) -> DomainResult<LoginResponse> {
    let Some(old) = data
        .sessions
        .values()
        .find(|session| session.refresh_token == refresh_token)
        .cloned()
    else {
        return Err(DomainError::Unauthorized(SESSION_EXPIRED.to_string()));
    };
    data.sessions.remove(&old.token);
    if old.expires_at <= now {
        warn!(user_id = old.user_id, "refresh rejected: session expired");
        return Err(DomainError::Unauthorized(SESSION_EXPIRED.to_string()));
    }
    let user = data
        .user(old.user_id)
        .map(PublicUser::from)
        .ok_or_else(|| DomainError::Unauthorized(SESSION_EXPIRED.to_string()))?;
    let session = issue_session(data, config, user.id, old.remember_me, now);
    Ok(LoginResponse {
        token: session.token,
        refresh_token: session.refresh_token,
        user,
    })
}

/// The user behind a live session token.
pub fn resolve(data: &AppData, token: &str, now: NaiveDateTime) -> DomainResult<PublicUser> {
    let session = data
        .sessions
        .get(token)
        .ok_or_else(|| DomainError::Unauthorized(SESSION_EXPIRED.to_string()))?;
    if session.expires_at <= now {
        return Err(DomainError::Unauthorized(SESSION_EXPIRED.to_string()));
    }
    data.user(session.user_id)
        .map(PublicUser::from)
        .ok_or_else(|| DomainError::Unauthorized(SESSION_EXPIRED.to_string()))
}

pub fn change_password(data: &mut AppData, user_id: u64, change: &PasswordChange) -> DomainResult<()> {
    let mut errors = crate::validation::Errors::default();
    errors
        .check(crate::validation::rules::required(&change.new_password, "새 비밀번호"))
        .check(crate::validation::rules::min_length(
            &change.new_password,
            PASSWORD_MIN_LENGTH,
        ));
    errors.into_result()?;

    let user = data
        .users
        .iter_mut()
        .find(|user| user.id == user_id)
        .ok_or_else(|| DomainError::not_found("사용자를 찾을 수 없습니다."))?;
    if !verify_password(&change.current_password, &user.password_hash) {
        return Err(DomainError::invalid("현재 비밀번호가 올바르지 않습니다."));
    }
    user.password_hash = hash_password(&change.new_password)?;
    info!(user_id, "password changed");
    Ok(())
}

/// Drops every session belonging to `user_id`.
pub fn revoke_user_sessions(data: &mut AppData, user_id: u64) {
    data.sessions.retain(|_, session| session.user_id != user_id);
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

async fn current_user(parts: &Parts, state: &AppState) -> Result<CurrentUser, DomainError> {
    let Some(token) = token_from_parts(parts) else {
        return Err(DomainError::Unauthorized("인증이 필요합니다.".to_string()));
    };
    let data = state.lock().await;
    let user = resolve(&data, &token, Local::now().naive_local()).inspect_err(|_| {
        warn!(uri = %parts.uri, "rejected expired or unknown session");
    })?;
    Ok(CurrentUser { user, token })
}

/// Any logged-in user, from a bearer token or the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: PublicUser,
    pub token: String,
}

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    /// The member record tied to this login.
    pub fn member_id(&self) -> DomainResult<u64> {
        self.user
            .member_id
            .ok_or_else(|| DomainError::not_found("회원 정보를 찾을 수 없습니다."))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(current_user(parts, state).await?)
    }
}

pub struct AdminUser(pub CurrentUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state).await?;
        if !user.is_admin() {
            return Err(DomainError::forbidden().into());
        }
        Ok(Self(user))
    }
}

pub struct MemberUser {
    pub user: CurrentUser,
    pub member_id: u64,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MemberUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state).await?;
        if user.role() != Role::Member {
            return Err(DomainError::forbidden().into());
        }
        let member_id = user.member_id()?;
        Ok(Self { user, member_id })
    }
}

/// Rejection for the HTML views: send the browser somewhere else.
pub struct PageRedirect {
    location: String,
    clear_cookie: bool,
}

impl IntoResponse for PageRedirect {
    fn into_response(self) -> Response {
        let redirect = Redirect::to(&self.location);
        if self.clear_cookie {
            let jar = CookieJar::new().remove(Cookie::build(AUTH_COOKIE).path("/"));
            (jar, redirect).into_response()
        } else {
            redirect.into_response()
        }
    }
}

async fn page_user(parts: &Parts, state: &AppState, required: Role) -> Result<CurrentUser, PageRedirect> {
    let user = current_user(parts, state).await.map_err(|_| PageRedirect {
        location: toast_url("/", NoticeKind::Error, SESSION_EXPIRED),
        clear_cookie: true,
    })?;
    if user.role() != required {
        return Err(PageRedirect {
            location: toast_url(user.role().dashboard_path(), NoticeKind::Error, "접근 권한이 없습니다."),
            clear_cookie: false,
        });
    }
    Ok(user)
}

/// An admin viewing an HTML page.
pub struct AdminPage(pub CurrentUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminPage {
    type Rejection = PageRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        page_user(parts, state, Role::Admin).await.map(Self)
    }
}

/// A member viewing an HTML page.
pub struct MemberPage {
    pub user: CurrentUser,
    pub member_id: u64,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MemberPage {
    type Rejection = PageRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = page_user(parts, state, Role::Member).await?;
        let member_id = user.member_id().map_err(|_| PageRedirect {
            location: toast_url("/", NoticeKind::Error, "회원 정보를 찾을 수 없습니다."),
            clear_cookie: true,
        })?;
        Ok(Self { user, member_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_data_at;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn request(username: &str, password: &str, mode: Option<Role>) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            mode,
            remember_me: false,
        }
    }

    #[test]
    fn wrong_password_issues_no_session() {
        let mut data = seed_data_at(now());
        let config = AppConfig::default();
        let err = login(&mut data, &config, &request("admin", "nope", None), now()).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        assert!(data.sessions.is_empty());
    }

    #[test]
    fn blank_fields_are_validation_errors() {
        let mut data = seed_data_at(now());
        let config = AppConfig::default();
        let err = login(&mut data, &config, &request("  ", "x", None), now()).unwrap_err();
        assert_eq!(err.to_string(), "아이디를 입력해주세요.");
        let err = login(&mut data, &config, &request("admin", "", None), now()).unwrap_err();
        assert_eq!(err.to_string(), "비밀번호를 입력해주세요.");
    }

    #[test]
    fn mode_must_match_role() {
        let mut data = seed_data_at(now());
        let config = AppConfig::default();
        let err = login(&mut data, &config, &request("member1", "member123", Some(Role::Admin)), now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn session_expires_after_ttl() {
        let mut data = seed_data_at(now());
        let config = AppConfig::default();
        let response = login(&mut data, &config, &request("admin", "admin123", Some(Role::Admin)), now())
            .unwrap();
        assert_eq!(response.user.role, Role::Admin);
        assert!(resolve(&data, &response.token, now()).is_ok());

        let later = now() + config.session_ttl + Duration::minutes(1);
        assert!(resolve(&data, &response.token, later).is_err());
        assert_eq!(purge_expired(&mut data, later), 1);
    }

    #[test]
    fn refresh_rotates_tokens() {
        let mut data = seed_data_at(now());
        let config = AppConfig::default();
        let first = login(&mut data, &config, &request("member1", "member123", None), now()).unwrap();
        let second = refresh(&mut data, &config, &first.refresh_token, now()).unwrap();
        assert_ne!(first.token, second.token);
        assert!(resolve(&data, &first.token, now()).is_err());
        assert!(resolve(&data, &second.token, now()).is_ok());
        assert!(logout(&mut data, &second.token));
    }

    #[test]
    fn password_change_checks_current_password() {
        let mut data = seed_data_at(now());
        let member = data.users.iter().find(|u| u.username == "member1").unwrap().id;
        let bad = PasswordChange {
            current_password: "wrong".into(),
            new_password: "newpass1".into(),
        };
        assert!(change_password(&mut data, member, &bad).is_err());
        let short = PasswordChange {
            current_password: "member123".into(),
            new_password: "abc".into(),
        };
        assert!(change_password(&mut data, member, &short).is_err());
        let good = PasswordChange {
            current_password: "member123".into(),
            new_password: "newpass1".into(),
        };
        change_password(&mut data, member, &good).unwrap();
        let user = data.user(member).unwrap();
        assert!(verify_password("newpass1", &user.password_hash));
    }

    #[test]
    fn expired_session_cannot_be_refreshed() {
        let mut data = seed_data_at(now());
        let config = AppConfig::default();
        let response = login(&mut data, &config, &request("admin", "admin123", None), now()).unwrap();

        let later = now() + config.session_ttl + Duration::minutes(1);
        let err = refresh(&mut data, &config, &response.refresh_token, later).unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
        assert!(data.sessions.is_empty());

        let fresh = login(&mut data, &config, &request("admin", "admin123", None), now()).unwrap();
        let renewed = refresh(&mut data, &config, &fresh.refresh_token, now() + Duration::hours(1)).unwrap();
        assert_ne!(renewed.token, fresh.token);
    }
}
