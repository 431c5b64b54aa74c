//! HTML views. Form posts answer with a redirect that carries a toast.

pub mod admin;
pub mod member;

use super::now;
use crate::auth::{self, AUTH_COOKIE};
use crate::errors::DomainResult;
use crate::models::{AppData, LoginRequest, Role};
use crate::state::AppState;
use crate::ui::{NoticeKind, NoticeQuery, login::login_page, toast_url};
use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::error;

/// Persists after a successful mutation and picks the toast for `path`.
pub(crate) async fn finish<T>(
    state: &AppState,
    data: &AppData,
    path: &str,
    outcome: DomainResult<T>,
    success: &str,
) -> Redirect {
    let location = match outcome {
        Ok(_) => match state.persist(data).await {
            Ok(()) => toast_url(path, NoticeKind::Success, success),
            Err(err) => {
                error!("failed to persist after form post: {}", err.message);
                toast_url(path, NoticeKind::Error, "저장 중 오류가 발생했습니다.")
            }
        },
        Err(err) => toast_url(path, NoticeKind::Error, &err.to_string()),
    };
    Redirect::to(&location)
}

/// Optional form fields arrive as empty strings.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct ModeQuery {
    pub mode: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(mode): Query<ModeQuery>,
    Query(notice): Query<NoticeQuery>,
) -> Response {
    if let Some(token) = jar.get(AUTH_COOKIE).map(|cookie| cookie.value().to_string()) {
        let data = state.lock().await;
        if let Ok(user) = auth::resolve(&data, &token, now()) {
            return Redirect::to(user.role.dashboard_path()).into_response();
        }
    }
    let mode = mode.mode.as_deref().and_then(Role::parse).unwrap_or(Role::Member);
    Html(login_page(mode, "", notice.notice().as_ref()).into_string()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub remember_me: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let mode = form.mode.as_deref().and_then(Role::parse);
    let request = LoginRequest {
        username: form.username,
        password: form.password,
        mode,
        remember_me: form.remember_me.is_some(),
    };
    let back = format!("/?mode={}", mode.unwrap_or(Role::Member).as_str());

    let mut data = state.lock().await;
    let response = match auth::login(&mut data, &state.config, &request, now()) {
        Ok(response) => response,
        Err(err) => return Redirect::to(&toast_url(&back, NoticeKind::Error, &err.to_string())).into_response(),
    };
    if let Err(err) = state.persist(&data).await {
        error!("failed to persist session: {}", err.message);
    }

    let mut cookie = Cookie::build((AUTH_COOKIE, response.token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if request.remember_me {
        cookie = cookie.max_age(time::Duration::seconds(state.config.remember_ttl.num_seconds()));
    }
    let welcome = format!("{}님, 환영합니다!", response.user.name);
    let location = toast_url(response.user.role.dashboard_path(), NoticeKind::Success, &welcome);
    (jar.add(cookie.build()), Redirect::to(&location)).into_response()
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(token) = jar.get(AUTH_COOKIE).map(|cookie| cookie.value().to_string()) {
        let mut data = state.lock().await;
        if auth::logout(&mut data, &token) {
            if let Err(err) = state.persist(&data).await {
                error!("failed to persist logout: {}", err.message);
            }
        }
    }
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, Redirect::to(&toast_url("/", NoticeKind::Info, "로그아웃되었습니다.")))
}
