//! Request handlers: the JSON API under `/api` and the HTML pages.

pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod members;
pub mod pages;
pub mod payments;
pub mod schedules;

use crate::models::ApiResponse;
use axum::Json;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use chrono::{Local, NaiveDate, NaiveDateTime};

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("ok"))
}

/// A CSV download. The BOM keeps Excel from misreading Hangul.
pub(crate) fn csv_download(filename: &str, body: String) -> Response {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        format!("\u{feff}{body}"),
    )
        .into_response()
}
