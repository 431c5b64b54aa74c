//! Server-rendered HTML views.

pub mod admin;
pub mod login;
pub mod member;

use crate::config::TOAST_DURATION_MS;
use crate::models::{PublicUser, Role};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Warning => "warning",
            NoticeKind::Info => "info",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "success" => NoticeKind::Success,
            "error" => NoticeKind::Error,
            "warning" => NoticeKind::Warning,
            _ => NoticeKind::Info,
        }
    }
}

/// A toast shown once at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// The `?toast=...&kind=...` pair a redirect carries.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub toast: Option<String>,
    pub kind: Option<String>,
}

impl NoticeQuery {
    pub fn notice(&self) -> Option<Notice> {
        let message = self.toast.as_deref()?.trim();
        if message.is_empty() {
            return None;
        }
        Some(Notice {
            kind: NoticeKind::parse(self.kind.as_deref().unwrap_or_default()),
            message: message.to_string(),
        })
    }
}

/// Appends a toast to `path` for the page it redirects to.
pub fn toast_url(path: &str, kind: NoticeKind, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!(
        "{path}{separator}toast={}&kind={}",
        urlencoding::encode(message),
        kind.as_str()
    )
}

fn nav_links(role: Role) -> &'static [(&'static str, &'static str)] {
    match role {
        Role::Admin => &[
            ("/admin", "대시보드"),
            ("/admin/members", "회원 관리"),
            ("/admin/payments", "결제 관리"),
            ("/admin/attendance", "출석 관리"),
            ("/admin/schedule", "일정 관리"),
        ],
        Role::Member => &[
            ("/member", "내 정보"),
            ("/member/attendance", "출석"),
            ("/member/schedule", "일정 예약"),
        ],
    }
}

/// Wraps page content with the document shell, navigation and toast.
pub fn layout(title: &str, user: Option<&PublicUser>, notice: Option<&Notice>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="ko" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | FitLady" }
                style { (PreEscaped(CSS)) }
            }
            body {
                @if let Some(user) = user {
                    header.topbar {
                        a.brand href=(user.role.dashboard_path()) { "FitLady" }
                        nav {
                            @for (href, label) in nav_links(user.role) {
                                a href=(href) { (label) }
                            }
                        }
                        div.account {
                            span { (user.name) "님" }
                            form method="post" action="/logout" {
                                button.link type="submit" { "로그아웃" }
                            }
                        }
                    }
                }
                @if let Some(notice) = notice {
                    div class={"toast toast-" (notice.kind.as_str())} data-duration=(TOAST_DURATION_MS) {
                        (notice.message)
                    }
                }
                main.container {
                    (content)
                }
                script { (PreEscaped(TOAST_SCRIPT)) }
            }
        }
    }
}

/// A row of headline figures.
pub fn stat_cards(cards: &[(&str, String)]) -> Markup {
    html! {
        section.stats {
            @for (label, value) in cards {
                div.stat {
                    span.label { (label) }
                    span.value { (value) }
                }
            }
        }
    }
}

/// Previous/next links for a paged table. `base` already carries the
/// filter query.
pub fn pagination(base: &str, page: usize, total_pages: usize) -> Markup {
    let separator = if base.contains('?') { '&' } else { '?' };
    html! {
        @if total_pages > 1 {
            div.pagination {
                @if page > 1 {
                    a href={(base) (separator) "page=" (page - 1)} { "이전" }
                }
                span { (page) " / " (total_pages) }
                @if page < total_pages {
                    a href={(base) (separator) "page=" (page + 1)} { "다음" }
                }
            }
        }
    }
}

const TOAST_SCRIPT: &str = r#"
document.querySelectorAll('.toast').forEach(function (toast) {
  var duration = parseInt(toast.dataset.duration || '3000', 10);
  setTimeout(function () { toast.classList.add('hide'); }, duration);
});
"#;

const CSS: &str = r#"
* { box-sizing: border-box; }

body {
  margin: 0;
  min-height: 100vh;
  font-family: "Pretendard", "Noto Sans KR", "Apple SD Gothic Neo", sans-serif;
  background: #fdf5f8;
  color: #2d2a32;
}

a { color: #d6336c; text-decoration: none; }

.topbar {
  display: flex;
  align-items: center;
  gap: 24px;
  padding: 14px 28px;
  background: white;
  box-shadow: 0 2px 12px rgba(214, 51, 108, 0.08);
}

.topbar nav { display: flex; gap: 16px; flex: 1; }
.topbar .brand { font-weight: 700; font-size: 1.3rem; }
.topbar .account { display: flex; align-items: center; gap: 12px; }

.container {
  width: min(1100px, 100%);
  margin: 0 auto;
  padding: 28px 20px 60px;
  display: grid;
  gap: 24px;
}

.card {
  background: white;
  border-radius: 16px;
  padding: 22px;
  box-shadow: 0 10px 30px rgba(45, 42, 50, 0.06);
}

.card h2 { margin-top: 0; font-size: 1.1rem; }

.stats {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
  gap: 14px;
}

.stat {
  background: white;
  border-radius: 14px;
  padding: 16px;
  display: grid;
  gap: 6px;
}

.stat .label { font-size: 0.85rem; color: #8a8290; }
.stat .value { font-size: 1.5rem; font-weight: 600; color: #d6336c; }

table { width: 100%; border-collapse: collapse; font-size: 0.92rem; }
th, td { padding: 10px 8px; border-bottom: 1px solid #f1e4ea; text-align: left; }
th { color: #8a8290; font-weight: 500; }

form.inline { display: inline; }
form.grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
  gap: 12px;
  align-items: end;
}

label { display: grid; gap: 4px; font-size: 0.85rem; color: #6b6370; }

input, select {
  padding: 8px 10px;
  border: 1px solid #e5d5dd;
  border-radius: 8px;
  font: inherit;
}

button {
  padding: 8px 14px;
  border: none;
  border-radius: 8px;
  background: #d6336c;
  color: white;
  font: inherit;
  cursor: pointer;
}

button.secondary { background: #f1e4ea; color: #6b6370; }
button.danger { background: #e03131; }
button.link { background: none; color: #d6336c; padding: 0; }
button:disabled { background: #ced4da; cursor: not-allowed; }

.badge {
  display: inline-block;
  padding: 2px 8px;
  border-radius: 999px;
  font-size: 0.8rem;
  background: #f1e4ea;
}

.badge.active, .badge.approved, .badge.completed { background: #d3f9d8; color: #2b8a3e; }
.badge.pending { background: #fff3bf; color: #e67700; }
.badge.expired, .badge.rejected, .badge.refunded { background: #ffe3e3; color: #c92a2a; }

.toast {
  position: fixed;
  top: 20px;
  right: 20px;
  padding: 12px 18px;
  border-radius: 10px;
  color: white;
  z-index: 10;
  transition: opacity 300ms ease;
}

.toast.hide { opacity: 0; pointer-events: none; }
.toast-success { background: #2b8a3e; }
.toast-error { background: #c92a2a; }
.toast-warning { background: #e67700; }
.toast-info { background: #1971c2; }

.pagination { display: flex; gap: 12px; justify-content: center; margin-top: 14px; }

.login {
  width: min(420px, 100%);
  margin: 60px auto;
}

.mode-tabs { display: flex; gap: 8px; margin-bottom: 18px; }
.mode-tabs a { flex: 1; text-align: center; padding: 10px; border-radius: 8px; background: #f1e4ea; color: #6b6370; }
.mode-tabs a.selected { background: #d6336c; color: white; }

.empty { color: #8a8290; text-align: center; padding: 18px; }
"#;
