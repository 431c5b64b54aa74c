use crate::handlers::{self, attendance, auth, dashboard, members, pages, payments, schedules};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .merge(page_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/verify", get(auth::verify))
        .route("/me", get(auth::me).put(auth::update_me).delete(auth::withdraw))
        .route("/me/password", put(auth::change_password))
        .route("/members", get(members::list).post(members::create))
        .route("/members/stats", get(members::stats))
        .route("/members/export", get(members::export))
        .route(
            "/members/:id",
            get(members::get).put(members::update).delete(members::delete),
        )
        .route("/members/:id/payments", get(members::member_payments))
        .route("/members/:id/attendance", get(members::member_attendance))
        .route("/members/:id/reservations", get(members::member_reservations))
        .route("/payments", get(payments::list).post(payments::create))
        .route("/payments/stats", get(payments::stats))
        .route("/payments/export", get(payments::export))
        .route(
            "/payments/:id",
            get(payments::get).put(payments::update).delete(payments::delete),
        )
        .route(
            "/membership-types",
            get(payments::list_types).post(payments::create_type),
        )
        .route(
            "/membership-types/:id",
            put(payments::update_type).delete(payments::delete_type),
        )
        .route("/attendance", get(attendance::list))
        .route("/attendance/today", get(attendance::today_list))
        .route("/attendance/stats", get(attendance::stats))
        .route("/attendance/export", get(attendance::export))
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance/check-out", post(attendance::check_out))
        .route("/schedules", get(schedules::list).post(schedules::create))
        .route("/schedules/stats", get(schedules::stats))
        .route("/schedules/export", get(schedules::export))
        .route(
            "/schedules/:id",
            get(schedules::get).put(schedules::update).delete(schedules::delete),
        )
        .route(
            "/reservations",
            get(schedules::list_reservations).post(schedules::reserve),
        )
        .route("/reservations/:id", get(schedules::get_reservation))
        .route("/reservations/:id/approve", post(schedules::approve))
        .route("/reservations/:id/reject", post(schedules::reject))
        .route(
            "/reservations/:id/cancel",
            post(schedules::cancel).delete(schedules::cancel),
        )
        .route("/dashboard/admin/stats", get(dashboard::admin_stats))
        .route("/dashboard/member/info", get(dashboard::member_info))
}

fn page_routes() -> Router<AppState> {
    use pages::{admin, member};

    Router::new()
        .route("/", get(pages::index))
        .route("/login", post(pages::login))
        .route("/logout", post(pages::logout))
        .route("/admin", get(admin::dashboard))
        .route("/admin/members", get(admin::members_page).post(admin::create_member))
        .route("/admin/members/export", get(admin::export_members))
        .route("/admin/members/:id", post(admin::update_member))
        .route("/admin/members/:id/delete", post(admin::delete_member))
        .route("/admin/payments", get(admin::payments_page).post(admin::create_payment))
        .route("/admin/payments/export", get(admin::export_payments))
        .route("/admin/payments/:id/refund", post(admin::refund_payment))
        .route("/admin/payments/:id/delete", post(admin::delete_payment))
        .route("/admin/membership-types", post(admin::create_membership_type))
        .route("/admin/membership-types/:id/delete", post(admin::delete_membership_type))
        .route("/admin/attendance", get(admin::attendance_page))
        .route("/admin/attendance/check-in", post(admin::check_in))
        .route("/admin/attendance/check-out", post(admin::check_out))
        .route("/admin/attendance/export", get(admin::export_attendance))
        .route("/admin/schedule", get(admin::schedule_page).post(admin::create_schedule))
        .route("/admin/schedule/export", get(admin::export_schedules))
        .route("/admin/schedule/:id/delete", post(admin::delete_schedule))
        .route("/admin/reservations/:id/approve", post(admin::approve_reservation))
        .route("/admin/reservations/:id/reject", post(admin::reject_reservation))
        .route("/admin/reservations/:id/cancel", post(admin::cancel_reservation))
        .route("/member", get(member::info_page))
        .route("/member/info", post(member::save_info))
        .route("/member/password", post(member::change_password))
        .route("/member/withdraw", post(member::withdraw))
        .route("/member/attendance", get(member::attendance_page))
        .route("/member/attendance/check-in", post(member::check_in))
        .route("/member/attendance/check-out", post(member::check_out))
        .route("/member/schedule", get(member::schedule_page))
        .route("/member/reservations", post(member::reserve))
        .route("/member/reservations/:id/cancel", post(member::cancel))
}
