use chrono::{Duration as Days, Local};
use fitlady::models::{
    LoginResponse, Member, MemberPage, Reservation, ReservationStatus, Schedule, ScheduleView,
};
use once_cell::sync::Lazy;
use reqwest::{Client, Response, StatusCode, redirect::Policy};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::sleep;

/// The compiled binary, started on first use and shared by every test.
struct Server {
    base_url: String,
    child: Child,
    _data_dir: TempDir,
}

impl Server {
    async fn spawn() -> Self {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("free port")
            .port();
        let data_dir = tempfile::tempdir().expect("temp data dir");
        let child = Command::new(env!("CARGO_BIN_EXE_fitlady"))
            .env("PORT", port.to_string())
            .env("APP_DATA_PATH", data_dir.path().join("state.json"))
            .env("RUST_LOG", "info")
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .expect("failed to spawn fitlady");
        #[cfg(unix)]
        kill_on_exit(child.id());

        let server = Self {
            base_url: format!("http://127.0.0.1:{port}"),
            child,
            _data_dir: data_dir,
        };
        server.wait_for_health().await;
        server
    }

    async fn wait_for_health(&self) {
        let client = Client::new();
        // Hashing the seed passwords makes the first start slow.
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            let health = client.get(format!("{}/api/health", self.base_url)).send().await;
            if health.is_ok_and(|response| response.status().is_success()) {
                return;
            }
            sleep(Duration::from_millis(100)).await;
        }
        panic!("fitlady did not report healthy");
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Statics are never dropped, so the child is signalled from an exit hook.
#[cfg(unix)]
fn kill_on_exit(pid: u32) {
    use std::sync::atomic::{AtomicI32, Ordering};

    static PID: AtomicI32 = AtomicI32::new(0);

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }

    if PID.swap(pid as i32, Ordering::SeqCst) == 0 {
        unsafe {
            libc::atexit(on_exit);
        }
    }
}

static SERVER: Lazy<Mutex<Option<Server>>> = Lazy::new(|| Mutex::new(None));

/// A test's exclusive turn against the shared server.
struct Api {
    base_url: String,
    http: Client,
    _turn: MutexGuard<'static, Option<Server>>,
}

impl Api {
    async fn start() -> Self {
        let mut turn = SERVER.lock().await;
        if turn.is_none() {
            *turn = Some(Server::spawn().await);
        }
        let base_url = turn.as_ref().map(|server| server.base_url.clone()).unwrap();
        Self {
            base_url,
            http: Client::builder().redirect(Policy::none()).build().unwrap(),
            _turn: turn,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn login(&self, username: &str, password: &str, mode: &str) -> String {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password, "mode": mode }))
            .send()
            .await
            .unwrap();
        let login: LoginResponse = data(response).await;
        login.token
    }
}

async fn data<T: DeserializeOwned>(response: Response) -> T {
    let status = response.status();
    let body: Value = response.json().await.unwrap();
    assert!(status.is_success(), "unexpected {status}: {body}");
    assert_eq!(body["success"], true);
    serde_json::from_value(body["data"].clone()).unwrap()
}

fn location(response: &Response) -> String {
    response.headers()["location"].to_str().unwrap().to_string()
}

#[tokio::test]
async fn http_health_is_public() {
    let api = Api::start().await;

    let status: String = data(api.http.get(api.url("/api/health")).send().await.unwrap()).await;
    assert_eq!(status, "ok");
}

#[tokio::test]
async fn http_rejects_missing_and_wrong_credentials() {
    let api = Api::start().await;

    let response = api.http.get(api.url("/api/members")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let response = api
        .http
        .post(api.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let member = api.login("member1", "member123", "member").await;
    let response = api
        .http
        .get(api.url("/api/members"))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn http_admin_manages_members() {
    let api = Api::start().await;
    let token = api.login("admin", "admin123", "admin").await;

    let created: Member = data(
        api.http
            .post(api.url("/api/members"))
            .bearer_auth(&token)
            .json(&json!({ "name": "최테스트", "phone": "010-9999-8888" }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(created.phone, "010-9999-8888");

    let page: MemberPage = data(
        api.http
            .get(api.url("/api/members"))
            .query(&[("search", "최테스트")])
            .bearer_auth(&token)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(page.total, 1);
    assert_eq!(page.members[0].id, created.id);

    let far_page: MemberPage = data(
        api.http
            .get(api.url("/api/members"))
            .query(&[("page", usize::MAX.to_string())])
            .bearer_auth(&token)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert!(far_page.members.is_empty());

    let invalid = api
        .http
        .post(api.url("/api/members"))
        .bearer_auth(&token)
        .json(&json!({ "name": "", "phone": "12" }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let deleted = api
        .http
        .delete(api.url(&format!("/api/members/{}", created.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert!(deleted.status().is_success());

    let missing = api
        .http
        .get(api.url(&format!("/api/members/{}", created.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_reservation_workflow_holds_seats() {
    let api = Api::start().await;
    let admin = api.login("admin", "admin123", "admin").await;
    let member = api.login("member1", "member123", "member").await;

    let date = (Local::now().date_naive() + Days::days(3)).to_string();
    let schedule: Schedule = data(
        api.http
            .post(api.url("/api/schedules"))
            .bearer_auth(&admin)
            .json(&json!({
                "title": "저녁 스피닝",
                "type": "강습",
                "instructor": "최강사",
                "date": date,
                "startTime": "19:00:00",
                "endTime": "20:00:00",
                "capacity": 1
            }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    let schedule_url = api.url(&format!("/api/schedules/{}", schedule.id));

    let reservation: Reservation = data(
        api.http
            .post(api.url("/api/reservations"))
            .bearer_auth(&member)
            .json(&json!({ "scheduleId": schedule.id }))
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(reservation.status, ReservationStatus::Pending);

    let view: ScheduleView = data(api.http.get(&schedule_url).bearer_auth(&member).send().await.unwrap()).await;
    assert_eq!(view.available, 0);

    let again = api
        .http
        .post(api.url("/api/reservations"))
        .bearer_auth(&member)
        .json(&json!({ "scheduleId": schedule.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let shrink = api
        .http
        .put(&schedule_url)
        .bearer_auth(&admin)
        .json(&json!({ "capacity": 0 }))
        .send()
        .await
        .unwrap();
    assert!(shrink.status().is_client_error());

    let approved: Reservation = data(
        api.http
            .post(api.url(&format!("/api/reservations/{}/approve", reservation.id)))
            .bearer_auth(&admin)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(approved.status, ReservationStatus::Approved);

    let cancelled: Reservation = data(
        api.http
            .delete(api.url(&format!("/api/reservations/{}/cancel", reservation.id)))
            .bearer_auth(&member)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);

    let view: ScheduleView = data(api.http.get(&schedule_url).bearer_auth(&admin).send().await.unwrap()).await;
    assert_eq!(view.schedule.booked, 0);
    assert_eq!(view.available, 1);
}

#[tokio::test]
async fn http_login_form_sets_cookie_and_guards_pages() {
    let api = Api::start().await;

    let page = api.http.get(api.url("/")).send().await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("name=\"password\""));

    let anonymous = api.http.get(api.url("/admin")).send().await.unwrap();
    assert!(anonymous.status().is_redirection());
    assert!(location(&anonymous).starts_with("/?toast="));

    let response = api
        .http
        .post(api.url("/login"))
        .form(&[("username", "admin"), ("password", "admin123"), ("mode", "admin")])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert!(location(&response).starts_with("/admin?toast="));
    let cookie = response.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("fitlady_auth_token="));

    let dashboard = api
        .http
        .get(api.url("/admin"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);

    let wrong_role = api
        .http
        .get(api.url("/member"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert!(wrong_role.status().is_redirection());
    assert!(location(&wrong_role).starts_with("/admin?toast="));
}
