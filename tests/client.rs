use axum::{Router, routing::get};
use fitlady::client::{ApiClient, AuthFlow, ClientError, PageAccess};
use fitlady::config::storage_keys;
use fitlady::models::{MemberQuery, Role};
use fitlady::{AppConfig, AppState, ClientConfig, router, seed::seed_data};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Serves `app` on an ephemeral port and returns its API base URL.
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn start_app() -> (String, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        data_path: dir.path().join("state.json"),
        ..AppConfig::default()
    };
    let base_url = serve(router(AppState::new(config, seed_data()))).await;
    (base_url, dir)
}

fn quick_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        timeout: Duration::from_millis(500),
        retry_attempts: 2,
        retry_delay: Duration::from_millis(10),
        ..ClientConfig::in_memory(base_url)
    }
}

#[tokio::test]
async fn failed_login_stores_nothing() {
    let (base_url, _dir) = start_app().await;
    let flow = AuthFlow::new(ApiClient::new(ClientConfig::in_memory(&base_url)).unwrap());

    let err = flow
        .login("admin", "not-the-password", Role::Admin, true)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert!(!flow.is_authenticated());
    assert!(!flow.client().store().contains(storage_keys::REMEMBER_ME));
}

#[tokio::test]
async fn login_stores_session_and_authorizes_requests() {
    let (base_url, _dir) = start_app().await;
    let flow = AuthFlow::new(ApiClient::new(ClientConfig::in_memory(&base_url)).unwrap());

    let user = flow.login("admin", "admin123", Role::Admin, true).await.unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(flow.is_admin());
    assert_eq!(flow.check_auto_login(), Some("/admin"));
    assert_eq!(flow.check_page_access(Role::Admin), PageAccess::Granted);

    let page = flow.client().members(&MemberQuery::default()).await.unwrap();
    assert!(page.total >= 4);

    flow.logout().await;
    assert!(!flow.is_authenticated());
    assert_eq!(flow.check_page_access(Role::Admin), PageAccess::RedirectLogin);
}

#[tokio::test]
async fn member_gets_api_error_with_server_message() {
    let (base_url, _dir) = start_app().await;
    let flow = AuthFlow::new(ApiClient::new(ClientConfig::in_memory(&base_url)).unwrap());
    flow.login("member1", "member123", Role::Member, false).await.unwrap();

    let err = flow.client().member_stats().await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
    assert_eq!(err.to_string(), "접근 권한이 없습니다.");
    assert!(flow.is_authenticated());
}

#[tokio::test]
async fn unauthorized_response_clears_stored_tokens() {
    let (base_url, _dir) = start_app().await;
    let client = ApiClient::new(ClientConfig::in_memory(&base_url)).unwrap();
    client.store().set(storage_keys::AUTH_TOKEN, &"bogus");
    client.store().set(storage_keys::REFRESH_TOKEN, &"bogus-refresh");
    client.store().set(storage_keys::USER_MODE, &Role::Member);

    let err = client.verify().await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert!(client.token().is_none());
    assert!(!client.store().contains(storage_keys::REFRESH_TOKEN));
}

#[tokio::test]
async fn slow_server_times_out() {
    let slow = Router::new().route(
        "/api/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "late"
        }),
    );
    let base_url = serve(slow).await;
    let client = ApiClient::new(quick_config(&base_url)).unwrap();

    let err = client.get::<String>("/slow", &[]).await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout));
    assert_eq!(err.to_string(), "요청 시간이 초과되었습니다.");
}

#[tokio::test]
async fn closed_port_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let client = ApiClient::new(quick_config(&format!("http://127.0.0.1:{port}/api"))).unwrap();

    let err = client.get::<String>("/health", &[]).await.unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.to_string(), "네트워크 연결을 확인해주세요.");
}
