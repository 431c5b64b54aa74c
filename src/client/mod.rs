//! Typed HTTP client for the JSON API.
//!
//! Keeps the login state in a [`SessionStore`] under the same keys the web
//! front end uses, so a client session and a browser session look alike.

mod auth;
mod endpoints;
mod error;
mod session;

pub use auth::{AuthFlow, PageAccess};
pub use error::{ClientError, ClientResult, NETWORK_MESSAGE, TIMEOUT_MESSAGE};
pub use session::SessionStore;

use crate::config::{ClientConfig, storage_keys};
use crate::models::ApiResponse;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let store = match &config.state_path {
            Some(path) => SessionStore::open(path),
            None => SessionStore::in_memory(),
        };
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: ClientConfig, store: Arc<SessionStore>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;
        Ok(Self {
            http,
            config,
            store,
        })
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(storage_keys::AUTH_TOKEN)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, auth: bool) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token() {
            Some(token) if auth => builder.bearer_auth(token),
            _ => builder,
        }
    }

    /// GET with query parameters; `None` values are left out.
    ///
    /// Network failures and timeouts are retried up to the configured number
    /// of attempts.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
    ) -> ClientResult<T> {
        let params: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (*key, value)))
            .collect();

        let attempts = self.config.retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            let builder = self.request(Method::GET, path, true).query(&params);
            match self.send(builder).await {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(path, attempt, "request failed, retrying: {err}");
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                outcome => return outcome,
            }
        }
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, auth: bool) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path, auth).json(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PUT, path, true).json(body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::PATCH, path, true).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::DELETE, path, true)).await
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(ClientError::from_transport)?;
        debug!(%status, len = bytes.len(), "api response");

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                self.forget_session();
            }
            return Err(ClientError::from_status(status, body.message, body.error));
        }

        let envelope: ApiResponse<T> =
            serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(envelope.data)
    }

    fn forget_session(&self) {
        self.store.remove(storage_keys::AUTH_TOKEN);
        self.store.remove(storage_keys::REFRESH_TOKEN);
        self.store.remove(storage_keys::USER_INFO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_without_double_slashes() {
        let client = ApiClient::new(ClientConfig::in_memory("http://localhost:8080/api/")).unwrap();
        assert_eq!(client.url("/members"), "http://localhost:8080/api/members");
        assert_eq!(client.url("members/3"), "http://localhost:8080/api/members/3");
    }

    #[test]
    fn unauthorized_response_forgets_tokens() {
        let client = ApiClient::new(ClientConfig::in_memory("http://localhost")).unwrap();
        client.store().set(storage_keys::AUTH_TOKEN, &"t");
        client.store().set(storage_keys::REFRESH_TOKEN, &"r");
        client.store().set(storage_keys::USER_MODE, &"admin");

        client.forget_session();

        assert!(client.token().is_none());
        assert!(!client.store().contains(storage_keys::REFRESH_TOKEN));
        assert!(client.store().contains(storage_keys::USER_MODE));
    }
}
