use super::{ApiClient, ClientResult};
use crate::config::storage_keys;
use crate::models::{LoginRequest, PublicUser, Role};
use tracing::{info, warn};

/// Outcome of guarding a page that needs a given login mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAccess {
    Granted,
    RedirectLogin,
    Redirect(String),
}

/// Login state machine on top of [`ApiClient`] and its session store.
pub struct AuthFlow {
    client: ApiClient,
}

impl AuthFlow {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Stores the session only when the server accepts the credentials.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        mode: Role,
        remember_me: bool,
    ) -> ClientResult<PublicUser> {
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
            mode: Some(mode),
            remember_me,
        };
        let response = self.client.login(&request).await?;

        let store = self.client.store();
        store.set(storage_keys::AUTH_TOKEN, &response.token);
        store.set(storage_keys::REFRESH_TOKEN, &response.refresh_token);
        store.set(storage_keys::USER_INFO, &response.user);
        store.set(storage_keys::USER_MODE, &mode);
        if remember_me {
            store.set(storage_keys::REMEMBER_ME, &true);
        } else {
            store.remove(storage_keys::REMEMBER_ME);
        }
        info!(username = %response.user.username, mode = mode.as_str(), "logged in");
        Ok(response.user)
    }

    /// Ends the session; local state is cleared even when the server call fails.
    pub async fn logout(&self) {
        if self.client.token().is_some() {
            if let Err(err) = self.client.logout().await {
                warn!("server logout failed: {err}");
            }
        }
        self.clear();
    }

    pub fn clear(&self) {
        let store = self.client.store();
        for key in [
            storage_keys::AUTH_TOKEN,
            storage_keys::REFRESH_TOKEN,
            storage_keys::USER_INFO,
            storage_keys::USER_MODE,
            storage_keys::REMEMBER_ME,
        ] {
            store.remove(key);
        }
    }

    /// Dashboard to jump to when a remembered session is present.
    pub fn check_auto_login(&self) -> Option<&'static str> {
        let store = self.client.store();
        let remembered = store.get::<bool>(storage_keys::REMEMBER_ME).unwrap_or(false);
        if self.client.token().is_none() || !remembered {
            return None;
        }
        store
            .get::<Role>(storage_keys::USER_MODE)
            .map(Role::dashboard_path)
    }

    pub fn current_user(&self) -> Option<PublicUser> {
        self.client.store().get(storage_keys::USER_INFO)
    }

    pub fn current_mode(&self) -> Option<Role> {
        self.client.store().get(storage_keys::USER_MODE)
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.token().is_some() && self.current_user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user()
            .is_some_and(|user| user.role == Role::Admin)
    }

    pub fn check_page_access(&self, required: Role) -> PageAccess {
        if !self.is_authenticated() {
            return PageAccess::RedirectLogin;
        }
        match self.current_mode() {
            Some(mode) if mode == required => PageAccess::Granted,
            Some(mode) => PageAccess::Redirect(mode.dashboard_path().to_string()),
            None => PageAccess::RedirectLogin,
        }
    }
}
