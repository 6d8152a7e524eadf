//! Client for the tracker backend.
//!
//! Public API only: status codes and the bearer header are handled in `http.rs`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::session::{Session, SessionStore};

mod http;
pub mod types;

use http::{Auth, HttpBackend};
pub use types::{
    Category, CategoryDraft, Credentials, Profile, ProfileUpdate, Registration, Spend, SpendDraft,
    Task, TaskDraft, TokenResponse,
};
use types::{CompletedPatch, ListBody};

const USER_AGENT_VALUE: &str = concat!("expense-tracker/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpBackend,
}

impl ApiClient {
    pub fn new(
        base_url: Url,
        timeout: Duration,
        store: Arc<dyn SessionStore>,
    ) -> ApiResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ApiError::Config {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                store,
            },
        })
    }

    pub fn from_config(config: &Config, store: Arc<dyn SessionStore>) -> ApiResult<Self> {
        Self::new(
            config.api_url.clone(),
            Duration::from_secs(config.timeout_secs),
            store,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.http.base_url
    }

    pub fn session(&self) -> Option<Session> {
        self.http.store.load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.store.token().is_some()
    }

    // ============= Auth =============

    /// Exchange credentials for a token and persist it.
    pub async fn login(&self, creds: &Credentials) -> ApiResult<Session> {
        debug!(username = %creds.username, "logging in");
        let resp: TokenResponse = self
            .http
            .json(Method::POST, "auth/login/", Some(creds), Auth::Anonymous)
            .await?;

        if resp.token.is_empty() {
            return Err(ApiError::InvalidResponse {
                message: "login succeeded without a token".into(),
            });
        }

        let session = Session::new(resp.token, Some(creds.username.clone()));
        self.http.store.save(&session)?;
        info!(username = %creds.username, "logged in");
        Ok(session)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, reg: &Registration) -> ApiResult<Profile> {
        debug!(username = %reg.username, "registering");
        self.http
            .json(Method::POST, "auth/register/", Some(reg), Auth::Anonymous)
            .await
    }

    pub fn logout(&self) -> ApiResult<()> {
        self.http.store.clear()?;
        info!("logged out");
        Ok(())
    }

    // ============= Spends =============

    pub async fn list_spends(&self) -> ApiResult<Vec<Spend>> {
        self.list("spends/").await
    }

    pub async fn create_spend(&self, draft: &SpendDraft) -> ApiResult<Spend> {
        self.http
            .json(Method::POST, "spends/", Some(draft), Auth::Bearer)
            .await
    }

    pub async fn update_spend(&self, id: i64, draft: &SpendDraft) -> ApiResult<Spend> {
        self.http
            .json(Method::PUT, &format!("spends/{id}/"), Some(draft), Auth::Bearer)
            .await
    }

    pub async fn delete_spend(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("spends/{id}/")).await
    }

    // ============= Tasks =============

    pub async fn list_tasks(&self) -> ApiResult<Vec<Task>> {
        self.list("tasks/").await
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> ApiResult<Task> {
        self.http
            .json(Method::POST, "tasks/", Some(draft), Auth::Bearer)
            .await
    }

    pub async fn update_task(&self, id: i64, draft: &TaskDraft) -> ApiResult<Task> {
        self.http
            .json(Method::PUT, &format!("tasks/{id}/"), Some(draft), Auth::Bearer)
            .await
    }

    pub async fn set_task_completed(&self, id: i64, completed: bool) -> ApiResult<Task> {
        self.http
            .json(
                Method::PATCH,
                &format!("tasks/{id}/"),
                Some(&CompletedPatch { completed }),
                Auth::Bearer,
            )
            .await
    }

    pub async fn delete_task(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("tasks/{id}/")).await
    }

    // ============= Categories =============

    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        self.list("categories/").await
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> ApiResult<Category> {
        self.http
            .json(Method::POST, "categories/", Some(draft), Auth::Bearer)
            .await
    }

    pub async fn delete_category(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("categories/{id}/")).await
    }

    // ============= Profile =============

    pub async fn get_profile(&self) -> ApiResult<Profile> {
        self.http
            .json::<(), _>(Method::GET, "profile/", None, Auth::Bearer)
            .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        self.http
            .json(Method::PATCH, "profile/", Some(update), Auth::Bearer)
            .await
    }

    async fn list<T: serde::de::DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let body: ListBody<T> = self
            .http
            .json::<(), _>(Method::GET, path, None, Auth::Bearer)
            .await?;
        Ok(body.into_vec())
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.http
            .empty::<()>(Method::DELETE, path, None, Auth::Bearer)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::normalize_base_url;
    use crate::session::MemorySessionStore;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(
            normalize_base_url(base).unwrap(),
            Duration::from_secs(5),
            Arc::new(MemorySessionStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn paths_join_under_base() {
        let c = client("http://localhost:8000/api");
        assert_eq!(
            c.http.url("spends/7/").unwrap().as_str(),
            "http://localhost:8000/api/spends/7/"
        );
        assert_eq!(
            c.http.url("/tasks/").unwrap().as_str(),
            "http://localhost:8000/api/tasks/"
        );
    }

    #[tokio::test]
    async fn authenticated_call_without_token_fails_fast() {
        // nothing listens here; a sent request would be a network error
        let c = client("http://127.0.0.1:9/api/");
        assert!(!c.is_authenticated());

        let err = c.list_spends().await.unwrap_err();
        assert!(err.is_unauthorized(), "got {err:?}");
    }
}
