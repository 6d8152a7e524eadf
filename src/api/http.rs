//! HTTP layer: bearer auth, status mapping, 401 handling.
//!
//! This is the only place that looks at status codes. `api/mod.rs` deals in
//! typed requests and responses.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::session::SessionStore;

/// Whether a request carries the stored bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Anonymous,
    Bearer,
}

#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) store: Arc<dyn SessionStore>,
}

impl HttpBackend {
    pub(crate) fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Config {
                message: format!("bad request path {path:?}: {e}"),
            })
    }

    /// Send and decode a JSON body.
    pub(crate) async fn json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, auth).await?;
        let bytes = response.bytes().await.map_err(|e| ApiError::Network {
            message: format!("failed to read response body: {e}"),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse {
            message: format!("{path}: {e}"),
        })
    }

    /// Send and ignore the body (DELETE answers 204).
    pub(crate) async fn empty<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(method, path, body, auth).await?;
        Ok(())
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let mut request = self.client.request(method.clone(), url.clone());

        if auth == Auth::Bearer {
            let Some(token) = self.store.token() else {
                debug!(%method, %url, "no stored session, request not sent");
                return Err(ApiError::Unauthorized {
                    message: "not logged in".into(),
                });
            };
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, "sending request");
        let response = request.send().await?;
        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "response received");

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(self.map_status(status, path, auth, &text))
    }

    fn map_status(&self, status: StatusCode, path: &str, auth: Auth, body: &str) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                if auth == Auth::Bearer {
                    warn!(path, "token rejected, clearing stored session");
                    if let Err(e) = self.store.clear() {
                        warn!(error = %e, "failed to clear session after 401");
                    }
                }
                ApiError::Unauthorized {
                    message: detail(body).unwrap_or_else(|| "invalid or expired token".into()),
                }
            }
            StatusCode::FORBIDDEN => ApiError::Forbidden {
                message: detail(body).unwrap_or_else(|| "permission denied".into()),
            },
            StatusCode::NOT_FOUND => ApiError::NotFound {
                path: path.to_string(),
            },
            StatusCode::BAD_REQUEST => ApiError::Validation {
                fields: parse_field_errors(body),
            },
            _ => ApiError::Server {
                status: status.as_u16(),
                message: detail(body).unwrap_or_else(|| truncate(body, 200)),
            },
        }
    }
}

/// DRF error bodies carry `{"detail": "..."}`.
fn detail(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("detail")?.as_str().map(String::from)
}

/// DRF 400 bodies: `{"field": ["msg", ...], "non_field_errors": [...]}`.
/// Anything unrecognised ends up under `detail`.
pub(crate) fn parse_field_errors(body: &str) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => {
            for (field, value) in map {
                let msgs = match value {
                    serde_json::Value::String(s) => vec![s],
                    serde_json::Value::Array(items) => items
                        .into_iter()
                        .map(|v| match v {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .collect(),
                    other => vec![other.to_string()],
                };
                fields.insert(field, msgs);
            }
        }
        Ok(serde_json::Value::Array(items)) => {
            let msgs = items
                .into_iter()
                .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                .collect();
            fields.insert("non_field_errors".to_string(), msgs);
        }
        _ => {
            let msg = if body.trim().is_empty() {
                "bad request".to_string()
            } else {
                truncate(body, 200)
            };
            fields.insert("detail".to_string(), vec![msg]);
        }
    }
    fields
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
