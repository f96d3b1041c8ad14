//! HttpNotificationApi - reqwest implementation of the NotificationApi port.
//!
//! # Endpoints
//!
//! | Call | Request |
//! |------|---------|
//! | `list` | `GET /notifications` |
//! | `mark_read` | `PUT /notifications/{id}/read` |
//! | `mark_all_read` | `PUT /notifications/read-all` |
//! | `delete` | `DELETE /notifications/{id}` |
//! | `delete_all` | `DELETE /notifications` |
//!
//! The bearer credential is read from the auth session on every call, so a
//! refreshed token is picked up without rebuilding the client. Ids travel as
//! a single percent-encoded path segment.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::NotificationId;
use crate::domain::notification::Notification;
use crate::ports::{ApiError, AuthSession, NotificationApi};

/// Configuration for the REST client.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Base URL of the portal API, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// `GET /notifications` answers either a bare array or `{ "data": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<Notification>),
    Wrapped { data: Vec<Notification> },
}

impl ListBody {
    fn into_notifications(self) -> Vec<Notification> {
        match self {
            ListBody::Bare(list) | ListBody::Wrapped { data: list } => list,
        }
    }
}

/// REST client for the notification endpoints.
pub struct HttpNotificationApi {
    config: HttpApiConfig,
    base: Url,
    client: Client,
    auth: Arc<dyn AuthSession>,
}

impl HttpNotificationApi {
    pub fn new(config: HttpApiConfig, auth: Arc<dyn AuthSession>) -> Result<Self, ApiError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ApiError::network(format!("invalid base URL {}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::network(format!("invalid base URL {}", config.base_url)));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base,
            client,
            auth,
        })
    }

    /// Appends `segments` to the base URL, encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::network(format!("invalid base URL {}", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let credential = self
            .auth
            .current_credential()
            .ok_or(ApiError::MissingCredential)?;
        Ok(self
            .client
            .request(method, self.url(segments)?)
            .bearer_auth(credential.expose()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    timeout_secs: self.config.timeout.as_secs(),
                }
            } else if e.is_connect() {
                ApiError::network(format!("connection failed: {}", e))
            } else {
                ApiError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            code @ (401 | 403) => Err(ApiError::Unauthorized { status: code }),
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::status(code, body))
            }
        }
    }

    async fn send_empty(&self, method: Method, segments: &[&str]) -> Result<(), ApiError> {
        let request = self.request(method, segments)?;
        self.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list(&self) -> Result<Vec<Notification>, ApiError> {
        let request = self.request(Method::GET, &["notifications"])?;
        let response = self.send(request).await?;
        let body: ListBody = response
            .json()
            .await
            .map_err(|e| ApiError::decode(e.to_string()))?;
        Ok(body.into_notifications())
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let key = id.as_key();
        self.send_empty(Method::PUT, &["notifications", &*key, "read"]).await
    }

    async fn mark_all_read(&self) -> Result<(), ApiError> {
        self.send_empty(Method::PUT, &["notifications", "read-all"]).await
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), ApiError> {
        let key = id.as_key();
        self.send_empty(Method::DELETE, &["notifications", &*key]).await
    }

    async fn delete_all(&self) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &["notifications"]).await
    }
}
