//! Authenticated request gateway.
//!
//! Every backend call goes through [`Gateway::execute`]: the stored token is
//! attached on the way out, and an unauthorized response clears the session
//! before the error is handed back to the caller. The HTTP transport is not
//! exported, so no request can skip either step.

mod transport;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{PortalError, Result};
use crate::session::SessionStore;

pub use transport::{ApiRequest, ApiResponse, FormPart, FormValue, RequestBody};
pub(crate) use transport::{HttpTransport, Transport};

/// Percent-encode a value used as one path segment.
pub fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Single authenticated request path to the backend.
///
/// The raw transport stays inside the crate:
///
/// ```compile_fail
/// use alumni_portal_client::gateway::HttpTransport;
/// ```
///
/// ```compile_fail
/// use alumni_portal_client::gateway::transport::Transport;
/// ```
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl Gateway {
    /// Gateway over an arbitrary transport.
    pub(crate) fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session }
    }

    /// Gateway talking HTTP to the configured backend.
    pub fn from_config(config: &ClientConfig, session: Arc<SessionStore>) -> Self {
        let transport = HttpTransport::new(&config.base_url, config.request_timeout);
        Self::new(Arc::new(transport), session)
    }

    /// Session this gateway authenticates with.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Inject the bearer credential when a session exists.
    pub fn attach_auth(&self, mut request: ApiRequest) -> ApiRequest {
        let Some(token) = self.session.get_token() else {
            return request;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored token is not a valid header value");
            }
        }
        request
    }

    /// Inspect an inbound response.
    ///
    /// `401` clears the session and yields [`PortalError::Unauthorized`]. Other
    /// error statuses come back as [`PortalError::Status`] with the backend's
    /// message.
    pub fn on_response(&self, response: ApiResponse) -> Result<ApiResponse> {
        if response.status == StatusCode::UNAUTHORIZED {
            if self.session.clear_session() {
                tracing::warn!("Unauthorized response, session invalidated");
            } else {
                tracing::debug!("Unauthorized response without an active session");
            }
            return Err(PortalError::Unauthorized);
        }

        if !response.status.is_success() {
            return Err(PortalError::Status {
                status: response.status,
                detail: response.error_detail(),
            });
        }

        Ok(response)
    }

    /// Send a request through the authenticated pipeline.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let request = self.attach_auth(request);
        let method = request.method.clone();
        let path = request.path.clone();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(method = %method, path = %path, error = %e, "Request failed");
                return Err(e);
            }
        };

        tracing::trace!(method = %method, path = %path, status = %response.status, "Response received");
        self.on_response(response)
    }

    /// Execute and decode the JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.execute(request).await?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(ApiRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<serde_json::Value> {
        self.fetch(ApiRequest::delete(path)).await
    }

    /// Multipart upload.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, parts: Vec<FormPart>) -> Result<T> {
        self.fetch(ApiRequest::post(path).multipart(parts)).await
    }
}
