//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{PortalError, Result};
use crate::gateway::{ApiRequest, ApiResponse, Transport};
use crate::session::UserSummary;

/// Transport that replays queued responses in order and records requests.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: StatusCode, body: serde_json::Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse::json_body(status, &body)));
    }

    pub fn push_error(&self, error: PortalError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortalError::Transport("no scripted response".to_string())))
    }
}

pub fn sample_user() -> UserSummary {
    serde_json::from_value(serde_json::json!({
        "id": "u-1",
        "name": "Asha Rao",
        "email": "asha@example.edu",
        "role": "alumni",
        "department": "CS",
        "passout_year": 2018
    }))
    .unwrap()
}
