//! Authentication endpoints.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gateway::Gateway;
use crate::session::UserSummary;

/// Registration check performed before signup.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRegistration {
    pub registration_number: String,
    pub department: String,
    pub passout_year: i32,
}

/// New alumni account.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub dob: String,
    pub department: String,
    pub phone: String,
    pub email: String,
    pub registration_number: String,
    pub passout_year: i32,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body returned by both login endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: UserSummary,
}

/// Partial profile update; unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passout_year: Option<i32>,
}

/// Login, signup and profile calls.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Gateway,
}

impl AuthApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn verify_registration(&self, data: &VerifyRegistration) -> Result<serde_json::Value> {
        self.gateway
            .post_json("/api/auth/verify-registration", data)
            .await
    }

    pub async fn signup(&self, data: &SignupRequest) -> Result<serde_json::Value> {
        self.gateway.post_json("/api/auth/signup", data).await
    }

    /// Log in and persist the returned session.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary> {
        self.login_at("/api/auth/login", email, password).await
    }

    /// Administrator login; persists the session the same way.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<UserSummary> {
        self.login_at("/api/admin/login", email, password).await
    }

    async fn login_at(&self, path: &str, email: &str, password: &str) -> Result<UserSummary> {
        let response: LoginResponse = self
            .gateway
            .post_json(path, &Credentials { email, password })
            .await?;

        self.gateway
            .session()
            .establish(&response.access_token, &response.user)?;
        Ok(response.user)
    }

    /// Current user as the backend sees it.
    pub async fn me(&self) -> Result<UserSummary> {
        self.gateway.get_json("/api/auth/me").await
    }

    /// Update the profile and refresh the cached user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserSummary> {
        let user: UserSummary = self.gateway.patch_json("/api/auth/me", update).await?;

        let session = self.gateway.session();
        if let Some(token) = session.get_token() {
            session.establish(&token, &user)?;
        }
        Ok(user)
    }

    /// Drop the local session. There is no backend call.
    pub fn logout(&self) -> bool {
        self.gateway.session().clear_session()
    }
}
