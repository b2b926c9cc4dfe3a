//! Event endpoints.

use serde::{Deserialize, Serialize};

use crate::de;
use crate::error::Result;
use crate::gateway::{path_segment, ApiRequest, Gateway};

/// A portal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub fee_amount: f64,
    #[serde(default)]
    pub attendees_count: u32,
    #[serde(default)]
    pub event_type: Option<String>,
}

/// Outcome of a registration request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub requires_payment: bool,
    #[serde(default)]
    pub ticket_id: Option<String>,
}

#[derive(Clone)]
pub struct EventsApi {
    gateway: Gateway,
}

impl EventsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Event>> {
        self.gateway.get_json("/api/events").await
    }

    pub async fn get(&self, id: &str) -> Result<Event> {
        self.gateway
            .get_json(&format!("/api/events/{}", path_segment(id)))
            .await
    }

    /// Register for an event. Paid events answer with `requires_payment`.
    pub async fn register(&self, id: &str) -> Result<Registration> {
        self.gateway
            .fetch(ApiRequest::post(format!("/api/events/{}/register", path_segment(id))))
            .await
    }

    /// Finish a paid registration once payment has been verified.
    pub async fn complete_registration(&self, id: &str) -> Result<Registration> {
        self.gateway
            .fetch(ApiRequest::post(format!(
                "/api/events/{}/complete-registration",
                path_segment(id)
            )))
            .await
    }
}
