//! Notification endpoints.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::de;
use crate::error::Result;
use crate::gateway::{path_segment, ApiRequest, Gateway};

/// A notification addressed to the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub message: String,

    #[serde(default = "default_notification_type")]
    pub notification_type: String,

    #[serde(default)]
    pub read: bool,

    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_notification_type() -> String {
    "general".to_string()
}

impl Notification {
    /// Creation time. Naive timestamps are taken as UTC.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Optional list filters.
#[derive(Debug, Clone, Default)]
pub struct NotificationFilter {
    pub read: Option<bool>,
    pub category: Option<String>,
    pub limit: Option<u32>,
}

impl NotificationFilter {
    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(read) = self.read {
            params.push(("read".to_string(), read.to_string()));
        }
        if let Some(category) = self.category.as_ref().filter(|c| !c.is_empty()) {
            params.push(("category".to_string(), category.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

#[derive(Clone)]
pub struct NotificationsApi {
    gateway: Gateway,
}

impl NotificationsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, filter: &NotificationFilter) -> Result<Vec<Notification>> {
        let request = ApiRequest::get("/api/notifications/").query_pairs(filter.to_params());
        self.gateway.fetch(request).await
    }

    pub async fn mark_read(&self, id: &str) -> Result<serde_json::Value> {
        self.gateway
            .fetch(ApiRequest::put(format!("/api/notifications/{}/read", path_segment(id))))
            .await
    }

    pub async fn mark_all_read(&self) -> Result<serde_json::Value> {
        self.gateway
            .fetch(ApiRequest::post("/api/notifications/mark-all-read"))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<serde_json::Value> {
        self.gateway
            .delete(&format!("/api/notifications/{}", path_segment(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::testing::ScriptedTransport;
    use chrono::{Datelike, Timelike};
    use reqwest::{Method, StatusCode};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_list_sends_filters() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            StatusCode::OK,
            serde_json::json!([
                {"id": "n1", "title": "New job", "message": "SRE at Acme", "notification_type": "job", "read": false},
                {"id": 2, "title": "Event", "message": "Reunion", "read": true}
            ]),
        );
        let api = NotificationsApi::new(Gateway::new(
            transport.clone(),
            Arc::new(SessionStore::in_memory()),
        ));

        let filter = NotificationFilter {
            read: Some(false),
            category: Some(String::new()),
            limit: Some(5),
        };
        let list = api.list(&filter).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].id, "2");
        assert_eq!(list[1].notification_type, "general");

        let sent = transport.requests();
        assert_eq!(sent[0].path, "/api/notifications/");
        assert_eq!(
            sent[0].query,
            vec![
                ("read".to_string(), "false".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_mutations_use_expected_routes() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..3 {
            transport.push_json(StatusCode::OK, serde_json::json!({"ok": true}));
        }
        let api = NotificationsApi::new(Gateway::new(
            transport.clone(),
            Arc::new(SessionStore::in_memory()),
        ));

        api.mark_read("n1").await.unwrap();
        api.mark_all_read().await.unwrap();
        api.delete("n1").await.unwrap();

        let routes: Vec<(Method, String)> = transport
            .requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect();
        assert_eq!(
            routes,
            vec![
                (Method::PUT, "/api/notifications/n1/read".to_string()),
                (Method::POST, "/api/notifications/mark-all-read".to_string()),
                (Method::DELETE, "/api/notifications/n1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_ids_stay_in_one_segment() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(StatusCode::OK, serde_json::json!({"ok": true}));
        transport.push_json(StatusCode::OK, serde_json::json!({"ok": true}));
        let api = NotificationsApi::new(Gateway::new(
            transport.clone(),
            Arc::new(SessionStore::in_memory()),
        ));

        api.mark_read("n1/read#x").await.unwrap();
        api.delete("mark-all-read?all").await.unwrap();

        let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "/api/notifications/n1%2Fread%23x/read",
                "/api/notifications/mark-all-read%3Fall",
            ]
        );
    }

    #[test]
    fn test_created_at_parsing() {
        let mut n: Notification = serde_json::from_value(serde_json::json!({
            "id": "n1",
            "created_at": "2024-03-05T10:15:00.123456"
        }))
        .unwrap();
        let ts = n.created_at().unwrap();
        assert_eq!((ts.year(), ts.month(), ts.hour()), (2024, 3, 10));

        n.created_at = Some("2024-03-05T10:15:00+05:30".to_string());
        assert_eq!(n.created_at().unwrap().hour(), 4);

        n.created_at = Some("yesterday".to_string());
        assert!(n.created_at().is_none());
    }
}
