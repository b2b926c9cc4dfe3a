//! Admin content endpoints, keyed by section name.

use std::path::Path;

use crate::error::Result;
use crate::gateway::{path_segment, FormPart, Gateway};

#[derive(Clone)]
pub struct ContentApi {
    gateway: Gateway,
}

impl ContentApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// All sections.
    pub async fn get_all(&self) -> Result<serde_json::Value> {
        self.gateway.get_json("/api/admin/content").await
    }

    pub async fn get_section(&self, section: &str) -> Result<serde_json::Value> {
        self.gateway
            .get_json(&format!("/api/admin/content/{}", path_segment(section)))
            .await
    }

    pub async fn set_section(
        &self,
        section: &str,
        data: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.gateway
            .put_json(
                &format!("/api/admin/content/{}", path_segment(section)),
                data,
            )
            .await
    }

    /// Upload an image for a section.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content: Vec<u8>,
        section: &str,
    ) -> Result<serde_json::Value> {
        let parts = vec![
            FormPart::file("file", file_name, content),
            FormPart::text("section", section),
        ];
        self.gateway.upload("/api/admin/content/upload", parts).await
    }

    /// Read a file from disk and upload it.
    pub async fn upload_image_file(&self, path: &Path, section: &str) -> Result<serde_json::Value> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        self.upload_image(&file_name, content, section).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{FormValue, RequestBody};
    use crate::session::SessionStore;
    use crate::testing::ScriptedTransport;
    use reqwest::{Method, StatusCode};
    use std::sync::Arc;

    fn api_with(transport: Arc<ScriptedTransport>) -> ContentApi {
        ContentApi::new(Gateway::new(transport, Arc::new(SessionStore::in_memory())))
    }

    #[tokio::test]
    async fn test_set_section_puts_json() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(StatusCode::OK, serde_json::json!({"updated": true}));
        let api = api_with(transport.clone());

        let hero = serde_json::json!({"title": "Welcome home", "subtitle": "Class of 2024"});
        api.set_section("hero", &hero).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::PUT);
        assert_eq!(sent.path, "/api/admin/content/hero");
        assert_eq!(sent.body, RequestBody::Json(hero));
    }

    #[tokio::test]
    async fn test_upload_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(StatusCode::OK, serde_json::json!({"url": "/static/banner.png"}));
        let api = api_with(transport.clone());

        api.upload_image_file(&path, "hero").await.unwrap();

        match &transport.requests()[0].body {
            RequestBody::Multipart(parts) => {
                assert_eq!(parts.len(), 2);
                match &parts[0].value {
                    FormValue::File { file_name, content, .. } => {
                        assert_eq!(file_name, "banner.png");
                        assert_eq!(content.len(), 4);
                    }
                    other => panic!("unexpected part: {other:?}"),
                }
                assert_eq!(parts[1], FormPart::text("section", "hero"));
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
