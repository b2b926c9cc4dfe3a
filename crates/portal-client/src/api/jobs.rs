//! Job posting endpoints.

use serde::{Deserialize, Serialize};

use crate::de;
use crate::error::Result;
use crate::gateway::{path_segment, Gateway};

/// A job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub application_link: Option<String>,
    #[serde(default)]
    pub posted_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Fields accepted when posting a job.
#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub job_type: String,
    pub salary_range: Option<String>,
    pub application_link: Option<String>,
}

#[derive(Clone)]
pub struct JobsApi {
    gateway: Gateway,
}

impl JobsApi {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<Job>> {
        self.gateway.get_json("/api/jobs").await
    }

    pub async fn get(&self, id: &str) -> Result<Job> {
        self.gateway
            .get_json(&format!("/api/jobs/{}", path_segment(id)))
            .await
    }

    /// Post a job. Empty optional fields are sent as null.
    pub async fn create(&self, job: &NewJob) -> Result<serde_json::Value> {
        let mut job = job.clone();
        job.salary_range = job.salary_range.filter(|s| !s.trim().is_empty());
        job.application_link = job.application_link.filter(|s| !s.trim().is_empty());
        self.gateway.post_json("/api/jobs", &job).await
    }
}
