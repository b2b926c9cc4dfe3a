//! People directories.
//!
//! A [`DirectorySource`] fetches the full filtered result set for a
//! [`DirectoryQuery`] in one call; a [`DirectoryBrowser`] reveals it in
//! fixed-size increments and keeps only the newest query's results.

pub mod browser;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::de;
use crate::error::Result;
use crate::gateway::{ApiRequest, Gateway};

pub use browser::{BrowserSettings, DirectoryBrowser, DirectoryViewState, LoadOutcome};

/// Result ceiling used for the alumni directory. The backend returns every
/// match in one page.
pub const ALUMNI_RESULT_CEILING: u32 = 50_000;

/// Result ceiling used for the faculty directory.
pub const FACULTY_RESULT_CEILING: u32 = 100;

/// Number of passout years offered by the year filter.
const YEAR_OPTIONS: i32 = 20;

/// A person in a directory. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,

    #[serde(default, deserialize_with = "de::string_or_null")]
    pub name: String,

    #[serde(default, deserialize_with = "de::string_or_null")]
    pub department: String,

    #[serde(default, deserialize_with = "de::optional_year")]
    pub passout_year: Option<i32>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub current_company: Option<String>,

    #[serde(default)]
    pub current_position: Option<String>,

    #[serde(default)]
    pub designation: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub profile_photo_url: Option<String>,

    /// Remaining display fields, kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Directory filter criteria. Empty fields mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryQuery {
    pub search: String,
    pub department: String,
    pub passout_year: String,
}

impl DirectoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_passout_year(mut self, year: impl Into<String>) -> Self {
        self.passout_year = year.into();
        self
    }

    /// Query parameters, sent verbatim; empty criteria are omitted.
    pub fn to_params(&self, limit: u32) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        if !self.department.is_empty() {
            params.push(("department".to_string(), self.department.clone()));
        }
        if !self.passout_year.is_empty() {
            params.push(("passout_year".to_string(), self.passout_year.clone()));
        }
        params.push(("limit".to_string(), limit.to_string()));
        params
    }
}

/// Backend collection a browser reads from.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch every entry matching `query`.
    async fn fetch(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>>;

    /// Distinct department values across the whole directory.
    ///
    /// Failures are swallowed: the filter control simply has no options.
    async fn departments(&self) -> Vec<String> {
        match self.fetch(&DirectoryQuery::default()).await {
            Ok(entries) => distinct_departments(&entries),
            Err(e) => {
                tracing::debug!(error = %e, "Could not fetch departments");
                Vec::new()
            }
        }
    }
}

/// `GET /api/alumni/directory`.
#[derive(Clone)]
pub struct AlumniDirectory {
    gateway: Gateway,
    ceiling: u32,
}

impl AlumniDirectory {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            ceiling: ALUMNI_RESULT_CEILING,
        }
    }
}

#[async_trait]
impl DirectorySource for AlumniDirectory {
    async fn fetch(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>> {
        let request = ApiRequest::get("/api/alumni/directory").query_pairs(query.to_params(self.ceiling));
        self.gateway.fetch(request).await
    }
}

/// `GET /api/faculty`.
///
/// The backend filters by department only; the search text is matched
/// locally against name and email.
#[derive(Clone)]
pub struct FacultyDirectory {
    gateway: Gateway,
    ceiling: u32,
}

impl FacultyDirectory {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            ceiling: FACULTY_RESULT_CEILING,
        }
    }
}

#[async_trait]
impl DirectorySource for FacultyDirectory {
    async fn fetch(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>> {
        let server_query = DirectoryQuery::new().with_department(query.department.clone());
        let request = ApiRequest::get("/api/faculty").query_pairs(server_query.to_params(self.ceiling));
        let entries: Option<Vec<DirectoryEntry>> = self.gateway.fetch(request).await?;

        let needle = query.search.to_lowercase();
        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .filter(|f| {
                needle.is_empty()
                    || f.name.to_lowercase().contains(&needle)
                    || f
                        .email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
            })
            .collect())
    }
}

/// Sorted distinct non-empty departments.
pub fn distinct_departments(entries: &[DirectoryEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.department.as_str())
        .filter(|d| !d.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Years offered by the passout-year filter, newest first.
pub fn passout_year_options(current_year: i32) -> Vec<i32> {
    (0..YEAR_OPTIONS).map(|i| current_year - i).collect()
}
