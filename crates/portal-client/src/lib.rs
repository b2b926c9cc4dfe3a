//! Alumni Portal client core
//!
//! Client-side plumbing shared by every portal front end.
//!
//! This crate provides:
//! - A session store persisting the bearer token and cached user
//! - An authenticated request gateway that invalidates the session on 401
//! - Directory browsing with fetch-once, reveal-in-pages loading
//! - A background notification poller
//! - Typed wrappers over the auth, notification, job, event and content APIs

pub mod api;
pub mod config;
pub mod de;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod poller;
pub mod session;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use config::ClientConfig;
pub use directory::{
    AlumniDirectory, BrowserSettings, DirectoryBrowser, DirectoryEntry, DirectoryQuery,
    DirectorySource, DirectoryViewState, FacultyDirectory, LoadOutcome,
};
pub use error::{PortalError, Result};
pub use gateway::Gateway;
pub use poller::{NotificationPoller, NotificationSummary};
pub use session::{FileStore, Session, SessionStore, UserSummary};

/// Everything a front end needs, wired to one persisted session.
#[derive(Clone)]
pub struct Portal {
    config: ClientConfig,
    gateway: Gateway,
}

impl Portal {
    /// Open the persisted session and connect to the configured backend.
    pub fn from_config(config: ClientConfig) -> Self {
        let session = Arc::new(SessionStore::new(FileStore::open(&config.session_file)));
        let gateway = Gateway::from_config(&config, session);
        Self { config, gateway }
    }

    /// Wire a portal over an existing gateway.
    pub fn with_gateway(config: ClientConfig, gateway: Gateway) -> Self {
        Self { config, gateway }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.gateway.session()
    }

    pub fn auth(&self) -> api::AuthApi {
        api::AuthApi::new(self.gateway.clone())
    }

    pub fn notifications(&self) -> api::NotificationsApi {
        api::NotificationsApi::new(self.gateway.clone())
    }

    pub fn jobs(&self) -> api::JobsApi {
        api::JobsApi::new(self.gateway.clone())
    }

    pub fn events(&self) -> api::EventsApi {
        api::EventsApi::new(self.gateway.clone())
    }

    pub fn content(&self) -> api::ContentApi {
        api::ContentApi::new(self.gateway.clone())
    }

    pub fn alumni_browser(&self) -> DirectoryBrowser {
        DirectoryBrowser::new(
            Arc::new(AlumniDirectory::new(self.gateway.clone())),
            BrowserSettings::from_config(&self.config),
        )
    }

    pub fn faculty_browser(&self) -> DirectoryBrowser {
        DirectoryBrowser::new(
            Arc::new(FacultyDirectory::new(self.gateway.clone())),
            BrowserSettings::from_config(&self.config),
        )
    }

    pub fn notification_poller(&self) -> NotificationPoller {
        NotificationPoller::from_config(&self.config, self.notifications(), self.session().clone())
    }
}
