//! Thin wrappers over the backend REST endpoints.

pub mod auth;
pub mod content;
pub mod events;
pub mod jobs;
pub mod notifications;

pub use auth::{AuthApi, LoginResponse, ProfileUpdate, SignupRequest, VerifyRegistration};
pub use content::ContentApi;
pub use events::{Event, EventsApi, Registration};
pub use jobs::{Job, JobsApi, NewJob};
pub use notifications::{Notification, NotificationFilter, NotificationsApi};
