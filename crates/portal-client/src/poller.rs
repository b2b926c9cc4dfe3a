//! Background notification polling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::api::{Notification, NotificationFilter, NotificationsApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::session::SessionStore;

/// Latest notifications and the unread count among them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSummary {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

impl NotificationSummary {
    pub fn new(notifications: Vec<Notification>) -> Self {
        let unread = notifications.iter().filter(|n| !n.read).count();
        Self {
            notifications,
            unread,
        }
    }
}

/// Releases the in-flight flag even when the poll future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Polls the notification list while a session exists.
#[derive(Clone)]
pub struct NotificationPoller {
    api: NotificationsApi,
    session: Arc<SessionStore>,
    interval: Duration,
    limit: u32,
    in_flight: Arc<AtomicBool>,
    summary_tx: Arc<watch::Sender<NotificationSummary>>,
}

impl NotificationPoller {
    pub fn new(
        api: NotificationsApi,
        session: Arc<SessionStore>,
        interval: Duration,
        limit: u32,
    ) -> Self {
        let (summary_tx, _) = watch::channel(NotificationSummary::default());
        Self {
            api,
            session,
            interval,
            limit,
            in_flight: Arc::new(AtomicBool::new(false)),
            summary_tx: Arc::new(summary_tx),
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        api: NotificationsApi,
        session: Arc<SessionStore>,
    ) -> Self {
        Self::new(
            api,
            session,
            config.notification_interval,
            config.notification_limit,
        )
    }

    /// Follow summary updates.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSummary> {
        self.summary_tx.subscribe()
    }

    /// Current summary.
    pub fn summary(&self) -> NotificationSummary {
        self.summary_tx.borrow().clone()
    }

    /// Run one poll. Returns `true` if the summary was refreshed.
    ///
    /// Skipped while another poll is running or when nobody is logged in.
    /// A failed poll keeps the previous summary.
    pub async fn poll_once(&self) -> bool {
        if !self.session.is_authenticated() {
            tracing::trace!("No session, skipping notification poll");
            return false;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("Notification poll already in flight");
            return false;
        }

        let _guard = InFlight(&self.in_flight);

        let filter = NotificationFilter {
            limit: Some(self.limit),
            ..NotificationFilter::default()
        };
        let result = self.api.list(&filter).await;

        match result {
            Ok(notifications) => {
                let summary = NotificationSummary::new(notifications);
                tracing::trace!(unread = summary.unread, "Notifications polled");
                self.summary_tx.send_replace(summary);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Notification poll failed");
                false
            }
        }
    }

    /// Poll immediately, then on every interval tick.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let poller = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                poller.poll_once().await;
            }
        })
    }

    /// Mark one notification read and update the local summary.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        self.api.mark_read(id).await?;

        self.summary_tx.send_modify(|summary| {
            for n in summary.notifications.iter_mut().filter(|n| n.id == id) {
                n.read = true;
            }
            summary.unread = summary.notifications.iter().filter(|n| !n.read).count();
        });
        Ok(())
    }
}
