//! Incremental directory browser.
//!
//! Every query change bumps a generation counter and issues exactly one fetch.
//! Results (and pending reveals) tagged with an older generation are dropped,
//! so the view only ever shows the newest query's entries.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{DirectoryEntry, DirectoryQuery, DirectorySource};
use crate::config::ClientConfig;

/// Reveal pacing.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Entries revealed per "load more".
    pub page_size: usize,

    /// Delay before a reveal is applied. No request is made.
    pub reveal_delay: Duration,
}

impl BrowserSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            reveal_delay: config.reveal_delay,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            page_size: 8,
            reveal_delay: Duration::from_millis(300),
        }
    }
}

/// What the view currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryViewState {
    /// Full result set for the current query.
    pub all: Vec<DirectoryEntry>,

    /// Number of leading entries revealed; never exceeds `all.len()`.
    pub visible_count: usize,

    pub is_loading: bool,

    pub is_loading_more: bool,
}

impl DirectoryViewState {
    pub fn has_more(&self) -> bool {
        self.visible_count < self.all.len()
    }

    pub fn displayed(&self) -> &[DirectoryEntry] {
        &self.all[..self.visible_count.min(self.all.len())]
    }
}

/// Result of a load or reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The view was updated.
    Applied,
    /// The fetch failed; the view now shows no results.
    Failed,
    /// The backend rejected the session, which is now cleared. The view shows
    /// no results.
    Unauthorized,
    /// A newer query took over; this result was discarded.
    Superseded,
    /// Nothing to do.
    Unchanged,
}

struct Inner {
    query: DirectoryQuery,
    generation: u64,
    issued: bool,
    view: DirectoryViewState,
}

/// Fetch-once, reveal-progressively view over a [`DirectorySource`].
#[derive(Clone)]
pub struct DirectoryBrowser {
    source: Arc<dyn DirectorySource>,
    settings: BrowserSettings,
    inner: Arc<Mutex<Inner>>,
}

impl DirectoryBrowser {
    pub fn new(source: Arc<dyn DirectorySource>, settings: BrowserSettings) -> Self {
        Self {
            source,
            settings,
            inner: Arc::new(Mutex::new(Inner {
                query: DirectoryQuery::default(),
                generation: 0,
                issued: false,
                view: DirectoryViewState::default(),
            })),
        }
    }

    /// Current query.
    pub fn query(&self) -> DirectoryQuery {
        self.lock().query.clone()
    }

    /// Copy of the view state.
    pub fn snapshot(&self) -> DirectoryViewState {
        self.lock().view.clone()
    }

    /// Revealed entries.
    pub fn displayed(&self) -> Vec<DirectoryEntry> {
        self.lock().view.displayed().to_vec()
    }

    pub fn has_more(&self) -> bool {
        self.lock().view.has_more()
    }

    /// Load the current query, whether or not it changed.
    pub async fn refresh(&self) -> LoadOutcome {
        let query = self.query();
        self.load(query).await
    }

    /// Switch to `query`. Re-issuing the query already in effect is a no-op.
    pub async fn set_query(&self, query: DirectoryQuery) -> LoadOutcome {
        {
            let inner = self.lock();
            if inner.issued && inner.query == query {
                return LoadOutcome::Unchanged;
            }
        }
        self.load(query).await
    }

    pub async fn set_search(&self, search: impl Into<String>) -> LoadOutcome {
        let query = self.query().with_search(search);
        self.set_query(query).await
    }

    pub async fn set_department(&self, department: impl Into<String>) -> LoadOutcome {
        let query = self.query().with_department(department);
        self.set_query(query).await
    }

    pub async fn set_passout_year(&self, year: impl Into<String>) -> LoadOutcome {
        let query = self.query().with_passout_year(year);
        self.set_query(query).await
    }

    async fn load(&self, query: DirectoryQuery) -> LoadOutcome {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.issued = true;
            inner.query = query.clone();
            inner.view.is_loading = true;
            inner.view.is_loading_more = false;
            inner.generation
        };

        tracing::debug!(generation, search = %query.search, department = %query.department,
            passout_year = %query.passout_year, "Loading directory");

        let result = self.source.fetch(&query).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(
                generation,
                current = inner.generation,
                "Discarding stale directory response"
            );
            return LoadOutcome::Superseded;
        }

        inner.view.is_loading = false;
        match result {
            Ok(entries) => {
                inner.view.visible_count = self.settings.page_size.min(entries.len());
                inner.view.all = entries;
                tracing::debug!(
                    generation,
                    total = inner.view.all.len(),
                    "Directory loaded"
                );
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, "Directory fetch failed, showing no results");
                inner.view.all.clear();
                inner.view.visible_count = 0;
                if e.is_unauthorized() {
                    LoadOutcome::Unauthorized
                } else {
                    LoadOutcome::Failed
                }
            }
        }
    }

    /// Reveal the next page of the current result set.
    pub async fn load_more(&self) -> LoadOutcome {
        let generation = {
            let mut inner = self.lock();
            let view = &mut inner.view;
            if view.is_loading || view.is_loading_more || !view.has_more() {
                return LoadOutcome::Unchanged;
            }
            view.is_loading_more = true;
            inner.generation
        };

        tokio::time::sleep(self.settings.reveal_delay).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            return LoadOutcome::Superseded;
        }

        let view = &mut inner.view;
        view.visible_count = (view.visible_count + self.settings.page_size).min(view.all.len());
        view.is_loading_more = false;
        LoadOutcome::Applied
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PortalError, Result};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    fn entries(prefix: &str, n: usize) -> Vec<DirectoryEntry> {
        (0..n)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "id": format!("{prefix}-{i}"),
                    "name": format!("{prefix} person {i}"),
                    "department": prefix.to_uppercase(),
                    "passout_year": 2010 + (i % 10) as i32
                }))
                .unwrap()
            })
            .collect()
    }

    fn settings() -> BrowserSettings {
        BrowserSettings {
            page_size: 8,
            reveal_delay: Duration::ZERO,
        }
    }

    /// Answers immediately with a fixed number of entries per department.
    struct FixedSource {
        sizes: HashMap<String, usize>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(sizes: &[(&str, usize)]) -> Arc<Self> {
            Arc::new(Self {
                sizes: sizes.iter().map(|(d, n)| (d.to_string(), *n)).collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DirectorySource for FixedSource {
        async fn fetch(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.sizes.get(&query.department) {
                Some(n) => Ok(entries(&query.department.to_lowercase(), *n)),
                None if query.department == "EXPIRED" => Err(PortalError::Unauthorized),
                None => Err(PortalError::Transport("connection reset".to_string())),
            }
        }
    }

    type Reply = Result<Vec<DirectoryEntry>>;

    /// Holds every fetch open until the test releases it.
    struct GatedSource {
        gates: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
        calls: AtomicUsize,
    }

    impl GatedSource {
        fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Reply>>) {
            let (senders, receivers): (Vec<_>, VecDeque<_>) =
                (0..count).map(|_| oneshot::channel()).unzip();
            let source = Arc::new(Self {
                gates: Mutex::new(receivers),
                calls: AtomicUsize::new(0),
            });
            (source, senders)
        }

        async fn wait_for_calls(&self, n: usize) {
            while self.calls.load(Ordering::SeqCst) < n {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl DirectorySource for GatedSource {
        async fn fetch(&self, _query: &DirectoryQuery) -> Result<Vec<DirectoryEntry>> {
            let gate = self.gates.lock().unwrap().pop_front();
            self.calls.fetch_add(1, Ordering::SeqCst);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(PortalError::Transport("gate dropped".to_string()))),
                None => Err(PortalError::Transport("no gate".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_reveal_caps_at_result_size() {
        let source = FixedSource::new(&[("CS", 23)]);
        let browser = DirectoryBrowser::new(source, settings());

        assert_eq!(browser.set_department("CS").await, LoadOutcome::Applied);
        let view = browser.snapshot();
        assert_eq!(view.all.len(), 23);
        assert_eq!(view.visible_count, 8);
        assert!(view.has_more());
        assert!(!view.is_loading);

        assert_eq!(browser.load_more().await, LoadOutcome::Applied);
        assert_eq!(browser.snapshot().visible_count, 16);

        assert_eq!(browser.load_more().await, LoadOutcome::Applied);
        let view = browser.snapshot();
        assert_eq!(view.visible_count, 23);
        assert!(!view.has_more());
        assert_eq!(browser.displayed().len(), 23);

        assert_eq!(browser.load_more().await, LoadOutcome::Unchanged);
        assert_eq!(browser.snapshot().visible_count, 23);
    }

    #[tokio::test]
    async fn test_filter_change_resets_visible_count() {
        let source = FixedSource::new(&[("CS", 12), ("EE", 40)]);
        let browser = DirectoryBrowser::new(source, settings());

        browser.set_department("CS").await;
        browser.load_more().await;
        assert_eq!(browser.snapshot().visible_count, 12);

        assert_eq!(browser.set_department("EE").await, LoadOutcome::Applied);
        let view = browser.snapshot();
        assert_eq!(view.all.len(), 40);
        assert_eq!(view.visible_count, 8);
        assert_eq!(view.displayed()[0].department, "EE");
    }

    #[tokio::test]
    async fn test_short_result_set_is_fully_visible() {
        let source = FixedSource::new(&[("ME", 3)]);
        let browser = DirectoryBrowser::new(source, settings());

        browser.set_department("ME").await;
        let view = browser.snapshot();
        assert_eq!(view.visible_count, 3);
        assert!(!view.has_more());
    }

    #[tokio::test]
    async fn test_failure_shows_empty_state() {
        let source = FixedSource::new(&[("CS", 20)]);
        let browser = DirectoryBrowser::new(source, settings());

        browser.set_department("CS").await;
        assert_eq!(browser.set_department("XX").await, LoadOutcome::Failed);

        let view = browser.snapshot();
        assert!(view.all.is_empty());
        assert_eq!(view.visible_count, 0);
        assert!(!view.is_loading);
        assert_eq!(browser.query().department, "XX");
    }

    #[tokio::test]
    async fn test_rejected_session_is_reported() {
        let source = FixedSource::new(&[("CS", 20)]);
        let browser = DirectoryBrowser::new(source, settings());

        browser.set_department("CS").await;
        assert_eq!(
            browser.set_department("EXPIRED").await,
            LoadOutcome::Unauthorized
        );

        let view = browser.snapshot();
        assert!(view.all.is_empty());
        assert_eq!(view.visible_count, 0);
        assert!(!view.is_loading);
    }

    #[tokio::test]
    async fn test_load_more_ignored_while_loading() {
        let (source, mut gates) = GatedSource::new(2);
        let browser = DirectoryBrowser::new(source.clone(), settings());

        let b = browser.clone();
        let first = tokio::spawn(async move { b.set_department("CS").await });
        source.wait_for_calls(1).await;
        gates.remove(0).send(Ok(entries("cs", 20))).unwrap();
        assert_eq!(first.await.unwrap(), LoadOutcome::Applied);
        assert!(browser.has_more());

        let b = browser.clone();
        let second = tokio::spawn(async move { b.set_department("EE").await });
        source.wait_for_calls(2).await;
        assert!(browser.snapshot().is_loading);

        // The old result set is still held but must not be revealed.
        assert_eq!(browser.load_more().await, LoadOutcome::Unchanged);
        let view = browser.snapshot();
        assert_eq!(view.visible_count, 8);
        assert!(!view.is_loading_more);

        gates.remove(0).send(Ok(entries("ee", 12))).unwrap();
        assert_eq!(second.await.unwrap(), LoadOutcome::Applied);
        assert_eq!(browser.load_more().await, LoadOutcome::Applied);
        assert_eq!(browser.snapshot().visible_count, 12);
    }

    #[tokio::test]
    async fn test_same_query_issues_one_fetch() {
        let source = FixedSource::new(&[("", 5), ("CS", 5)]);
        let browser = DirectoryBrowser::new(source.clone(), settings());

        assert_eq!(browser.refresh().await, LoadOutcome::Applied);
        assert_eq!(browser.set_query(DirectoryQuery::new()).await, LoadOutcome::Unchanged);
        assert_eq!(browser.set_department("CS").await, LoadOutcome::Applied);
        assert_eq!(browser.set_department("CS").await, LoadOutcome::Unchanged);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        assert_eq!(browser.refresh().await, LoadOutcome::Applied);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (source, mut gates) = GatedSource::new(2);
        let browser = DirectoryBrowser::new(source.clone(), settings());

        let b = browser.clone();
        let cs = tokio::spawn(async move { b.set_department("CS").await });
        source.wait_for_calls(1).await;
        assert!(browser.snapshot().is_loading);

        let b = browser.clone();
        let ee = tokio::spawn(async move { b.set_department("EE").await });
        source.wait_for_calls(2).await;

        let cs_gate = gates.remove(0);
        let ee_gate = gates.remove(0);

        ee_gate.send(Ok(entries("ee", 5))).unwrap();
        assert_eq!(ee.await.unwrap(), LoadOutcome::Applied);

        cs_gate.send(Ok(entries("cs", 23))).unwrap();
        assert_eq!(cs.await.unwrap(), LoadOutcome::Superseded);

        let view = browser.snapshot();
        assert_eq!(view.all.len(), 5);
        assert!(view.all.iter().all(|e| e.department == "EE"));
        assert_eq!(view.visible_count, 5);
        assert_eq!(browser.query().department, "EE");
    }

    #[tokio::test]
    async fn test_last_query_wins_regardless_of_arrival_order() {
        let (source, gates) = GatedSource::new(4);
        let browser = DirectoryBrowser::new(source.clone(), settings());

        let mut tasks = Vec::new();
        for (i, search) in ["a", "ab", "abc", "abcd"].into_iter().enumerate() {
            let b = browser.clone();
            tasks.push(tokio::spawn(async move { b.set_search(search).await }));
            source.wait_for_calls(i + 1).await;
        }

        // Newest first, then the older ones trickle in.
        let mut gates: Vec<_> = gates.into_iter().enumerate().collect();
        gates.reverse();
        for (i, gate) in gates {
            gate.send(Ok(entries(&format!("q{i}"), 10 + i))).unwrap();
        }

        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap());
        }
        assert_eq!(
            outcomes,
            vec![
                LoadOutcome::Superseded,
                LoadOutcome::Superseded,
                LoadOutcome::Superseded,
                LoadOutcome::Applied,
            ]
        );

        let view = browser.snapshot();
        assert_eq!(view.all.len(), 13);
        assert_eq!(view.all[0].id, "q3-0");
        assert_eq!(browser.query().search, "abcd");
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_clear_results() {
        let (source, mut gates) = GatedSource::new(2);
        let browser = DirectoryBrowser::new(source.clone(), settings());

        let b = browser.clone();
        let first = tokio::spawn(async move { b.set_department("CS").await });
        source.wait_for_calls(1).await;
        let b = browser.clone();
        let second = tokio::spawn(async move { b.set_department("EE").await });
        source.wait_for_calls(2).await;

        let first_gate = gates.remove(0);
        let second_gate = gates.remove(0);
        second_gate.send(Ok(entries("ee", 9))).unwrap();
        second.await.unwrap();
        first_gate
            .send(Err(PortalError::Transport("timeout".to_string())))
            .unwrap();
        assert_eq!(first.await.unwrap(), LoadOutcome::Superseded);

        assert_eq!(browser.snapshot().all.len(), 9);
    }

    #[tokio::test]
    async fn test_query_change_supersedes_pending_reveal() {
        let source = FixedSource::new(&[("CS", 30), ("EE", 30)]);
        let browser = DirectoryBrowser::new(
            source,
            BrowserSettings {
                page_size: 8,
                reveal_delay: Duration::from_millis(50),
            },
        );
        browser.set_department("CS").await;

        let b = browser.clone();
        let reveal = tokio::spawn(async move { b.load_more().await });
        while !browser.snapshot().is_loading_more {
            tokio::task::yield_now().await;
        }

        // A second reveal while one is pending is ignored.
        assert_eq!(browser.load_more().await, LoadOutcome::Unchanged);

        assert_eq!(browser.set_department("EE").await, LoadOutcome::Applied);
        assert_eq!(reveal.await.unwrap(), LoadOutcome::Superseded);

        let view = browser.snapshot();
        assert_eq!(view.visible_count, 8);
        assert!(!view.is_loading_more);
    }

    #[test]
    fn test_settings_from_config() {
        let config = ClientConfig {
            page_size: 12,
            reveal_delay: Duration::from_millis(10),
            ..ClientConfig::default()
        };
        let settings = BrowserSettings::from_config(&config);
        assert_eq!(settings.page_size, 12);
        assert_eq!(settings.reveal_delay, Duration::from_millis(10));
    }
}
