use crate::api::{ApiClient, HEALTH_TIMEOUT};
use crate::error::{SearchError, UNKNOWN_SCRAPE_ERROR};
use crate::model::{SearchQuery, SearchResult};
use crate::state::{ViewState, ViewStateMachine};
use crate::view::build_card_view;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives one search at a time from submission to a Results or Error state.
pub struct SearchController {
    api: ApiClient,
    timeout: Duration,
    currency_symbol: String,
    state: ViewStateMachine,
    last_query: Mutex<Option<SearchQuery>>,
}

impl SearchController {
    pub fn new(api: ApiClient, timeout: Duration, currency_symbol: &str) -> Self {
        Self {
            api,
            timeout,
            currency_symbol: currency_symbol.to_string(),
            state: ViewStateMachine::new(),
            last_query: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state.current()
    }

    /// HTTP client shared with the API, for render-time image checks.
    pub fn http(&self) -> &reqwest::Client {
        self.api.http()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub async fn last_query(&self) -> Option<SearchQuery> {
        self.last_query.lock().await.clone()
    }

    /// Validate the input and run the search.
    ///
    /// `Err` means the submission was rejected (blank keyword, or a search
    /// already in flight) and the view state is unchanged. Every other
    /// outcome, failures included, comes back as the new `ViewState`.
    pub async fn submit_search(
        &self,
        keyword: &str,
        max_results: u32,
    ) -> Result<ViewState, SearchError> {
        let query = SearchQuery::new(keyword, max_results)?;
        self.run(query).await
    }

    /// Re-issue the last query unchanged. A blank `keyword_field`, or no
    /// previous query, makes this a no-op: `Ok(None)`, state untouched.
    pub async fn retry(&self, keyword_field: &str) -> Result<Option<ViewState>, SearchError> {
        if keyword_field.trim().is_empty() {
            tracing::debug!("Retry ignored: keyword field is empty");
            return Ok(None);
        }
        let Some(query) = self.last_query().await else {
            tracing::debug!("Retry ignored: nothing was searched yet");
            return Ok(None);
        };
        self.run(query).await.map(Some)
    }

    /// Await `submission` (a `submit_search` or `retry` on this controller),
    /// calling `on_loading` whenever Loading is published while it runs.
    pub async fn with_loading_notice<F, T, E>(
        &self,
        submission: F,
        mut on_loading: impl FnMut() -> Result<(), E>,
    ) -> Result<T, E>
    where
        F: Future<Output = T>,
    {
        let mut rx = self.subscribe();
        rx.mark_unchanged();
        tokio::pin!(submission);

        loop {
            tokio::select! {
                biased;
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Ok(submission.await);
                    }
                    let loading = rx.borrow_and_update().is_loading();
                    if loading {
                        on_loading()?;
                    }
                }
                outcome = &mut submission => return Ok(outcome),
            }
        }
    }

    /// Best-effort check of the API's health endpoint. Only logs.
    pub async fn probe_health(&self) {
        match self.api.health(HEALTH_TIMEOUT).await {
            Ok(health) => tracing::info!("API is up: status={}", health.status),
            Err(e) => tracing::warn!("Could not verify the API at {}: {}", self.api.base_url(), e),
        }
    }

    async fn run(&self, query: SearchQuery) -> Result<ViewState, SearchError> {
        if !self.state.begin_loading() {
            return Err(SearchError::Busy);
        }
        let mut guard = SettleOnDrop::new(&self.state);
        tracing::info!(
            "Searching \"{}\" (max: {})",
            query.keyword(),
            query.max_results()
        );
        *self.last_query.lock().await = Some(query.clone());

        let outcome = match self.api.scrape(&query, self.timeout).await {
            Ok(result) => self.project(result),
            Err(e) => ViewState::Error { error: e },
        };

        match &outcome {
            ViewState::Results { result, .. } => tracing::info!(
                "Search finished: {} products in {}s",
                result.total(),
                result.execution_time_secs
            ),
            ViewState::Error {
                error: SearchError::Transport(cause),
            } => tracing::warn!("Search failed, transport error: {}", cause),
            ViewState::Error { error } => tracing::warn!("Search failed: {}", error),
            _ => {}
        }

        guard.settle(outcome.clone());
        Ok(outcome)
    }

    fn project(&self, result: SearchResult) -> ViewState {
        if !result.success {
            let message = result
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SCRAPE_ERROR.to_string());
            return ViewState::Error {
                error: SearchError::Application(message),
            };
        }

        let views = result
            .products
            .iter()
            .map(|p| build_card_view(p, &self.currency_symbol))
            .collect();
        ViewState::Results { result, views }
    }
}

/// Settles a Loading state even if the search future is dropped before it
/// finishes, so an abandoned search never leaves the controller Busy.
struct SettleOnDrop<'a> {
    state: &'a ViewStateMachine,
    settled: bool,
}

impl<'a> SettleOnDrop<'a> {
    fn new(state: &'a ViewStateMachine) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn settle(&mut self, outcome: ViewState) {
        self.settled = true;
        self.state.settle(outcome);
    }
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Search dropped while loading; marking it cancelled");
            self.state.settle(ViewState::Error {
                error: SearchError::Cancelled,
            });
        }
    }
}
