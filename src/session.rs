/// The quote card session
///
/// `Session` is the only writer of the display state. It runs fetches
/// through the `QuoteFetcher` and clicks through the `VoteReconciler`,
/// and publishes a new `DisplayState` whenever one of them completes,
/// unless the result has been superseded in the meantime.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{FetchError, ServiceError, StartupError, VoteError};
use crate::quote::data::ProbedQuote;
use crate::quote::fetcher::QuoteFetcher;
use crate::quote::http::{HttpImageProbe, HttpQuoteService};
use crate::quote::service::{ImageProbe, QuoteService};
use crate::reconciler::VoteReconciler;
use crate::state::display::DisplayState;
use crate::state::ledger::{Ledger, SharedLedger};
use crate::state::reaction::Reaction;

/// Which quote to load next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    Random,
    Category(String),
}

pub struct Session {
    fetcher: QuoteFetcher,
    reconciler: VoteReconciler,
    ledger: SharedLedger,
    state: Mutex<Arc<DisplayState>>,
    fetch_seq: AtomicU64,
    top_count: usize,
}

impl Session {
    pub fn new(
        service: Arc<dyn QuoteService>,
        probe: Arc<dyn ImageProbe>,
        ledger: SharedLedger,
        top_count: usize,
    ) -> Self {
        let fetcher = QuoteFetcher::new(service.clone(), probe);
        let reconciler = VoteReconciler::new(service, fetcher.clone(), ledger.clone());
        Self {
            fetcher,
            reconciler,
            ledger,
            state: Mutex::new(Arc::new(DisplayState::default())),
            fetch_seq: AtomicU64::new(0),
            top_count,
        }
    }

    /// Wire up the HTTP service, the image probe and the on-disk ledger
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let service = HttpQuoteService::new(config.api_url.clone(), config.request_timeout)?;
        let probe = HttpImageProbe::new(config.probe_timeout)?;
        let ledger = match &config.ledger_path {
            Some(path) => Ledger::open(path)?,
            None => Ledger::open_default()?,
        };

        Ok(Self::new(
            Arc::new(service),
            Arc::new(probe),
            ledger.into_shared(),
            config.top_count,
        ))
    }

    /// The state currently on screen
    pub fn current(&self) -> Arc<DisplayState> {
        self.state.lock().clone()
    }

    /// Replace the display state when `next` produces a new value
    fn publish(&self, next: impl FnOnce(&DisplayState) -> Option<DisplayState>) -> Arc<DisplayState> {
        let mut state = self.state.lock();
        if let Some(replacement) = next(&state) {
            *state = Arc::new(replacement);
        }
        state.clone()
    }

    pub async fn load_random(&self) -> Arc<DisplayState> {
        self.load(FetchKind::Random).await
    }

    pub async fn load_category(&self, category: impl Into<String>) -> Arc<DisplayState> {
        self.load(FetchKind::Category(category.into())).await
    }

    /// Fetch a quote and display it. Only the most recently started fetch
    /// may replace the card.
    pub async fn load(&self, kind: FetchKind) -> Arc<DisplayState> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(|state| Some(state.begin_fetch(seq)));

        let result = match &kind {
            FetchKind::Random => self.fetcher.fetch_random().await,
            FetchKind::Category(category) => self.fetcher.fetch_random_by_category(category).await,
        };

        self.publish(|state| {
            if state.fetch_seq != seq {
                debug!("Fetch {} superseded by fetch {}", seq, state.fetch_seq);
                return None;
            }

            Some(match result {
                Ok(quote) => {
                    let reaction = self.ledger.lock().get(quote.id());
                    info!("📜 Showing quote {} ({})", quote.id(), quote.quote.category_label());
                    state.with_quote(quote, reaction)
                }
                Err(e) => state.with_fetch_failure(fetch_notice(&e)),
            })
        })
    }

    /// Apply a like/dislike click to the displayed quote.
    ///
    /// The quote id is captured now; if a different quote is on screen
    /// when the server answers, the ledger is still updated for the
    /// clicked quote but the card is left alone.
    pub async fn react(&self, reaction: Reaction) -> Result<Arc<DisplayState>, VoteError> {
        let quote_id = self.current().quote_id().cloned().ok_or(VoteError::NoQuote)?;

        match self.reconciler.react(&quote_id, reaction).await {
            Ok(outcome) => {
                let latest = self.reconciler.settle(&outcome);
                Ok(self.publish(|state| {
                    if state.quote_id() != Some(&outcome.quote_id) || !latest {
                        info!("Discarding stale vote #{} for {}", outcome.token, outcome.quote_id);
                        return None;
                    }
                    Some(state.with_vote(outcome.quote, outcome.reaction))
                }))
            }
            Err(VoteError::InFlight(id)) => {
                debug!("Ignoring click on {} while a vote is in flight", id);
                Err(VoteError::InFlight(id))
            }
            Err(e) => {
                self.publish(|state| {
                    (state.quote_id() == Some(&quote_id))
                        .then(|| state.with_notice(format!("Vote not recorded: {e}")))
                });
                Err(e)
            }
        }
    }

    /// The most liked quotes, for the side panel
    pub async fn most_liked(&self) -> Result<Vec<ProbedQuote>, FetchError> {
        self.fetcher.fetch_most_liked(self.top_count).await
    }

    /// A vote on the displayed quote is outstanding
    pub fn is_voting(&self) -> bool {
        self.current()
            .quote_id()
            .is_some_and(|id| self.reconciler.is_in_flight(id))
    }
}

fn fetch_notice(error: &FetchError) -> String {
    match error {
        ServiceError::NotFound => "No quote data.".to_string(),
        other => format!("Could not load a quote: {other}"),
    }
}
