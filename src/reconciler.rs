/// Vote reconciliation
///
/// Turns one like/dislike click into exactly one server request and one
/// ledger update, then hands back the server's counters together with a
/// fresh image probe.
///
/// Reactions are serialized per quote: while a request for a quote is
/// outstanding, further clicks on that quote are rejected. Every request
/// also carries a monotonically increasing token so the display layer
/// can tell whether an outcome is still the latest for its quote.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::VoteError;
use crate::quote::data::{ProbedQuote, QuoteId};
use crate::quote::fetcher::QuoteFetcher;
use crate::quote::service::QuoteService;
use crate::state::ledger::SharedLedger;
use crate::state::reaction::{transition, Reaction, Transition, VoteDelta};

/// A resolved vote, keyed to the quote captured at click time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub quote_id: QuoteId,
    pub token: u64,
    /// The request that was sent
    pub delta: VoteDelta,
    /// Server counters plus the re-probed image flag
    pub quote: ProbedQuote,
    /// Ledger state after the vote
    pub reaction: Option<Reaction>,
}

pub struct VoteReconciler {
    service: Arc<dyn QuoteService>,
    fetcher: QuoteFetcher,
    ledger: SharedLedger,
    in_flight: Mutex<HashSet<QuoteId>>,
    latest: Mutex<HashMap<QuoteId, u64>>,
    next_token: AtomicU64,
}

/// Marks a quote as having an outstanding request until dropped.
/// Dropping the `react` future releases it too. An unsettled guard also
/// retires its token, so failed or abandoned votes leave nothing behind.
struct InFlightGuard<'a> {
    reconciler: &'a VoteReconciler,
    quote_id: QuoteId,
    token: u64,
    settled: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.reconciler.in_flight.lock().remove(&self.quote_id);
        if !self.settled {
            self.reconciler.retire(&self.quote_id, self.token);
        }
    }
}

impl VoteReconciler {
    pub fn new(service: Arc<dyn QuoteService>, fetcher: QuoteFetcher, ledger: SharedLedger) -> Self {
        Self {
            service,
            fetcher,
            ledger,
            in_flight: Mutex::new(HashSet::new()),
            latest: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Apply a click on `clicked` for `quote_id`.
    ///
    /// On failure nothing changes: the ledger keeps its entry and the
    /// caller keeps its counters.
    pub async fn react(&self, quote_id: &QuoteId, clicked: Reaction) -> Result<VoteOutcome, VoteError> {
        let mut guard = self.begin(quote_id)?;
        let token = guard.token;

        let current = self.ledger.lock().get(quote_id);
        let Transition { delta, next } = transition(current, clicked);

        info!(
            "Vote #{} on {}: {} {}{}",
            token,
            quote_id,
            delta.direction.as_str(),
            delta.kind,
            if delta.reverse_opposite { " (reverse opposite)" } else { "" }
        );

        let updated = self.service.vote(quote_id, delta).await.map_err(|e| {
            warn!("Vote #{} on {} failed: {}", token, quote_id, e);
            e
        })?;

        self.ledger.lock().store(quote_id, next)?;

        // The response may carry a different image than the one on screen
        let quote = self.fetcher.probe_quote(updated).await;
        guard.settled = true;

        Ok(VoteOutcome {
            quote_id: quote_id.clone(),
            token,
            delta,
            quote,
            reaction: next,
        })
    }

    /// True when no later request has been issued for the outcome's quote
    pub fn is_latest(&self, outcome: &VoteOutcome) -> bool {
        self.latest.lock().get(&outcome.quote_id) == Some(&outcome.token)
    }

    /// Consume an outcome's token. Returns whether it was still the latest
    /// for its quote; only then is the quote's entry dropped.
    pub fn settle(&self, outcome: &VoteOutcome) -> bool {
        self.retire(&outcome.quote_id, outcome.token)
    }

    /// A request for `quote_id` is outstanding
    pub fn is_in_flight(&self, quote_id: &QuoteId) -> bool {
        self.in_flight.lock().contains(quote_id)
    }

    /// Ledger reaction for rendering button state
    pub fn reaction(&self, quote_id: &QuoteId) -> Option<Reaction> {
        self.ledger.lock().get(quote_id)
    }

    fn begin(&self, quote_id: &QuoteId) -> Result<InFlightGuard<'_>, VoteError> {
        if !self.in_flight.lock().insert(quote_id.clone()) {
            return Err(VoteError::InFlight(quote_id.clone()));
        }

        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        self.latest.lock().insert(quote_id.clone(), token);

        Ok(InFlightGuard {
            reconciler: self,
            quote_id: quote_id.clone(),
            token,
            settled: false,
        })
    }

    fn retire(&self, quote_id: &QuoteId, token: u64) -> bool {
        let mut latest = self.latest.lock();
        if latest.get(quote_id) == Some(&token) {
            latest.remove(quote_id);
            true
        } else {
            false
        }
    }
}
