/// Display state for the quote card
///
/// `DisplayState` is an immutable value. Every successful fetch or
/// reconciliation produces a new one that replaces the old wholesale;
/// nothing mutates a published state in place.

use super::reaction::Reaction;
use crate::quote::data::{ProbedQuote, QuoteId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    /// Sequence number of the fetch that produced (or is producing) this state
    pub fetch_seq: u64,
    /// A fetch is outstanding
    pub loading: bool,
    /// The quote on screen, `None` before the first fetch or after an empty result
    pub quote: Option<ProbedQuote>,
    /// Ledger reaction for the displayed quote, drives the active button
    pub reaction: Option<Reaction>,
    /// Last surfaced failure, cleared by the next successful step
    pub notice: Option<String>,
}

impl DisplayState {
    /// Id of the quote currently shown
    pub fn quote_id(&self) -> Option<&QuoteId> {
        self.quote.as_ref().map(ProbedQuote::id)
    }

    /// A fetch has started; the old quote stays visible until it completes
    pub fn begin_fetch(&self, fetch_seq: u64) -> Self {
        Self {
            fetch_seq,
            loading: true,
            ..self.clone()
        }
    }

    /// A fetch completed with a quote
    pub fn with_quote(&self, quote: ProbedQuote, reaction: Option<Reaction>) -> Self {
        Self {
            fetch_seq: self.fetch_seq,
            loading: false,
            quote: Some(quote),
            reaction,
            notice: None,
        }
    }

    /// A fetch failed; the card falls back to its empty state
    pub fn with_fetch_failure(&self, notice: impl Into<String>) -> Self {
        Self {
            fetch_seq: self.fetch_seq,
            loading: false,
            quote: None,
            reaction: None,
            notice: Some(notice.into()),
        }
    }

    /// A vote resolved for the displayed quote: counters and image flag
    /// arrive together in `quote`
    pub fn with_vote(&self, quote: ProbedQuote, reaction: Option<Reaction>) -> Self {
        Self {
            quote: Some(quote),
            reaction,
            notice: None,
            ..self.clone()
        }
    }

    /// Surface a failure without touching the quote or counters
    pub fn with_notice(&self, notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
            ..self.clone()
        }
    }
}
