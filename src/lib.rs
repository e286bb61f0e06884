//! Quote card core
//!
//! A random quote with like/dislike voting:
//! - `quote` talks to the remote quote service and probes images
//! - `state` holds the reaction rules, the durable vote ledger, and the display state
//! - `reconciler` turns clicks into server deltas and ledger updates
//! - `session` is the single writer of what the card shows

pub mod config;
pub mod error;
pub mod logging;
pub mod quote;
pub mod reconciler;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{ConfigError, FetchError, LedgerError, ServiceError, StartupError, VoteError};
pub use quote::data::{ProbedQuote, Quote, QuoteId};
pub use reconciler::{VoteOutcome, VoteReconciler};
pub use session::{FetchKind, Session};
pub use state::display::DisplayState;
pub use state::ledger::{Ledger, SharedLedger};
pub use state::reaction::{Direction, Reaction, VoteDelta};
