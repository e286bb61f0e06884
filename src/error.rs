/// Error types for the quote card
///
/// Every failure in this crate degrades to "no change" or reduced visual
/// fidelity; none of these are fatal to the process.

use crate::quote::data::QuoteId;

/// Failure talking to the remote quote service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Network error, timeout, or connection refused
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service has no quote to hand out
    #[error("no quote found")]
    NotFound,

    /// Any other non-success response
    #[error("service responded with {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not a quote record
    #[error("invalid quote record: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot be joined with an endpoint path
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Quote retrieval shares the service taxonomy
pub type FetchError = ServiceError;

/// Failure reading or writing the durable vote ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("ledger directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine a user data directory")]
    NoDataDir,

    /// A stored value outside `{like, dislike}`
    #[error("unknown reaction stored in ledger: {0}")]
    UnknownReaction(String),
}

/// Failure of a like/dislike click
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    /// Nothing is displayed, so there is nothing to vote on
    #[error("no quote is displayed")]
    NoQuote,

    /// A reaction for this quote has not resolved yet
    #[error("a vote on quote {0} is already in flight")]
    InFlight(QuoteId),

    #[error("vote request failed: {0}")]
    Service(#[from] ServiceError),

    #[error("ledger update failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Invalid configuration value
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Failure wiring up the application at launch
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not build HTTP client: {0}")]
    Service(#[from] ServiceError),

    #[error("could not open vote ledger: {0}")]
    Ledger(#[from] LedgerError),
}
