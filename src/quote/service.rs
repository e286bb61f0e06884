//! Seams to the outside world: the remote quote service and the image
//! reachability probe. `http.rs` holds the real implementations.

use async_trait::async_trait;

use super::data::{Quote, QuoteId};
use crate::error::ServiceError;
use crate::state::reaction::VoteDelta;

/// Remote quote service endpoints the card depends on
#[async_trait]
pub trait QuoteService: Send + Sync {
    /// `GET /quotes/get_random_quote/`
    async fn random_quote(&self) -> Result<Quote, ServiceError>;

    /// `GET /quotes/get_random_quote_by_category/?category=<name>`
    async fn random_quote_by_category(&self, category: &str) -> Result<Quote, ServiceError>;

    /// `GET /quotes/get_most_liked_quotes/?count=<n>`
    async fn most_liked_quotes(&self, count: usize) -> Result<Vec<Quote>, ServiceError>;

    /// `PATCH /quotes/<id>/<kind>/?direction=<dir>[&reverse_opposite=true]`
    ///
    /// Returns the quote with the server's authoritative counters.
    async fn vote(&self, quote_id: &QuoteId, delta: VoteDelta) -> Result<Quote, ServiceError>;
}

/// Best-effort check that an image reference can be shown
#[async_trait]
pub trait ImageProbe: Send + Sync {
    /// Never fails: any error means "not accessible"
    async fn is_accessible(&self, image_url: &str) -> bool;
}
