use std::sync::Arc;
use tracing::{debug, warn};

use super::data::{ProbedQuote, Quote};
use super::service::{ImageProbe, QuoteService};
use crate::error::FetchError;

/// Retrieves quotes and attaches the image accessibility flag
///
/// A quote is only handed on once its image has been probed. Probe
/// failures never fail the fetch.
#[derive(Clone)]
pub struct QuoteFetcher {
    service: Arc<dyn QuoteService>,
    probe: Arc<dyn ImageProbe>,
}

impl QuoteFetcher {
    pub fn new(service: Arc<dyn QuoteService>, probe: Arc<dyn ImageProbe>) -> Self {
        Self { service, probe }
    }

    /// Any quote
    pub async fn fetch_random(&self) -> Result<ProbedQuote, FetchError> {
        let quote = self.service.random_quote().await.map_err(|e| {
            warn!("Random quote fetch failed: {}", e);
            e
        })?;
        Ok(self.probe_quote(quote).await)
    }

    /// A quote from `category`
    pub async fn fetch_random_by_category(&self, category: &str) -> Result<ProbedQuote, FetchError> {
        let quote = self
            .service
            .random_quote_by_category(category)
            .await
            .map_err(|e| {
                warn!("Quote fetch for category {:?} failed: {}", category, e);
                e
            })?;
        Ok(self.probe_quote(quote).await)
    }

    /// The `count` most liked quotes, most liked first
    pub async fn fetch_most_liked(&self, count: usize) -> Result<Vec<ProbedQuote>, FetchError> {
        let quotes = self.service.most_liked_quotes(count).await.map_err(|e| {
            warn!("Most liked quotes fetch failed: {}", e);
            e
        })?;

        let mut probed = Vec::with_capacity(quotes.len());
        for quote in quotes {
            probed.push(self.probe_quote(quote).await);
        }
        Ok(probed)
    }

    /// Attach `image_accessible` to a quote. Missing URLs skip the request.
    pub async fn probe_quote(&self, quote: Quote) -> ProbedQuote {
        let image_accessible = match quote.image_url.as_deref() {
            Some(url) => self.probe.is_accessible(url).await,
            None => false,
        };

        debug!("Quote {} image accessible: {}", quote.id, image_accessible);
        ProbedQuote {
            quote,
            image_accessible,
        }
    }
}
