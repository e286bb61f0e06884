/// HTTP implementations of the quote service and the image probe
///
/// Both use reqwest with a per-client timeout. The service maps every
/// non-success response into a `ServiceError`; the probe swallows all
/// errors and reports "not accessible".

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::data::{Quote, QuoteId, QuoteRecord};
use super::service::{ImageProbe, QuoteService};
use crate::error::ServiceError;
use crate::state::reaction::VoteDelta;

/// Client for the remote quote service
#[derive(Debug, Clone)]
pub struct HttpQuoteService {
    client: Client,
    base: Url,
}

impl HttpQuoteService {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        info!("🌐 Quote service at {}", base);
        Ok(Self { client, base })
    }

    /// Build `<base>/<segments...>/`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments)
            // Trailing slash, as the service routes expect
            .push("");
        Ok(url)
    }

    pub(crate) fn random_url(&self) -> Result<Url, ServiceError> {
        self.endpoint(&["quotes", "get_random_quote"])
    }

    pub(crate) fn category_url(&self, category: &str) -> Result<Url, ServiceError> {
        let mut url = self.endpoint(&["quotes", "get_random_quote_by_category"])?;
        url.query_pairs_mut().append_pair("category", category);
        Ok(url)
    }

    pub(crate) fn most_liked_url(&self, count: usize) -> Result<Url, ServiceError> {
        let mut url = self.endpoint(&["quotes", "get_most_liked_quotes"])?;
        url.query_pairs_mut().append_pair("count", &count.to_string());
        Ok(url)
    }

    pub(crate) fn vote_url(&self, quote_id: &QuoteId, delta: VoteDelta) -> Result<Url, ServiceError> {
        let mut url = self.endpoint(&["quotes", quote_id.as_str(), delta.kind.as_str()])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("direction", delta.direction.as_str());
            if delta.reverse_opposite {
                query.append_pair("reverse_opposite", "true");
            }
        }
        Ok(url)
    }
}

/// Check the status and decode a JSON body
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ServiceError::NotFound);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl QuoteService for HttpQuoteService {
    async fn random_quote(&self) -> Result<Quote, ServiceError> {
        let response = self.client.get(self.random_url()?).send().await?;
        Quote::try_from(read_json::<QuoteRecord>(response).await?)
    }

    async fn random_quote_by_category(&self, category: &str) -> Result<Quote, ServiceError> {
        let response = self.client.get(self.category_url(category)?).send().await?;
        Quote::try_from(read_json::<QuoteRecord>(response).await?)
    }

    async fn most_liked_quotes(&self, count: usize) -> Result<Vec<Quote>, ServiceError> {
        let response = self.client.get(self.most_liked_url(count)?).send().await?;
        let records: Vec<QuoteRecord> = read_json(response).await?;
        records.into_iter().map(Quote::try_from).collect()
    }

    async fn vote(&self, quote_id: &QuoteId, delta: VoteDelta) -> Result<Quote, ServiceError> {
        let url = self.vote_url(quote_id, delta)?;
        debug!("PATCH {}", url);

        let response = self.client.patch(url).send().await?;
        Quote::try_from(read_json::<QuoteRecord>(response).await?)
    }
}

/// Bytes needed to recognise any format `image` knows
const SNIFF_LEN: usize = 32;

/// Probes an image URL with a GET. A declared `image/*` type is enough;
/// otherwise the start of the body is sniffed.
#[derive(Debug, Clone)]
pub struct HttpImageProbe {
    client: Client,
}

impl HttpImageProbe {
    pub fn new(timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn check(&self, image_url: &str) -> Result<bool, ServiceError> {
        let mut response = self.client.get(image_url).send().await?;

        if !response.status().is_success() {
            debug!("Image probe {} returned {}", image_url, response.status());
            return Ok(false);
        }

        if declares_image(&response) {
            return Ok(true);
        }

        // The magic bytes may arrive split over several chunks
        let mut head = Vec::with_capacity(SNIFF_LEN);
        while head.len() < SNIFF_LEN {
            match response.chunk().await? {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => break,
            }
        }

        Ok(looks_like_image(&head))
    }
}

fn declares_image(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().to_ascii_lowercase().starts_with("image/"))
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn is_accessible(&self, image_url: &str) -> bool {
        match self.check(image_url).await {
            Ok(accessible) => accessible,
            Err(e) => {
                debug!("Image probe failed for {}: {}", image_url, e);
                false
            }
        }
    }
}

/// True when the bytes start like a known image format
pub(crate) fn looks_like_image(head: &[u8]) -> bool {
    image::guess_format(head).is_ok()
}
