//! In-memory stand-ins for the quote service and image probe, shared by
//! the unit tests of the fetcher, reconciler and session.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::ServiceError;
use crate::quote::data::{Quote, QuoteId};
use crate::quote::service::{ImageProbe, QuoteService};
use crate::state::reaction::{Direction, Reaction, VoteDelta};

pub fn quote(id: &str, category: &str, image_url: Option<&str>) -> Quote {
    Quote {
        id: QuoteId::new(id),
        text: format!("Quote {id}"),
        author_name: Some("Seneca".into()),
        category_name: Some(category.into()),
        like_count: 0,
        dislike_count: 0,
        image_url: image_url.map(str::to_string),
        image_alt_text: None,
        created: None,
        modified: None,
    }
}

/// Mirrors the service's counter rules: no counter goes below zero and
/// `reverse_opposite` only acts on an increase.
#[derive(Default)]
pub struct FakeService {
    quotes: Mutex<Vec<Quote>>,
    requests: Mutex<Vec<(QuoteId, VoteDelta)>>,
    fail_votes: AtomicBool,
    fail_fetches: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_calls: AtomicUsize,
}

impl FakeService {
    pub fn with_quotes(quotes: Vec<Quote>) -> Self {
        Self {
            quotes: Mutex::new(quotes),
            ..Self::default()
        }
    }

    /// Every vote request received, in order
    pub fn requests(&self) -> Vec<(QuoteId, VoteDelta)> {
        self.requests.lock().clone()
    }

    pub fn counters(&self, id: &str) -> (u64, u64) {
        let quotes = self.quotes.lock();
        let q = quotes.iter().find(|q| q.id.as_str() == id).expect("unknown quote");
        (q.like_count, q.dislike_count)
    }

    pub fn set_counters(&self, id: &str, likes: u64, dislikes: u64) {
        let mut quotes = self.quotes.lock();
        let q = quotes.iter_mut().find(|q| q.id.as_str() == id).expect("unknown quote");
        q.like_count = likes;
        q.dislike_count = dislikes;
    }

    pub fn set_image(&self, id: &str, image_url: Option<&str>) {
        let mut quotes = self.quotes.lock();
        let q = quotes.iter_mut().find(|q| q.id.as_str() == id).expect("unknown quote");
        q.image_url = image_url.map(str::to_string);
    }

    pub fn fail_votes(&self, fail: bool) {
        self.fail_votes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    /// Hold every vote response until `release_vote` is called
    pub fn hold_votes(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_vote(&self) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Hold every quote fetch until `release_fetch` is called
    pub fn hold_fetches(&self) {
        *self.fetch_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_fetch(&self) {
        if let Some(gate) = self.fetch_gate.lock().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Number of quote fetches received so far
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn enter_fetch(&self) -> Result<(), ServiceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.fetch_gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }

    fn unavailable() -> ServiceError {
        ServiceError::Status {
            status: 503,
            body: "unavailable".into(),
        }
    }
}

#[async_trait]
impl QuoteService for FakeService {
    async fn random_quote(&self) -> Result<Quote, ServiceError> {
        self.enter_fetch().await?;
        self.quotes.lock().first().cloned().ok_or(ServiceError::NotFound)
    }

    async fn random_quote_by_category(&self, category: &str) -> Result<Quote, ServiceError> {
        self.enter_fetch().await?;
        let needle = category.to_lowercase();
        self.quotes
            .lock()
            .iter()
            .find(|q| {
                q.category_name
                    .as_deref()
                    .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .cloned()
            .ok_or(ServiceError::NotFound)
    }

    async fn most_liked_quotes(&self, count: usize) -> Result<Vec<Quote>, ServiceError> {
        let mut quotes = self.quotes.lock().clone();
        quotes.sort_by(|a, b| b.like_count.cmp(&a.like_count));
        quotes.truncate(count);
        Ok(quotes)
    }

    async fn vote(&self, quote_id: &QuoteId, delta: VoteDelta) -> Result<Quote, ServiceError> {
        self.requests.lock().push((quote_id.clone(), delta));

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if self.fail_votes.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }

        let mut quotes = self.quotes.lock();
        let q = quotes
            .iter_mut()
            .find(|q| &q.id == quote_id)
            .ok_or(ServiceError::NotFound)?;

        let (own, opposite) = match delta.kind {
            Reaction::Like => (&mut q.like_count, &mut q.dislike_count),
            Reaction::Dislike => (&mut q.dislike_count, &mut q.like_count),
        };
        match delta.direction {
            Direction::Increase => {
                *own += 1;
                if delta.reverse_opposite {
                    *opposite = opposite.saturating_sub(1);
                }
            }
            Direction::Decrease => *own = own.saturating_sub(1),
        }

        Ok(q.clone())
    }
}

/// Reports only the listed URLs as accessible and records every call
#[derive(Default)]
pub struct FakeProbe {
    accessible: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn accessible(urls: &[&str]) -> Self {
        Self {
            accessible: urls.iter().map(|u| u.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageProbe for FakeProbe {
    async fn is_accessible(&self, image_url: &str) -> bool {
        self.calls.lock().push(image_url.to_string());
        self.accessible.contains(image_url)
    }
}
