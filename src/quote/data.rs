/// Shared data structures for quotes
///
/// These structs represent the data model that flows between
/// the quote service, the vote reconciler, and the display layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ServiceError;

/// Shown when a quote has no author attached
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
/// Shown when a quote has no category attached
pub const NO_CATEGORY: &str = "No Category";

/// Opaque quote identifier, stable across fetches
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A quote as owned by the remote service
///
/// `like_count` and `dislike_count` are a client-side mirror of the
/// server's counters, valid until the next fetch or vote response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub like_count: u64,
    pub dislike_count: u64,
    pub image_url: Option<String>,
    pub image_alt_text: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Quote {
    /// Author name for display
    pub fn author_label(&self) -> &str {
        self.author_name.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Category name for display
    pub fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or(NO_CATEGORY)
    }
}

/// A quote that is ready for display: the base record plus the
/// result of probing its image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedQuote {
    pub quote: Quote,
    /// Derived on every fetch or vote response, never sent to the service
    pub image_accessible: bool,
}

impl ProbedQuote {
    pub fn id(&self) -> &QuoteId {
        &self.quote.id
    }
}

/// `{ "name": ... }` as nested in quote records
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRecord {
    pub name: String,
}

/// Quote record exactly as the service serializes it.
///
/// The service answers an unknown category with 200 and an empty record,
/// so every field is optional here and a missing `guid` means no quote.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRecord {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub quote_text: Option<String>,
    #[serde(default)]
    pub author: Option<NamedRecord>,
    #[serde(default)]
    pub category: Option<NamedRecord>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_alt_text: Option<String>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub dislikes: Option<u64>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

impl TryFrom<QuoteRecord> for Quote {
    type Error = ServiceError;

    fn try_from(record: QuoteRecord) -> Result<Self, Self::Error> {
        let id = match record.guid {
            Some(guid) if !guid.trim().is_empty() => QuoteId(guid),
            _ => return Err(ServiceError::NotFound),
        };

        Ok(Self {
            id,
            text: record.quote_text.unwrap_or_default(),
            author_name: record.author.map(|a| a.name),
            category_name: record.category.map(|c| c.name),
            like_count: record.likes.unwrap_or(0),
            dislike_count: record.dislikes.unwrap_or(0),
            // A blank URL carries no image
            image_url: record.image_url.filter(|u| !u.trim().is_empty()),
            image_alt_text: record.image_alt_text,
            created: record.created,
            modified: record.modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_record() {
        let json = r#"{
            "guid": "6a1f0c3e-1111-4c55-9e0a-2b0f4d1c2a77",
            "created": "2024-10-01T12:00:00Z",
            "modified": "2024-10-02T08:30:00.123456Z",
            "author": {"name": "Marcus Aurelius"},
            "category": {"name": "stoic"},
            "quote_text": "The impediment to action advances action.",
            "image_url": "https://images.example.com/road.jpg",
            "image_alt_text": "A road",
            "origin": {"url": "https://example.com", "api_client_key": "ZEN_QUOTES"},
            "likes": 4,
            "dislikes": 1
        }"#;

        let record: QuoteRecord = serde_json::from_str(json).unwrap();
        let quote = Quote::try_from(record).unwrap();

        assert_eq!(quote.id.as_str(), "6a1f0c3e-1111-4c55-9e0a-2b0f4d1c2a77");
        assert_eq!(quote.author_label(), "Marcus Aurelius");
        assert_eq!(quote.category_label(), "stoic");
        assert_eq!(quote.like_count, 4);
        assert_eq!(quote.dislike_count, 1);
        assert_eq!(quote.image_url.as_deref(), Some("https://images.example.com/road.jpg"));
        assert!(quote.created.is_some());
        assert!(quote.modified.is_some());
    }

    #[test]
    fn test_decode_record_with_nulls() {
        let json = r#"{
            "guid": "q-2",
            "author": null,
            "category": null,
            "quote_text": "Anonymous wisdom.",
            "image_url": null,
            "image_alt_text": null,
            "likes": 0,
            "dislikes": 0
        }"#;

        let quote = Quote::try_from(serde_json::from_str::<QuoteRecord>(json).unwrap()).unwrap();

        assert_eq!(quote.author_label(), UNKNOWN_AUTHOR);
        assert_eq!(quote.category_label(), NO_CATEGORY);
        assert_eq!(quote.image_url, None);
        assert_eq!(quote.created, None);
    }

    #[test]
    fn test_blank_image_url_is_dropped() {
        let json = r#"{"guid": "q-3", "quote_text": "x", "image_url": "  "}"#;
        let quote = Quote::try_from(serde_json::from_str::<QuoteRecord>(json).unwrap()).unwrap();
        assert_eq!(quote.image_url, None);
    }

    #[test]
    fn test_missing_guid_means_no_quote() {
        let json = r#"{"quote_text": "x", "likes": 1}"#;
        let record = serde_json::from_str::<QuoteRecord>(json).unwrap();
        assert!(matches!(Quote::try_from(record), Err(ServiceError::NotFound)));
    }

    #[test]
    fn test_empty_record_means_no_quote() {
        // Unknown category: every field blank or null
        let json = r#"{
            "guid": null,
            "quote_text": "",
            "author": null,
            "category": null,
            "image_url": "",
            "likes": null,
            "dislikes": null
        }"#;
        let record = serde_json::from_str::<QuoteRecord>(json).unwrap();
        assert!(matches!(Quote::try_from(record), Err(ServiceError::NotFound)));

        let record = serde_json::from_str::<QuoteRecord>("{}").unwrap();
        assert!(matches!(Quote::try_from(record), Err(ServiceError::NotFound)));
    }
}
