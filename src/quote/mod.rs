/// Quote retrieval module
///
/// This module handles:
/// - The quote data model and wire records (data.rs)
/// - The service and probe seams (service.rs)
/// - HTTP implementations of both (http.rs)
/// - Fetching quotes ready for display (fetcher.rs)

pub mod data;
pub mod fetcher;
pub mod http;
pub mod service;
