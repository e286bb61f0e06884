/// State management module
///
/// This module handles all client-side state, including:
/// - Reactions and the vote transition table (reaction.rs)
/// - The durable per-quote vote ledger (ledger.rs)
/// - The immutable display state (display.rs)

pub mod display;
pub mod ledger;
pub mod reaction;
