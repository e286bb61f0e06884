use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::reaction::Reaction;
use crate::error::LedgerError;
use crate::quote::data::QuoteId;

/// Ledger shared between the reconciler (writer) and the display layer (reader)
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// A recorded reaction and when it was recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub reaction: Reaction,
    pub recorded_at: DateTime<Utc>,
}

/// The Ledger is the per-device record of which reaction a visitor holds
/// for each quote. It is backed by a SQLite file so it survives restarts.
///
/// The `quote_id` primary key is what keeps at most one reaction per quote.
pub struct Ledger {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Ledger {
    /// Open the ledger at the default location:
    /// - Linux: ~/.local/share/quote-card/ledger.db
    /// - macOS: ~/Library/Application Support/quote-card/ledger.db
    /// - Windows: %APPDATA%\quote-card\ledger.db
    pub fn open_default() -> Result<Self, LedgerError> {
        Self::open(Self::default_path()?)
    }

    /// Open (or create) the ledger file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        info!("📁 Vote ledger opened at: {}", path.display());

        let ledger = Ledger {
            conn,
            db_path: Some(path),
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Non-durable ledger, used by tests and as a fallback
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let ledger = Ledger {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Wrap for sharing
    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    /// Where the ledger lives when no path is configured
    pub fn default_path() -> Result<PathBuf, LedgerError> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(LedgerError::NoDataDir)?;

        path.push("quote-card");
        path.push("ledger.db");
        Ok(path)
    }

    fn init_schema(&self) -> Result<(), LedgerError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS reactions (
                quote_id        TEXT PRIMARY KEY,
                reaction        TEXT NOT NULL CHECK (reaction IN ('like', 'dislike')),
                recorded_at     INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Path to the ledger file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Reaction held for `quote_id`, if any.
    ///
    /// Never fails: an unreadable row is logged and treated as no reaction.
    pub fn get(&self, quote_id: &QuoteId) -> Option<Reaction> {
        match self.entry(quote_id) {
            Ok(entry) => entry.map(|e| e.reaction),
            Err(e) => {
                warn!("Could not read ledger entry for {}: {}", quote_id, e);
                None
            }
        }
    }

    /// Full entry for `quote_id`, including when it was recorded
    pub fn entry(&self, quote_id: &QuoteId) -> Result<Option<LedgerEntry>, LedgerError> {
        let row: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT reaction, recorded_at FROM reactions WHERE quote_id = ?1",
                [quote_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((reaction, recorded_at)) = row else {
            return Ok(None);
        };

        Ok(Some(LedgerEntry {
            reaction: reaction.parse()?,
            recorded_at: Utc
                .timestamp_millis_opt(recorded_at)
                .single()
                .unwrap_or_default(),
        }))
    }

    /// Record `reaction` for `quote_id`, replacing whatever was there
    pub fn set(&self, quote_id: &QuoteId, reaction: Reaction) -> Result<(), LedgerError> {
        self.conn.execute(
            "INSERT INTO reactions (quote_id, reaction, recorded_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(quote_id) DO UPDATE SET
                reaction = excluded.reaction,
                recorded_at = excluded.recorded_at",
            rusqlite::params![quote_id.as_str(), reaction.as_str(), Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    /// Remove the entry for `quote_id`. No-op when absent.
    pub fn clear(&self, quote_id: &QuoteId) -> Result<(), LedgerError> {
        self.conn.execute(
            "DELETE FROM reactions WHERE quote_id = ?1",
            [quote_id.as_str()],
        )?;
        Ok(())
    }

    /// Set or clear in one call, as the reconciler's "new ledger state"
    pub fn store(&self, quote_id: &QuoteId, reaction: Option<Reaction>) -> Result<(), LedgerError> {
        match reaction {
            Some(reaction) => self.set(quote_id, reaction),
            None => self.clear(quote_id),
        }
    }

    /// Number of quotes with a recorded reaction
    pub fn len(&self) -> Result<usize, LedgerError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reactions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::reaction::transition;
    use proptest::prelude::*;

    fn id(s: &str) -> QuoteId {
        QuoteId::new(s)
    }

    #[test]
    fn test_empty_ledger_has_no_reaction() {
        let ledger = Ledger::open_in_memory().unwrap();
        assert_eq!(ledger.get(&id("q1")), None);
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn test_set_overwrites() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger.set(&id("q1"), Reaction::Like).unwrap();
        ledger.set(&id("q1"), Reaction::Dislike).unwrap();

        assert_eq!(ledger.get(&id("q1")), Some(Reaction::Dislike));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger.set(&id("q1"), Reaction::Like).unwrap();
        ledger.set(&id("q2"), Reaction::Dislike).unwrap();

        ledger.clear(&id("q1")).unwrap();
        ledger.clear(&id("q1")).unwrap();
        ledger.clear(&id("never-voted")).unwrap();

        assert_eq!(ledger.get(&id("q1")), None);
        assert_eq!(ledger.get(&id("q2")), Some(Reaction::Dislike));
    }

    #[test]
    fn test_entry_records_time() {
        let ledger = Ledger::open_in_memory().unwrap();
        let before = Utc::now().timestamp_millis();
        ledger.set(&id("q1"), Reaction::Like).unwrap();

        let entry = ledger.entry(&id("q1")).unwrap().unwrap();
        assert_eq!(entry.reaction, Reaction::Like);
        assert!(entry.recorded_at.timestamp_millis() >= before);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.db");

        {
            let ledger = Ledger::open(&path).unwrap();
            ledger.set(&id("q1"), Reaction::Dislike).unwrap();
            assert_eq!(ledger.path(), Some(path.as_path()));
        }

        let reopened = Ledger::open(&path).unwrap();
        assert_eq!(reopened.get(&id("q1")), Some(Reaction::Dislike));
    }

    #[test]
    fn test_corrupt_value_reads_as_none() {
        let ledger = Ledger::open_in_memory().unwrap();
        // Bypass the CHECK constraint by recreating the table without it
        ledger.conn.execute("DROP TABLE reactions", []).unwrap();
        ledger
            .conn
            .execute(
                "CREATE TABLE reactions (quote_id TEXT PRIMARY KEY, reaction TEXT NOT NULL, recorded_at INTEGER NOT NULL)",
                [],
            )
            .unwrap();
        ledger
            .conn
            .execute("INSERT INTO reactions VALUES ('q1', 'love', 0)", [])
            .unwrap();

        assert_eq!(ledger.get(&id("q1")), None);
        assert!(matches!(ledger.entry(&id("q1")), Err(LedgerError::UnknownReaction(_))));
    }

    fn click() -> impl Strategy<Value = (u8, Reaction)> {
        (0u8..3, prop_oneof![Just(Reaction::Like), Just(Reaction::Dislike)])
    }

    proptest! {
        #[test]
        fn at_most_one_reaction_per_quote(clicks in proptest::collection::vec(click(), 0..40)) {
            let ledger = Ledger::open_in_memory().unwrap();
            let mut model = std::collections::HashMap::new();

            for (quote, clicked) in clicks {
                let quote_id = id(&format!("q{quote}"));
                let t = transition(ledger.get(&quote_id), clicked);
                ledger.store(&quote_id, t.next).unwrap();
                model.insert(quote, t.next);
            }

            let rows: i64 = ledger.conn
                .query_row("SELECT COUNT(*) FROM reactions GROUP BY quote_id ORDER BY 1 DESC LIMIT 1", [], |r| r.get(0))
                .optional()
                .unwrap()
                .unwrap_or(0);
            prop_assert!(rows <= 1);

            for (quote, expected) in model {
                prop_assert_eq!(ledger.get(&id(&format!("q{quote}"))), expected);
            }
        }
    }
}
