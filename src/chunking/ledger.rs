use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::model::{ExportedChunk, MetadataValue};
use crate::util::{ensure_directory, now_utc_string, sha256_hex};

const LEDGER_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerDiff {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

impl LedgerDiff {
    pub fn pending_upload(&self, chunks: &[ExportedChunk]) -> Vec<String> {
        chunks
            .iter()
            .filter(|chunk| self.inserted.contains(&chunk.id) || self.updated.contains(&chunk.id))
            .map(|chunk| chunk.id.clone())
            .collect()
    }
}

#[derive(Debug)]
struct LedgerRow {
    text_hash: String,
}

pub struct ChunkLedger {
    connection: Connection,
}

impl ChunkLedger {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_directory(parent)?;
            }
        }
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open chunk ledger: {}", path.display()))?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL")?;
        connection
            .pragma_update(None, "synchronous", "NORMAL")
            .context("failed to set synchronous=NORMAL")?;
        Self::with_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory chunk ledger")?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS metadata (
                  key TEXT PRIMARY KEY,
                  value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS chunk_ledger (
                  chunk_id TEXT PRIMARY KEY,
                  namespace TEXT NOT NULL,
                  parent_id TEXT,
                  text_hash TEXT NOT NULL,
                  text_chars INTEGER NOT NULL,
                  first_seen_run TEXT NOT NULL,
                  last_seen_run TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_chunk_ledger_namespace ON chunk_ledger(namespace);
                ",
            )
            .context("failed to initialize chunk ledger schema")?;

        connection.execute(
            "INSERT INTO metadata(key, value) VALUES('ledger_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [LEDGER_SCHEMA_VERSION],
        )?;
        connection.execute(
            "INSERT INTO metadata(key, value) VALUES('ledger_opened_at', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [now_utc_string()],
        )?;

        Ok(Self { connection })
    }

    fn load_namespace(&self, namespace: &str) -> Result<BTreeMap<String, LedgerRow>> {
        let mut statement = self.connection.prepare(
            "
            SELECT chunk_id, text_hash
            FROM chunk_ledger
            WHERE namespace = ?1
            ORDER BY chunk_id ASC
            ",
        )?;

        let mut rows = statement.query([namespace])?;
        let mut out = BTreeMap::<String, LedgerRow>::new();
        while let Some(row) = rows.next()? {
            out.insert(
                row.get(0)?,
                LedgerRow {
                    text_hash: row.get(1)?,
                },
            );
        }
        Ok(out)
    }

    pub fn reconcile(
        &mut self,
        namespace: &str,
        chunks: &[ExportedChunk],
        run_id: &str,
    ) -> Result<LedgerDiff> {
        let mut previous = self.load_namespace(namespace)?;
        let mut diff = LedgerDiff::default();

        let transaction = self
            .connection
            .transaction()
            .context("failed to start chunk ledger transaction")?;

        for chunk in chunks {
            let text_hash = sha256_hex(chunk.text.as_bytes());
            match previous.remove(&chunk.id) {
                None => diff.inserted.push(chunk.id.clone()),
                Some(row) if row.text_hash == text_hash => diff.unchanged.push(chunk.id.clone()),
                Some(_) => diff.updated.push(chunk.id.clone()),
            }

            let parent_id = chunk.metadata.get("parent_id").and_then(|value| match value {
                MetadataValue::Text(text) => Some(text.as_str()),
                _ => None,
            });
            transaction.execute(
                "
                INSERT INTO chunk_ledger(chunk_id, namespace, parent_id, text_hash, text_chars, first_seen_run, last_seen_run)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?6)
                ON CONFLICT(chunk_id) DO UPDATE SET
                  namespace=excluded.namespace,
                  parent_id=excluded.parent_id,
                  text_hash=excluded.text_hash,
                  text_chars=excluded.text_chars,
                  last_seen_run=excluded.last_seen_run
                ",
                params![
                    chunk.id,
                    namespace,
                    parent_id,
                    text_hash,
                    chunk.text.chars().count() as i64,
                    run_id,
                ],
            )?;
        }

        for stale in previous.keys() {
            transaction.execute("DELETE FROM chunk_ledger WHERE chunk_id = ?1", [stale])?;
            diff.removed.push(stale.clone());
        }

        transaction
            .commit()
            .context("failed to commit chunk ledger transaction")?;

        Ok(diff)
    }

    pub fn count(&self, namespace: &str) -> Result<usize> {
        let count: i64 = self.connection.query_row(
            "SELECT COUNT(*) FROM chunk_ledger WHERE namespace = ?1",
            [namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> ExportedChunk {
        let mut metadata = BTreeMap::new();
        metadata.insert("parent_id".to_string(), MetadataValue::from("tu_art_1"));
        ExportedChunk {
            id: id.to_string(),
            text: text.to_string(),
            metadata,
        }
    }

    #[test]
    fn first_run_inserts_everything() {
        let mut ledger = ChunkLedger::open_in_memory().expect("ledger");
        let chunks = vec![chunk("a", "uno"), chunk("b", "due")];
        let diff = ledger.reconcile("tu-iva", &chunks, "run-1").expect("reconcile");
        assert_eq!(diff.inserted, vec!["a", "b"]);
        assert!(diff.updated.is_empty() && diff.unchanged.is_empty() && diff.removed.is_empty());
        assert_eq!(diff.pending_upload(&chunks), vec!["a", "b"]);
        assert_eq!(ledger.count("tu-iva").expect("count"), 2);
    }

    #[test]
    fn second_run_reports_updates_and_stale_ids() {
        let mut ledger = ChunkLedger::open_in_memory().expect("ledger");
        ledger
            .reconcile("tu-iva", &[chunk("a", "uno"), chunk("b", "due")], "run-1")
            .expect("first run");

        let next = vec![chunk("a", "uno"), chunk("c", "tre"), chunk("b", "due bis")];
        let diff = ledger.reconcile("tu-iva", &next, "run-2").expect("second run");
        assert_eq!(diff.unchanged, vec!["a"]);
        assert_eq!(diff.inserted, vec!["c"]);
        assert_eq!(diff.updated, vec!["b"]);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.pending_upload(&next), vec!["c", "b"]);
        let first_seen: String = ledger
            .connection
            .query_row(
                "SELECT first_seen_run FROM chunk_ledger WHERE chunk_id = 'b'",
                [],
                |row| row.get(0),
            )
            .expect("lookup");
        assert_eq!(first_seen, "run-1");

        let diff = ledger
            .reconcile("tu-iva", &[chunk("a", "uno")], "run-3")
            .expect("third run");
        assert_eq!(diff.removed, vec!["b", "c"]);
        assert_eq!(ledger.count("tu-iva").expect("count"), 1);
    }

    #[test]
    fn namespaces_are_reconciled_independently() {
        let mut ledger = ChunkLedger::open_in_memory().expect("ledger");
        ledger
            .reconcile("tu-iva", &[chunk("a", "uno")], "run-1")
            .expect("statute");
        let diff = ledger
            .reconcile("interpelli", &[chunk("x", "parere")], "run-1")
            .expect("rulings");
        assert!(diff.removed.is_empty());
        assert_eq!(ledger.count("tu-iva").expect("count"), 1);
    }

    #[test]
    fn ledger_file_persists_between_opens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db/ledger.sqlite");
        ChunkLedger::open(&path)
            .expect("open")
            .reconcile("tu-iva", &[chunk("a", "uno")], "run-1")
            .expect("reconcile");

        let diff = ChunkLedger::open(&path)
            .expect("reopen")
            .reconcile("tu-iva", &[chunk("a", "uno")], "run-2")
            .expect("reconcile again");
        assert_eq!(diff.unchanged, vec!["a"]);
    }
}
