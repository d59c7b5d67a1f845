//! Database persistence layer for proofchain
//!
//! The persisted `blocks` table is a lossy audit log: it records each block's
//! index, timestamp, proof and previous hash but never its transactions. The
//! in-memory chain stays authoritative for the life of the process.

use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use rusqlite::{params, Connection, ErrorCode, Transaction as SqlTransaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::warn;

const CREATE_BLOCKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS blocks (
    block_index INTEGER PRIMARY KEY,
    timestamp REAL,
    proof INTEGER,
    previous_hash TEXT
)";

/// One row of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub block_index: u64,
    pub timestamp: f64,
    pub proof: u64,
    pub previous_hash: String,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        BlockRecord {
            block_index: block.index,
            timestamp: block.timestamp,
            proof: block.proof,
            previous_hash: block.previous_hash.clone(),
        }
    }
}

/// Abstraction for block stores.
///
/// `save_block` may rewrite `block.index`: when the index is already recorded,
/// the block is stored under `max(block_index) + 1` and the caller's block is
/// updated to match. Callers must treat the index after the call as
/// authoritative.
pub trait Persistence: Send + Sync {
    fn save_block(&self, block: &mut Block) -> Result<()>;
    fn load_records(&self) -> Result<Vec<BlockRecord>>;
}

/// SQLite-backed store. Every call opens its own connection, runs in a single
/// transaction, commits, and closes.
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database {
            path: path.as_ref().to_path_buf(),
        };
        // Fail early on an unusable path instead of on the first save.
        db.connect()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .map_err(|e| ChainError::DatabaseError(format!("Failed to open database: {}", e)))?;
        conn.execute(CREATE_BLOCKS_TABLE, [])
            .map_err(|e| ChainError::DatabaseError(format!("Failed to create blocks table: {}", e)))?;
        Ok(conn)
    }

    pub fn save_block(&self, block: &mut Block) -> Result<()> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to start transaction: {}", e)))?;

        match insert_record(&tx, block) {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) => {
                let max_index: Option<i64> = tx
                    .query_row("SELECT MAX(block_index) FROM blocks", [], |row| row.get(0))
                    .map_err(|e| ChainError::DatabaseError(format!("Failed to read max index: {}", e)))?;
                let reassigned = max_index.map_or(1, |max| max as u64 + 1);
                warn!(
                    requested = block.index,
                    reassigned,
                    "block index already persisted, reassigning"
                );
                block.index = reassigned;
                insert_record(&tx, block)
                    .map_err(|e| ChainError::DatabaseError(format!("Failed to save block: {}", e)))?;
            }
            Err(e) => {
                return Err(ChainError::DatabaseError(format!("Failed to save block: {}", e)));
            }
        }

        tx.commit()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to commit transaction: {}", e)))?;
        Ok(())
    }

    pub fn load_records(&self) -> Result<Vec<BlockRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT block_index, timestamp, proof, previous_hash
                 FROM blocks ORDER BY block_index ASC",
            )
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let block_index: i64 = row.get(0)?;
                let proof: i64 = row.get(2)?;
                Ok(BlockRecord {
                    block_index: block_index as u64,
                    timestamp: row.get(1)?,
                    proof: proof as u64,
                    previous_hash: row.get(3)?,
                })
            })
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query blocks: {}", e)))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to load block: {}", e)))?,
            );
        }
        Ok(records)
    }
}

fn insert_record(tx: &SqlTransaction<'_>, block: &Block) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO blocks (block_index, timestamp, proof, previous_hash)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            block.index as i64,
            block.timestamp,
            block.proof as i64,
            block.previous_hash,
        ],
    )?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl Persistence for Database {
    fn save_block(&self, block: &mut Block) -> Result<()> {
        Database::save_block(self, block)
    }

    fn load_records(&self) -> Result<Vec<BlockRecord>> {
        Database::load_records(self)
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    pub records: Arc<Mutex<BTreeMap<u64, BlockRecord>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn save_block(&self, block: &mut Block) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;

        if records.contains_key(&block.index) {
            let reassigned = records.keys().next_back().map_or(1, |max| max + 1);
            warn!(
                requested = block.index,
                reassigned,
                "block index already persisted, reassigning"
            );
            block.index = reassigned;
        }

        records.insert(block.index, BlockRecord::from(&*block));
        Ok(())
    }

    fn load_records(&self) -> Result<Vec<BlockRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        Ok(records.values().cloned().collect())
    }
}
