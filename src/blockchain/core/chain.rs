use super::block::{hash_block, Block};
use super::validation::validate_chain;
use crate::error::{ChainError, Result};
use crate::mempool::Mempool;
use crate::miner;
use crate::persistence::{InMemoryPersistence, Persistence};
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// Chain and pool share one lock so sealing a block and accepting a
/// transaction never interleave.
struct LedgerState {
    blocks: Vec<Block>,
    mempool: Mempool,
}

impl LedgerState {
    fn last_block(&self) -> Result<&Block> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }
}

/// The ledger: an append-only chain of blocks plus the pool of transactions
/// waiting for the next one.
///
/// Construct once and share it by handle (`Arc<Blockchain>`). Every method
/// takes `&self`; mutation is serialized internally.
pub struct Blockchain {
    state: Mutex<LedgerState>,
    persistence: Box<dyn Persistence>,
    max_proof_attempts: Option<u64>,
}

impl Blockchain {
    /// Create a new `Blockchain` using an in-memory persistence backend.
    pub fn new() -> Result<Self> {
        Self::new_with_persistence(Box::new(InMemoryPersistence::new()))
    }

    /// Create a new `Blockchain` with the provided persistence backend.
    ///
    /// The genesis block is persisted before it is appended. If the store
    /// already holds index 1 (a reused database file), the store's conflict
    /// repair moves genesis to the next free index.
    pub fn new_with_persistence(persistence: Box<dyn Persistence>) -> Result<Self> {
        let mut genesis = Block::genesis();
        persistence.save_block(&mut genesis)?;
        info!(index = genesis.index, "genesis block created");

        Ok(Blockchain {
            state: Mutex::new(LedgerState {
                blocks: vec![genesis],
                mempool: Mempool::new(),
            }),
            persistence,
            max_proof_attempts: None,
        })
    }

    /// Cap the proof search at `max_attempts` candidates per block. `None`
    /// restores the unbounded search.
    pub fn with_max_proof_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_proof_attempts = max_attempts;
        self
    }

    pub fn max_proof_attempts(&self) -> Option<u64> {
        self.max_proof_attempts
    }

    pub fn last_block(&self) -> Result<Block> {
        self.state.lock().last_block().cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().blocks.is_empty()
    }

    /// Snapshot of the chain and its length.
    pub fn chain(&self) -> (Vec<Block>, usize) {
        let state = self.state.lock();
        (state.blocks.clone(), state.blocks.len())
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().mempool.get_all_transactions()
    }

    /// Queue a transaction for the next block and return the index that block
    /// is expected to get. The index is a hint: the pool may change before the
    /// block is sealed.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<u64> {
        let mut state = self.state.lock();
        let next_index = state.last_block()?.index + 1;
        state.mempool.add_transaction(tx);
        Ok(next_index)
    }

    /// Seal the pending transactions into a new block carrying `proof`.
    ///
    /// `previous_hash` defaults to the hash of the current last block. The
    /// proof is not checked here; [`Blockchain::mine_next`] is the path that
    /// guarantees a valid one.
    pub fn new_block(&self, proof: u64, previous_hash: Option<String>) -> Result<Block> {
        let mut state = self.state.lock();
        self.seal(&mut state, proof, previous_hash)
    }

    /// Find a proof for the current tip and seal the next block with it.
    ///
    /// The proof search runs without holding the ledger lock. If another
    /// block was sealed in the meantime the search restarts against the new
    /// tip, so every mined block's proof validates against its predecessor.
    pub fn mine_next(&self) -> Result<Block> {
        let started = Instant::now();
        loop {
            let (tip_len, last_proof) = {
                let state = self.state.lock();
                (state.blocks.len(), state.last_block()?.proof)
            };

            let proof = miner::search(last_proof, self.max_proof_attempts)?;

            let mut state = self.state.lock();
            if state.blocks.len() != tip_len {
                debug!(last_proof, "tip moved during proof search, retrying");
                continue;
            }

            let previous_hash = hash_block(state.last_block()?);
            let block = self.seal(&mut state, proof, Some(previous_hash))?;
            info!(
                index = block.index,
                proof = block.proof,
                transactions = block.transactions.len(),
                elapsed = %humantime::format_duration(started.elapsed()),
                "block mined"
            );
            return Ok(block);
        }
    }

    /// Re-check linkage, index continuity and proofs over the whole chain.
    /// Not called by any other ledger operation.
    pub fn validate_chain(&self) -> Result<()> {
        validate_chain(&self.state.lock().blocks)
    }

    fn seal(&self, state: &mut LedgerState, proof: u64, previous_hash: Option<String>) -> Result<Block> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => hash_block(state.last_block()?),
        };
        let index = state.blocks.len() as u64 + 1;
        let mut block = Block::new(index, state.mempool.drain_all(), proof, previous_hash);

        if let Err(e) = self.persistence.save_block(&mut block) {
            state.mempool.restore(std::mem::take(&mut block.transactions));
            return Err(e);
        }

        state.blocks.push(block.clone());
        Ok(block)
    }
}
