//! Transaction pool for transactions awaiting the next block

use crate::transaction::Transaction;

/// Insertion-ordered buffer of pending transactions.
///
/// No deduplication or semantic checks are performed; every submitted
/// transaction is kept until the next block drains the pool.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        tracing::debug!(
            sender = %tx.sender,
            recipient = %tx.recipient,
            amount = %tx.amount,
            pending = self.transactions.len() + 1,
            "mempool.add"
        );
        self.transactions.push(tx);
    }

    /// Take every pending transaction in submission order, leaving the pool empty.
    pub fn drain_all(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Put drained transactions back ahead of anything submitted since.
    pub fn restore(&mut self, mut transactions: Vec<Transaction>) {
        transactions.append(&mut self.transactions);
        self.transactions = transactions;
    }

    pub fn get_all_transactions(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
