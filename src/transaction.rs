//! Pending and sealed transactions

use serde::{Deserialize, Serialize};

/// Opaque JSON number. Integers stay integers and floats stay floats through
/// serialization, so a block hashes over exactly what was submitted.
pub type Amount = serde_json::Number;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }
}
