use super::block::{hash_block, Block};
use crate::error::ChainError;
use crate::miner::valid_proof;

/// Walk the chain and check every block against its predecessor.
///
/// The first block must carry the genesis sentinels. Its index is not pinned
/// to 1 because a reused store may have shifted it; after that each index
/// must step by exactly one, each `previous_hash` must be the hash of the
/// predecessor, and each proof must validate against the predecessor's proof.
pub fn validate_chain(blocks: &[Block]) -> Result<(), ChainError> {
    let genesis = blocks.first().ok_or(ChainError::EmptyChain)?;
    if !genesis.is_genesis() {
        return Err(ChainError::InvalidBlock(format!(
            "First block {} does not carry the genesis proof and previous hash.",
            genesis.index
        )));
    }

    for pair in blocks.windows(2) {
        let (prev, block) = (&pair[0], &pair[1]);

        if block.index != prev.index + 1 {
            return Err(ChainError::InvalidBlock(format!(
                "Invalid block index. Expected {}, but got {}.",
                prev.index + 1,
                block.index
            )));
        }

        let expected = hash_block(prev);
        if block.previous_hash != expected {
            return Err(ChainError::InvalidBlockLinkage {
                index: block.index,
                expected,
                found: block.previous_hash.clone(),
            });
        }

        if !valid_proof(prev.proof, block.proof) {
            return Err(ChainError::InvalidProofOfWork { index: block.index });
        }
    }

    Ok(())
}

pub fn is_valid_chain(blocks: &[Block]) -> bool {
    validate_chain(blocks).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;
    use crate::transaction::Transaction;

    fn mined_chain(blocks: usize) -> Vec<Block> {
        let chain = Blockchain::new().unwrap();
        for i in 0..blocks {
            chain.submit_transaction(Transaction::new("A", "B", i as u64)).unwrap();
            chain.mine_next().unwrap();
        }
        chain.chain().0
    }

    #[test]
    fn test_accepts_mined_chain() {
        let blocks = mined_chain(2);
        assert!(is_valid_chain(&blocks));
    }

    #[test]
    fn test_rejects_empty_chain() {
        assert!(matches!(validate_chain(&[]), Err(ChainError::EmptyChain)));
    }

    #[test]
    fn test_rejects_tampered_transactions() {
        let mut blocks = mined_chain(2);
        blocks[1].transactions[0].amount = 1_000_000.into();
        assert!(matches!(
            validate_chain(&blocks),
            Err(ChainError::InvalidBlockLinkage { index: 3, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_proof() {
        let mut blocks = mined_chain(1);
        let genesis_proof = blocks[0].proof;
        let bad = (0..).find(|&p| !valid_proof(genesis_proof, p)).unwrap();
        blocks[1].proof = bad;
        assert!(matches!(
            validate_chain(&blocks),
            Err(ChainError::InvalidProofOfWork { index: 2 })
        ));
    }

    #[test]
    fn test_rejects_index_gap() {
        let mut blocks = mined_chain(1);
        blocks[1].index = 5;
        assert!(matches!(validate_chain(&blocks), Err(ChainError::InvalidBlock(_))));
    }

    #[test]
    fn test_rejects_missing_genesis_sentinel() {
        let mut blocks = mined_chain(0);
        blocks[0].previous_hash = "0".to_string();
        assert!(!is_valid_chain(&blocks));
    }
}
