//! Proof-of-work search and validation
//!
//! A proof is valid for a given predecessor proof when the SHA-256 digest of
//! the two numbers written back to back in decimal starts with
//! [`DIFFICULTY_PREFIX`]. Difficulty is fixed.
//!
//! [`proof_of_work`] is an unbounded, single-threaded linear scan with no
//! cancellation; it blocks its caller until a proof is found. Callers that
//! need an upper bound use [`proof_of_work_bounded`].

use crate::error::{ChainError, Result};
use sha2::{Digest, Sha256};

/// Leading hex characters a valid proof digest must start with.
pub const DIFFICULTY_PREFIX: &str = "0000";

pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    let guess_hash = hex::encode(Sha256::digest(guess.as_bytes()));
    guess_hash.starts_with(DIFFICULTY_PREFIX)
}

/// Smallest non-negative proof satisfying [`valid_proof`] against `last_proof`.
pub fn proof_of_work(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !valid_proof(last_proof, proof) {
        proof += 1;
    }
    proof
}

/// Same scan as [`proof_of_work`], giving up after `max_attempts` candidates.
pub fn proof_of_work_bounded(last_proof: u64, max_attempts: u64) -> Result<u64> {
    (0..max_attempts)
        .find(|&proof| valid_proof(last_proof, proof))
        .ok_or(ChainError::ProofSearchExhausted {
            last_proof,
            attempts: max_attempts,
        })
}

/// Dispatch to the bounded or unbounded search depending on the cap.
pub fn search(last_proof: u64, max_attempts: Option<u64>) -> Result<u64> {
    match max_attempts {
        Some(cap) => proof_of_work_bounded(last_proof, cap),
        None => Ok(proof_of_work(last_proof)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_proof_is_valid_and_smallest() {
        let proof = proof_of_work(100);
        assert!(valid_proof(100, proof));
        assert!((0..proof).all(|p| !valid_proof(100, p)));
    }

    #[test]
    fn test_valid_proof_matches_digest_prefix() {
        let proof = proof_of_work(7);
        let digest = hex::encode(Sha256::digest(format!("7{}", proof).as_bytes()));
        assert_eq!(&digest[..4], "0000");
    }

    #[test]
    fn test_valid_proof_is_deterministic() {
        for p in 0..64 {
            assert_eq!(valid_proof(100, p), valid_proof(100, p));
        }
    }

    #[test]
    fn test_bounded_search_agrees_with_unbounded() {
        let proof = proof_of_work(100);
        assert_eq!(proof_of_work_bounded(100, proof + 1).unwrap(), proof);
        assert_eq!(search(100, None).unwrap(), proof);
    }

    #[test]
    fn test_bounded_search_exhausts() {
        let proof = proof_of_work(100);
        let err = proof_of_work_bounded(100, proof).unwrap_err();
        assert!(matches!(
            err,
            ChainError::ProofSearchExhausted { last_proof: 100, attempts } if attempts == proof
        ));
    }
}
