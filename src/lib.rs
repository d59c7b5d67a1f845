//! proofchain - a single-node append-only proof-of-work ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, canonical hashing, the chain and its validation
//! - [`transaction`] - Transaction type
//! - [`mempool`] - Pool of transactions awaiting the next block
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work search and validation
//!
//! ## State Management
//! - [`persistence`] - Block audit log (SQLite, in-memory)
//!
//! ## Integration
//! - `api` - HTTP adapter (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
