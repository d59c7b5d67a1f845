// core.rs splits ledger responsibilities into submodules: block layout and
// hashing, the chain itself, and whole-chain validation.
pub mod block;
pub mod chain;
pub mod validation;

pub use block::*;
pub use chain::*;
pub use validation::*;
