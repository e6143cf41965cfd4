//! Vityaz Core - Shared types for the Vityaz sprite tooling
//!
//! - `VityazError` / `Result` - Error type used across the library crates
//! - `ContentHash` - SHA-256 fingerprints of generated files

mod error;
mod hash;

pub use error::{Result, VityazError};
pub use hash::ContentHash;
