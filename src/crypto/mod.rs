//! Cryptographic utilities
//!
//! SHA-256 digests for snapshot integrity.

pub mod hash;

pub use hash::{digest_matches, sha256, sha256_hex};
