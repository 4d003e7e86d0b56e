//! Cryptographic primitives for authentication-template compilation.
//!
//! The compiler consumes cryptography exclusively through the narrow
//! contracts in [`capability`]; everything else in this crate is a native
//! implementation of those contracts: streaming hashers over the digest
//! algorithms scripts rely on, HMAC-SHA512 for hierarchical key
//! derivation, and a secp256k1 backend for ECDSA and Schnorr signing.

pub mod capability;
pub mod hash;
pub mod hmac;
pub mod key;

pub use capability::{CurveError, Ripemd160, Secp256k1, Sha1, Sha256, Sha512};
pub use hash::{hash160, hash256, Hash};
