//! Cryptographic hashes for script compilation
//!
//! we expose two helper objects:
//!
//! * the `*Hasher` types to help streaming bytes into a digest without
//!   collecting the whole message first
//! * [`struct@Hash`] a conveniently strongly typed byte array, plus the
//!   [`hash256`] and [`hash160`] compound-digest conventions built on it
//!
//! The algorithms exposed here are the four digests the virtual machine's
//! instruction set (and therefore the compiler) can be asked for: SHA-1,
//! SHA-256, SHA-512 and RIPEMD-160.
//!
//! # Example
//!
//! ```
//! use tessera_crypto::hash::Sha256Hasher;
//!
//! let mut hasher = Sha256Hasher::new();
//! hasher.input(b"abc");
//!
//! let digest = hasher.finalize();
//! # assert_eq!(
//! #   "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
//! #   hex::encode(digest)
//! # );
//! ```

#[allow(clippy::module_inception)]
mod hash;
mod hasher;

pub use self::{
    hash::{hash160, hash256, Hash},
    hasher::{Ripemd160Hasher, Sha1Hasher, Sha256Hasher, Sha512Hasher},
};
