//! BIP32-style hierarchical-deterministic keys over secp256k1.
//!
//! Authentication templates reference HD keys through their base58check
//! serializations (`xprv…` / `xpub…`) and derive per-address instances
//! along slash-separated paths in which `i` stands for the current
//! address index. This crate provides the node types, the codec and the
//! path grammar; all cryptography goes through the capability traits of
//! [`tessera_crypto`] so callers control the back-ends.

use tessera_crypto::capability::CurveError;
use thiserror::Error;

pub mod node;
pub mod path;

pub use node::{decode_hd_private_key, decode_hd_public_key, HdCrypto, HdPrivateNode, HdPublicNode, KeyNetwork};
pub use path::{DerivationPath, PathSegment, HARDENED_OFFSET};

#[derive(Error, Debug)]
pub enum Error {
    /// Unable to decode a base58 string
    #[error("unable to decode base58: {0}")]
    InvalidBase58(#[from] bs58::decode::Error),
    /// Serialized key data of unexpected length
    #[error("serialized key of unexpected length {0}")]
    UnexpectedLength(usize),
    /// The 4-byte double-SHA-256 checksum did not match
    #[error("serialized key checksum mismatch")]
    InvalidChecksum,
    /// Version prefix is not a known mainnet or testnet HD key prefix
    #[error("unknown serialized key version prefix {0:#010x}")]
    UnknownVersionPrefix(u32),
    /// A public serialization was provided where a private one is required
    #[error("expected a private key serialization")]
    ExpectedPrivateKey,
    /// A private serialization was provided where a public one is required
    #[error("expected a public key serialization")]
    ExpectedPublicKey,
    /// Private key payload is not a valid serialized private key
    #[error("invalid private key payload")]
    InvalidPrivateKeyPayload,
    /// Public key payload is not a compressed public key
    #[error("invalid public key payload")]
    InvalidPublicKeyPayload,
    /// Hardened child indexes cannot be derived from a public node
    #[error("hardened derivation requires a private node")]
    HardenedDerivationRequiresPrivateNode,
    /// Node depth would exceed the single-byte wire field
    #[error("maximum derivation depth exceeded")]
    DerivationDepthExceeded,
    /// Derivation path does not match the `m/…`/`M/…` grammar
    #[error("invalid derivation path \"{0}\"")]
    InvalidDerivationPath(String),
    /// An instantiated index landed outside the non-hardened range
    #[error("address index out of range for derivation segment")]
    AddressIndexOutOfRange,
    /// Error reported by the secp256k1 back-end
    #[error(transparent)]
    Curve(#[from] CurveError),
}
