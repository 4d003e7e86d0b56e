//! Narrow contracts between the compiler and its cryptographic back-ends.
//!
//! A compilation environment carries these as optional handles; an
//! operation that needs one declares the requirement and the dispatcher
//! checks presence before the operation runs. Every method is pure and
//! safe to call from concurrent compilations.

use crate::hash::{Hash, Ripemd160Hasher, Sha1Hasher, Sha256Hasher, Sha512Hasher};
use thiserror::Error;

/// One-shot SHA-1.
pub trait Sha1: Send + Sync {
    fn hash(&self, message: &[u8]) -> Hash<20>;
}

/// One-shot SHA-256.
pub trait Sha256: Send + Sync {
    fn hash(&self, message: &[u8]) -> Hash<32>;
}

/// One-shot SHA-512.
pub trait Sha512: Send + Sync {
    fn hash(&self, message: &[u8]) -> Hash<64>;
}

/// One-shot RIPEMD-160.
pub trait Ripemd160: Send + Sync {
    fn hash(&self, message: &[u8]) -> Hash<20>;
}

/// Errors surfaced by a [`Secp256k1`] back-end.
///
/// The compiler treats all of these as fatal: they indicate invalid key
/// material rather than a missing prerequisite another operation could
/// supply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurveError {
    #[error("invalid secp256k1 private key")]
    InvalidPrivateKey,

    #[error("invalid secp256k1 public key")]
    InvalidPublicKey,

    #[error("tweak outside of the secp256k1 group order")]
    InvalidTweak,
}

/// Signing, key derivation and verification over the secp256k1 curve.
///
/// Private keys are 32 bytes, public keys 33-byte compressed points,
/// message hashes 32 bytes. ECDSA signatures are DER encoded; Schnorr
/// signatures are the fixed 64-byte form.
pub trait Secp256k1: Send + Sync {
    /// Derive the compressed public key of `private_key`.
    fn derive_public_key_compressed(&self, private_key: &[u8; 32]) -> Result<[u8; 33], CurveError>;

    /// Add `tweak` to `private_key` modulo the group order.
    fn add_tweak_private_key(
        &self,
        private_key: &[u8; 32],
        tweak: &[u8; 32],
    ) -> Result<[u8; 32], CurveError>;

    /// Add `tweak * G` to the point behind `public_key`.
    fn add_tweak_public_key_compressed(
        &self,
        public_key: &[u8; 33],
        tweak: &[u8; 32],
    ) -> Result<[u8; 33], CurveError>;

    /// Produce a deterministic (RFC 6979) DER-encoded ECDSA signature.
    fn sign_message_hash_der(
        &self,
        private_key: &[u8; 32],
        message_hash: &[u8; 32],
    ) -> Result<Vec<u8>, CurveError>;

    /// Produce a deterministic 64-byte Schnorr signature.
    fn sign_message_hash_schnorr(
        &self,
        private_key: &[u8; 32],
        message_hash: &[u8; 32],
    ) -> Result<[u8; 64], CurveError>;

    /// Check a DER-encoded ECDSA signature against a compressed public key.
    fn verify_signature_der(
        &self,
        signature: &[u8],
        public_key: &[u8; 33],
        message_hash: &[u8; 32],
    ) -> bool;

    /// Check a 64-byte Schnorr signature against a compressed public key.
    fn verify_signature_schnorr(
        &self,
        signature: &[u8; 64],
        public_key: &[u8; 33],
        message_hash: &[u8; 32],
    ) -> bool;
}

/// [`Sha1`] backed by the in-process implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeSha1;

impl Sha1 for NativeSha1 {
    fn hash(&self, message: &[u8]) -> Hash<20> {
        Sha1Hasher::hash(message)
    }
}

/// [`Sha256`] backed by the in-process implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeSha256;

impl Sha256 for NativeSha256 {
    fn hash(&self, message: &[u8]) -> Hash<32> {
        Sha256Hasher::hash(message)
    }
}

/// [`Sha512`] backed by the in-process implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeSha512;

impl Sha512 for NativeSha512 {
    fn hash(&self, message: &[u8]) -> Hash<64> {
        Sha512Hasher::hash(message)
    }
}

/// [`Ripemd160`] backed by the in-process implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRipemd160;

impl Ripemd160 for NativeRipemd160 {
    fn hash(&self, message: &[u8]) -> Hash<20> {
        Ripemd160Hasher::hash(message)
    }
}
