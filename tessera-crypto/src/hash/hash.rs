use std::{fmt, ops::Deref, str::FromStr};

use crate::capability::{Ripemd160, Sha256};

/// A fixed-width digest.
///
/// Script compilation deals in three widths: 32 bytes for SHA-256 and
/// the double-SHA-256 signing digests, 20 bytes for SHA-1 and the
/// RIPEMD-160 key fingerprints, and 64 bytes for the SHA-512 material
/// of HD derivation. Carrying the width in the type keeps a signing
/// digest from being handed somewhere a fingerprint belongs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash<const BYTES: usize>([u8; BYTES]);

impl<const BYTES: usize> Hash<BYTES> {
    #[inline]
    pub const fn new(digest: [u8; BYTES]) -> Self {
        Self(digest)
    }

    /// Borrow the digest with its width intact.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; BYTES] {
        &self.0
    }

    /// Copy the digest into a plain byte vector, the form compiler
    /// operations emit.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// Double SHA-256, the digest convention of transaction preimages,
/// outpoint/output digests and base58check checksums.
pub fn hash256(sha256: &dyn Sha256, message: &[u8]) -> Hash<32> {
    let inner = sha256.hash(message);
    sha256.hash(inner.as_bytes())
}

/// RIPEMD-160 of SHA-256, the digest convention of public-key
/// fingerprints and hashes.
pub fn hash160(sha256: &dyn Sha256, ripemd160: &dyn Ripemd160, message: &[u8]) -> Hash<20> {
    ripemd160.hash(sha256.hash(message).as_bytes())
}

impl<const BYTES: usize> From<[u8; BYTES]> for Hash<BYTES> {
    #[inline]
    fn from(digest: [u8; BYTES]) -> Self {
        Self(digest)
    }
}

impl<const BYTES: usize> Deref for Hash<BYTES> {
    type Target = [u8; BYTES];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const BYTES: usize> AsRef<[u8]> for Hash<BYTES> {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const BYTES: usize> fmt::Display for Hash<BYTES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl<const BYTES: usize> fmt::Debug for Hash<BYTES> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash<{}>({})", BYTES, self)
    }
}

impl<const BYTES: usize> FromStr for Hash<BYTES> {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut digest = [0u8; BYTES];
        hex::decode_to_slice(s, &mut digest)?;
        Ok(Self(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{NativeRipemd160, NativeSha256};

    #[test]
    fn parses_fixed_width_hex() {
        let fingerprint: Hash<20> = "751e76e8199196d454941c45d1b3a323f1433bd6".parse().unwrap();
        assert_eq!(fingerprint.to_string(), "751e76e8199196d454941c45d1b3a323f1433bd6");

        // a 20-byte string is not a 32-byte digest
        assert!("751e76e8199196d454941c45d1b3a323f1433bd6"
            .parse::<Hash<32>>()
            .is_err());
        assert!("751e".parse::<Hash<20>>().is_err());
    }

    #[test]
    fn hash256_is_sha256_twice() {
        let message = b"transaction outpoints";
        let once = NativeSha256.hash(message);
        assert_eq!(hash256(&NativeSha256, message), NativeSha256.hash(once.as_bytes()));
    }

    #[test]
    fn hash160_known_vector() {
        // HASH160 of the compressed generator point, a fixture every
        // Bitcoin-family codebase ends up with sooner or later.
        let generator =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        assert_eq!(
            hash160(&NativeSha256, &NativeRipemd160, &generator).to_string(),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }
}
