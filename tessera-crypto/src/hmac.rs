//! HMAC-SHA512 (RFC 2104) over the [`Sha512`] capability.
//!
//! Hierarchical key derivation is specified in terms of HMAC-SHA512, and
//! the environment gates derivation on its `sha512` handle; computing the
//! MAC through that same handle keeps the handle the single source of the
//! digest.

use crate::capability::Sha512;
use crate::hash::Hash;

const BLOCK_SIZE: usize = 128;

/// Compute `HMAC-SHA512(key, message)`.
pub fn hmac_sha512(sha512: &dyn Sha512, key: &[u8], message: &[u8]) -> Hash<64> {
    let mut padded_key = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        let digest = sha512.hash(key);
        padded_key[..64].copy_from_slice(digest.as_ref());
    } else {
        padded_key[..key.len()].copy_from_slice(key);
    }

    let mut inner = Vec::with_capacity(BLOCK_SIZE + message.len());
    inner.extend(padded_key.iter().map(|byte| byte ^ 0x36));
    inner.extend_from_slice(message);
    let inner_digest = sha512.hash(&inner);

    let mut outer = Vec::with_capacity(BLOCK_SIZE + 64);
    outer.extend(padded_key.iter().map(|byte| byte ^ 0x5c));
    outer.extend_from_slice(inner_digest.as_ref());
    sha512.hash(&outer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::NativeSha512;

    // RFC 4231, test case 1 and 2.
    #[test]
    fn rfc4231_case_1() {
        let key = [0x0bu8; 20];
        let mac = hmac_sha512(&NativeSha512, &key, b"Hi There");
        assert_eq!(
            mac.to_string(),
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
        );
    }

    #[test]
    fn rfc4231_case_2() {
        let mac = hmac_sha512(
            &NativeSha512,
            b"Jefe",
            b"what do ya want for nothing?",
        );
        assert_eq!(
            mac.to_string(),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }
}
