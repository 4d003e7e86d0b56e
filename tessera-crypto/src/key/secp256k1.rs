//! secp256k1 back-end for ECDSA and Schnorr signing
//!
//! Wraps the libsecp256k1 bindings behind the [`Secp256k1`] capability
//! trait. Both signing paths are deterministic (RFC 6979 nonces for ECDSA,
//! no auxiliary randomness for Schnorr) so that identical compilation
//! inputs always produce identical bytecode.

use secp256k1::{ecdsa, schnorr, All, Keypair, Message, PublicKey, Scalar, SecretKey};

use crate::capability::{CurveError, Secp256k1};

/// Capability implementation holding a pre-computed context.
///
/// Context construction is the cold path; clone the [`std::sync::Arc`]
/// holding this value rather than rebuilding it per compilation.
pub struct NativeSecp256k1 {
    context: secp256k1::Secp256k1<All>,
}

impl NativeSecp256k1 {
    pub fn new() -> Self {
        Self {
            context: secp256k1::Secp256k1::new(),
        }
    }

    fn secret_key(private_key: &[u8; 32]) -> Result<SecretKey, CurveError> {
        SecretKey::from_slice(private_key).map_err(|_| CurveError::InvalidPrivateKey)
    }

    fn public_key(public_key: &[u8; 33]) -> Result<PublicKey, CurveError> {
        PublicKey::from_slice(public_key).map_err(|_| CurveError::InvalidPublicKey)
    }

    fn scalar(tweak: &[u8; 32]) -> Result<Scalar, CurveError> {
        Scalar::from_be_bytes(*tweak).map_err(|_| CurveError::InvalidTweak)
    }
}

impl Default for NativeSecp256k1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Secp256k1 for NativeSecp256k1 {
    fn derive_public_key_compressed(&self, private_key: &[u8; 32]) -> Result<[u8; 33], CurveError> {
        let secret = Self::secret_key(private_key)?;
        Ok(PublicKey::from_secret_key(&self.context, &secret).serialize())
    }

    fn add_tweak_private_key(
        &self,
        private_key: &[u8; 32],
        tweak: &[u8; 32],
    ) -> Result<[u8; 32], CurveError> {
        let secret = Self::secret_key(private_key)?;
        let tweaked = secret
            .add_tweak(&Self::scalar(tweak)?)
            .map_err(|_| CurveError::InvalidTweak)?;
        Ok(tweaked.secret_bytes())
    }

    fn add_tweak_public_key_compressed(
        &self,
        public_key: &[u8; 33],
        tweak: &[u8; 32],
    ) -> Result<[u8; 33], CurveError> {
        let public = Self::public_key(public_key)?;
        let tweaked = public
            .add_exp_tweak(&self.context, &Self::scalar(tweak)?)
            .map_err(|_| CurveError::InvalidTweak)?;
        Ok(tweaked.serialize())
    }

    fn sign_message_hash_der(
        &self,
        private_key: &[u8; 32],
        message_hash: &[u8; 32],
    ) -> Result<Vec<u8>, CurveError> {
        let secret = Self::secret_key(private_key)?;
        let message = Message::from_digest(*message_hash);
        let signature = self.context.sign_ecdsa(&message, &secret);
        Ok(signature.serialize_der().to_vec())
    }

    fn sign_message_hash_schnorr(
        &self,
        private_key: &[u8; 32],
        message_hash: &[u8; 32],
    ) -> Result<[u8; 64], CurveError> {
        let secret = Self::secret_key(private_key)?;
        let keypair = Keypair::from_secret_key(&self.context, &secret);
        let message = Message::from_digest(*message_hash);
        let signature = self.context.sign_schnorr_no_aux_rand(&message, &keypair);
        Ok(signature.serialize())
    }

    fn verify_signature_der(
        &self,
        signature: &[u8],
        public_key: &[u8; 33],
        message_hash: &[u8; 32],
    ) -> bool {
        let Ok(signature) = ecdsa::Signature::from_der(signature) else {
            return false;
        };
        let Ok(public) = Self::public_key(public_key) else {
            return false;
        };
        let message = Message::from_digest(*message_hash);
        self.context
            .verify_ecdsa(&message, &signature, &public)
            .is_ok()
    }

    fn verify_signature_schnorr(
        &self,
        signature: &[u8; 64],
        public_key: &[u8; 33],
        message_hash: &[u8; 32],
    ) -> bool {
        let Ok(signature) = schnorr::Signature::from_slice(signature) else {
            return false;
        };
        let Ok(public) = Self::public_key(public_key) else {
            return false;
        };
        let (x_only, _parity) = public.x_only_public_key();
        let message = Message::from_digest(*message_hash);
        self.context
            .verify_schnorr(&signature, &message, &x_only)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Secp256k1 as _;

    fn one_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        key[31] = 1;
        key
    }

    #[test]
    fn public_key_of_one_is_the_generator() {
        let backend = NativeSecp256k1::new();
        let public = backend.derive_public_key_compressed(&one_key()).unwrap();
        assert_eq!(
            hex::encode(public),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn zero_private_key_is_rejected() {
        let backend = NativeSecp256k1::new();
        assert_eq!(
            backend.derive_public_key_compressed(&[0u8; 32]),
            Err(CurveError::InvalidPrivateKey)
        );
    }

    #[test]
    fn ecdsa_round_trip() {
        let backend = NativeSecp256k1::new();
        let private = [0x01u8; 32];
        let digest = [0x02u8; 32];
        let public = backend.derive_public_key_compressed(&private).unwrap();

        let signature = backend.sign_message_hash_der(&private, &digest).unwrap();
        assert!((70..=72).contains(&signature.len()));
        assert!(backend.verify_signature_der(&signature, &public, &digest));
        assert!(!backend.verify_signature_der(&signature, &public, &[0x03u8; 32]));
    }

    #[test]
    fn schnorr_round_trip() {
        let backend = NativeSecp256k1::new();
        let private = [0x01u8; 32];
        let digest = [0x02u8; 32];
        let public = backend.derive_public_key_compressed(&private).unwrap();

        let signature = backend
            .sign_message_hash_schnorr(&private, &digest)
            .unwrap();
        assert!(backend.verify_signature_schnorr(&signature, &public, &digest));
        assert!(!backend.verify_signature_schnorr(&signature, &public, &[0x03u8; 32]));
    }

    #[test]
    fn signing_is_deterministic() {
        let backend = NativeSecp256k1::new();
        let private = [0x01u8; 32];
        let digest = [0x02u8; 32];
        assert_eq!(
            backend.sign_message_hash_der(&private, &digest).unwrap(),
            backend.sign_message_hash_der(&private, &digest).unwrap()
        );
        assert_eq!(
            backend.sign_message_hash_schnorr(&private, &digest).unwrap(),
            backend.sign_message_hash_schnorr(&private, &digest).unwrap()
        );
    }

    #[test]
    fn private_tweak_matches_public_tweak() {
        let backend = NativeSecp256k1::new();
        let private = [0x01u8; 32];
        let tweak = [0x02u8; 32];

        let tweaked_private = backend.add_tweak_private_key(&private, &tweak).unwrap();
        let public_of_tweaked = backend
            .derive_public_key_compressed(&tweaked_private)
            .unwrap();

        let public = backend.derive_public_key_compressed(&private).unwrap();
        let tweaked_public = backend
            .add_tweak_public_key_compressed(&public, &tweak)
            .unwrap();

        assert_eq!(public_of_tweaked, tweaked_public);
    }
}
