//! HD key nodes: base58check codec and child derivation

use std::fmt;

use tessera_crypto::capability::{Ripemd160, Secp256k1, Sha256, Sha512};
use tessera_crypto::hash::{hash160, hash256};
use tessera_crypto::hmac::hmac_sha512;

use crate::path::HARDENED_OFFSET;
use crate::{DerivationPath, Error};

/// Capability handles HD derivation reads from the environment.
pub struct HdCrypto<'a> {
    pub sha256: &'a dyn Sha256,
    pub sha512: &'a dyn Sha512,
    pub ripemd160: &'a dyn Ripemd160,
    pub secp256k1: &'a dyn Secp256k1,
}

/// Network a serialized key belongs to, per its version prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyNetwork {
    Mainnet,
    Testnet,
}

const VERSION_MAINNET_PRIVATE: u32 = 0x0488_ade4;
const VERSION_MAINNET_PUBLIC: u32 = 0x0488_b21e;
const VERSION_TESTNET_PRIVATE: u32 = 0x0435_8394;
const VERSION_TESTNET_PUBLIC: u32 = 0x0435_87cf;

const SERIALIZED_LENGTH: usize = 78;
const CHECKSUM_LENGTH: usize = 4;

/// A private HD node: a private key plus the chain code and positional
/// metadata of its place in the tree.
#[derive(Clone, PartialEq, Eq)]
pub struct HdPrivateNode {
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    chain_code: [u8; 32],
    private_key: [u8; 32],
}

/// A public HD node; supports non-hardened derivation only.
#[derive(Clone, PartialEq, Eq)]
pub struct HdPublicNode {
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
    chain_code: [u8; 32],
    public_key: [u8; 33],
}

// the private key stays out of Debug output
impl fmt::Debug for HdPrivateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdPrivateNode")
            .field("depth", &self.depth)
            .field("child_index", &self.child_index)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for HdPublicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdPublicNode")
            .field("depth", &self.depth)
            .field("child_index", &self.child_index)
            .field("public_key", &hex::encode(self.public_key))
            .finish()
    }
}

fn decode_payload(sha256: &dyn Sha256, encoded: &str) -> Result<(u32, Vec<u8>), Error> {
    let bytes = bs58::decode(encoded).into_vec()?;
    if bytes.len() != SERIALIZED_LENGTH + CHECKSUM_LENGTH {
        return Err(Error::UnexpectedLength(bytes.len()));
    }
    let (payload, checksum) = bytes.split_at(SERIALIZED_LENGTH);
    if hash256(sha256, payload)[..CHECKSUM_LENGTH] != *checksum {
        return Err(Error::InvalidChecksum);
    }
    let version = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    Ok((version, payload.to_vec()))
}

fn encode_payload(sha256: &dyn Sha256, payload: &[u8; SERIALIZED_LENGTH]) -> String {
    let checksum = hash256(sha256, payload);
    let mut bytes = Vec::with_capacity(SERIALIZED_LENGTH + CHECKSUM_LENGTH);
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
    bs58::encode(bytes).into_string()
}

/// Decode an `xprv…`/`tprv…` string into a private node and its network.
pub fn decode_hd_private_key(
    sha256: &dyn Sha256,
    encoded: &str,
) -> Result<(HdPrivateNode, KeyNetwork), Error> {
    let (version, payload) = decode_payload(sha256, encoded)?;
    let network = match version {
        VERSION_MAINNET_PRIVATE => KeyNetwork::Mainnet,
        VERSION_TESTNET_PRIVATE => KeyNetwork::Testnet,
        VERSION_MAINNET_PUBLIC | VERSION_TESTNET_PUBLIC => return Err(Error::ExpectedPrivateKey),
        unknown => return Err(Error::UnknownVersionPrefix(unknown)),
    };
    if payload[45] != 0 {
        return Err(Error::InvalidPrivateKeyPayload);
    }
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&payload[13..45]);
    let mut private_key = [0u8; 32];
    private_key.copy_from_slice(&payload[46..78]);
    Ok((
        HdPrivateNode {
            depth: payload[4],
            parent_fingerprint: [payload[5], payload[6], payload[7], payload[8]],
            child_index: u32::from_be_bytes([payload[9], payload[10], payload[11], payload[12]]),
            chain_code,
            private_key,
        },
        network,
    ))
}

/// Decode an `xpub…`/`tpub…` string into a public node and its network.
pub fn decode_hd_public_key(
    sha256: &dyn Sha256,
    encoded: &str,
) -> Result<(HdPublicNode, KeyNetwork), Error> {
    let (version, payload) = decode_payload(sha256, encoded)?;
    let network = match version {
        VERSION_MAINNET_PUBLIC => KeyNetwork::Mainnet,
        VERSION_TESTNET_PUBLIC => KeyNetwork::Testnet,
        VERSION_MAINNET_PRIVATE | VERSION_TESTNET_PRIVATE => return Err(Error::ExpectedPublicKey),
        unknown => return Err(Error::UnknownVersionPrefix(unknown)),
    };
    if payload[45] != 0x02 && payload[45] != 0x03 {
        return Err(Error::InvalidPublicKeyPayload);
    }
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&payload[13..45]);
    let mut public_key = [0u8; 33];
    public_key.copy_from_slice(&payload[45..78]);
    Ok((
        HdPublicNode {
            depth: payload[4],
            parent_fingerprint: [payload[5], payload[6], payload[7], payload[8]],
            child_index: u32::from_be_bytes([payload[9], payload[10], payload[11], payload[12]]),
            chain_code,
            public_key,
        },
        network,
    ))
}

impl HdPrivateNode {
    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// The public node at the same position.
    pub fn public_node(&self, crypto: &HdCrypto) -> Result<HdPublicNode, Error> {
        let public_key = crypto
            .secp256k1
            .derive_public_key_compressed(&self.private_key)?;
        Ok(HdPublicNode {
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
            chain_code: self.chain_code,
            public_key,
        })
    }

    /// Derive the child at `index` (hardened when `index` carries the
    /// hardened offset).
    pub fn derive_child(&self, crypto: &HdCrypto, index: u32) -> Result<HdPrivateNode, Error> {
        let parent_public = crypto
            .secp256k1
            .derive_public_key_compressed(&self.private_key)?;

        let mut message = Vec::with_capacity(37);
        if index >= HARDENED_OFFSET {
            message.push(0);
            message.extend_from_slice(&self.private_key);
        } else {
            message.extend_from_slice(&parent_public);
        }
        message.extend_from_slice(&index.to_be_bytes());

        let digest = hmac_sha512(crypto.sha512, &self.chain_code, &message);
        let mut tweak = [0u8; 32];
        tweak.copy_from_slice(&digest[..32]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        let private_key = crypto
            .secp256k1
            .add_tweak_private_key(&self.private_key, &tweak)?;
        let fingerprint = hash160(crypto.sha256, crypto.ripemd160, &parent_public);

        Ok(HdPrivateNode {
            depth: self
                .depth
                .checked_add(1)
                .ok_or(Error::DerivationDepthExceeded)?,
            parent_fingerprint: [fingerprint[0], fingerprint[1], fingerprint[2], fingerprint[3]],
            child_index: index,
            chain_code,
            private_key,
        })
    }

    /// Derive along a concrete child-index sequence.
    pub fn derive_indexes(&self, crypto: &HdCrypto, indexes: &[u32]) -> Result<HdPrivateNode, Error> {
        indexes.iter().try_fold(self.clone(), |node, index| {
            node.derive_child(crypto, *index)
        })
    }

    /// Derive along `path` instantiated at `address_index`.
    pub fn derive_path(
        &self,
        crypto: &HdCrypto,
        path: &DerivationPath,
        address_index: u32,
    ) -> Result<HdPrivateNode, Error> {
        self.derive_indexes(crypto, &path.instantiate(address_index)?)
    }

    /// Serialize as base58check with the network's private version prefix.
    pub fn to_base58(&self, sha256: &dyn Sha256, network: KeyNetwork) -> String {
        let version = match network {
            KeyNetwork::Mainnet => VERSION_MAINNET_PRIVATE,
            KeyNetwork::Testnet => VERSION_TESTNET_PRIVATE,
        };
        let mut payload = [0u8; SERIALIZED_LENGTH];
        payload[0..4].copy_from_slice(&version.to_be_bytes());
        payload[4] = self.depth;
        payload[5..9].copy_from_slice(&self.parent_fingerprint);
        payload[9..13].copy_from_slice(&self.child_index.to_be_bytes());
        payload[13..45].copy_from_slice(&self.chain_code);
        payload[45] = 0;
        payload[46..78].copy_from_slice(&self.private_key);
        encode_payload(sha256, &payload)
    }
}

impl HdPublicNode {
    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    /// Derive the non-hardened child at `index`.
    pub fn derive_child(&self, crypto: &HdCrypto, index: u32) -> Result<HdPublicNode, Error> {
        if index >= HARDENED_OFFSET {
            return Err(Error::HardenedDerivationRequiresPrivateNode);
        }

        let mut message = Vec::with_capacity(37);
        message.extend_from_slice(&self.public_key);
        message.extend_from_slice(&index.to_be_bytes());

        let digest = hmac_sha512(crypto.sha512, &self.chain_code, &message);
        let mut tweak = [0u8; 32];
        tweak.copy_from_slice(&digest[..32]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&digest[32..]);

        let public_key = crypto
            .secp256k1
            .add_tweak_public_key_compressed(&self.public_key, &tweak)?;
        let fingerprint = hash160(crypto.sha256, crypto.ripemd160, &self.public_key);

        Ok(HdPublicNode {
            depth: self
                .depth
                .checked_add(1)
                .ok_or(Error::DerivationDepthExceeded)?,
            parent_fingerprint: [fingerprint[0], fingerprint[1], fingerprint[2], fingerprint[3]],
            child_index: index,
            chain_code,
            public_key,
        })
    }

    /// Derive along a concrete child-index sequence.
    pub fn derive_indexes(&self, crypto: &HdCrypto, indexes: &[u32]) -> Result<HdPublicNode, Error> {
        indexes.iter().try_fold(self.clone(), |node, index| {
            node.derive_child(crypto, *index)
        })
    }

    /// Derive along `path` instantiated at `address_index`.
    pub fn derive_path(
        &self,
        crypto: &HdCrypto,
        path: &DerivationPath,
        address_index: u32,
    ) -> Result<HdPublicNode, Error> {
        self.derive_indexes(crypto, &path.instantiate(address_index)?)
    }

    /// Serialize as base58check with the network's public version prefix.
    pub fn to_base58(&self, sha256: &dyn Sha256, network: KeyNetwork) -> String {
        let version = match network {
            KeyNetwork::Mainnet => VERSION_MAINNET_PUBLIC,
            KeyNetwork::Testnet => VERSION_TESTNET_PUBLIC,
        };
        let mut payload = [0u8; SERIALIZED_LENGTH];
        payload[0..4].copy_from_slice(&version.to_be_bytes());
        payload[4] = self.depth;
        payload[5..9].copy_from_slice(&self.parent_fingerprint);
        payload[9..13].copy_from_slice(&self.child_index.to_be_bytes());
        payload[13..45].copy_from_slice(&self.chain_code);
        payload[45..78].copy_from_slice(&self.public_key);
        encode_payload(sha256, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_crypto::capability::{NativeRipemd160, NativeSha256, NativeSha512};
    use tessera_crypto::key::secp256k1::NativeSecp256k1;

    // BIP32 test vector 1 (seed 000102030405060708090a0b0c0d0e0f).
    const TV1_MASTER_XPRV: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
    const TV1_MASTER_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
    const TV1_M_0H_XPRV: &str = "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7";
    const TV1_M_0H_1_XPRV: &str = "xprv9wTYmMFdV23N2TdNG573QoEsfRrWKQgWeibmLntzniatZvR9BmLnvSxqu53Kw1UmYPxLgboyZQaXwTCg8MSY3H2EU4pWcQDnRnrVA1xe8fs";
    const TV1_M_0H_1_XPUB: &str = "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ";

    fn crypto_fixture() -> (NativeSecp256k1, NativeSha256, NativeSha512, NativeRipemd160) {
        (NativeSecp256k1::new(), NativeSha256, NativeSha512, NativeRipemd160)
    }

    macro_rules! crypto {
        ($fixture:expr) => {
            HdCrypto {
                sha256: &$fixture.1,
                sha512: &$fixture.2,
                ripemd160: &$fixture.3,
                secp256k1: &$fixture.0,
            }
        };
    }

    #[test]
    fn decode_and_reencode_master_keys() {
        let (node, network) = decode_hd_private_key(&NativeSha256, TV1_MASTER_XPRV).unwrap();
        assert_eq!(network, KeyNetwork::Mainnet);
        assert_eq!(node.depth(), 0);
        assert_eq!(node.child_index(), 0);
        assert_eq!(node.to_base58(&NativeSha256, KeyNetwork::Mainnet), TV1_MASTER_XPRV);

        let (public, _) = decode_hd_public_key(&NativeSha256, TV1_MASTER_XPUB).unwrap();
        assert_eq!(public.to_base58(&NativeSha256, KeyNetwork::Mainnet), TV1_MASTER_XPUB);
    }

    #[test]
    fn public_node_matches_the_published_xpub() {
        let fixture = crypto_fixture();
        let crypto = crypto!(fixture);
        let (node, _) = decode_hd_private_key(&NativeSha256, TV1_MASTER_XPRV).unwrap();
        let public = node.public_node(&crypto).unwrap();
        assert_eq!(public.to_base58(&NativeSha256, KeyNetwork::Mainnet), TV1_MASTER_XPUB);
    }

    #[test]
    fn hardened_child_derivation() {
        let fixture = crypto_fixture();
        let crypto = crypto!(fixture);
        let (master, _) = decode_hd_private_key(&NativeSha256, TV1_MASTER_XPRV).unwrap();
        let child = master.derive_child(&crypto, HARDENED_OFFSET).unwrap();
        assert_eq!(child.to_base58(&NativeSha256, KeyNetwork::Mainnet), TV1_M_0H_XPRV);
    }

    #[test]
    fn public_derivation_matches_private_derivation() {
        let fixture = crypto_fixture();
        let crypto = crypto!(fixture);
        let (master, _) = decode_hd_private_key(&NativeSha256, TV1_MASTER_XPRV).unwrap();

        let m_0h_1 = master
            .derive_indexes(&crypto, &[HARDENED_OFFSET, 1])
            .unwrap();
        assert_eq!(
            m_0h_1.to_base58(&NativeSha256, KeyNetwork::Mainnet),
            TV1_M_0H_1_XPRV
        );

        let via_private = m_0h_1.public_node(&crypto).unwrap();
        assert_eq!(
            via_private.to_base58(&NativeSha256, KeyNetwork::Mainnet),
            TV1_M_0H_1_XPUB
        );

        let via_public = master
            .derive_child(&crypto, HARDENED_OFFSET)
            .unwrap()
            .public_node(&crypto)
            .unwrap()
            .derive_child(&crypto, 1)
            .unwrap();
        assert_eq!(via_public, via_private);
    }

    #[test]
    fn hardened_derivation_from_public_node_fails() {
        let fixture = crypto_fixture();
        let crypto = crypto!(fixture);
        let (public, _) = decode_hd_public_key(&NativeSha256, TV1_MASTER_XPUB).unwrap();
        assert!(matches!(
            public.derive_child(&crypto, HARDENED_OFFSET),
            Err(Error::HardenedDerivationRequiresPrivateNode)
        ));
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut corrupted = TV1_MASTER_XPRV.to_string();
        corrupted.pop();
        corrupted.push('1');
        assert!(matches!(
            decode_hd_private_key(&NativeSha256, &corrupted),
            Err(Error::InvalidChecksum) | Err(Error::InvalidBase58(_))
        ));
    }

    #[test]
    fn mismatched_kind_is_rejected() {
        assert!(matches!(
            decode_hd_private_key(&NativeSha256, TV1_MASTER_XPUB),
            Err(Error::ExpectedPrivateKey)
        ));
        assert!(matches!(
            decode_hd_public_key(&NativeSha256, TV1_MASTER_XPRV),
            Err(Error::ExpectedPublicKey)
        ));
    }
}
