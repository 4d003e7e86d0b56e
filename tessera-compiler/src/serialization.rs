//! Transaction signing serializations
//!
//! A BCH signature commits to a serialization of the transaction context
//! selected by a SIGHASH algorithm. This module owns the algorithm enum,
//! the context struct ([`OperationData`]) and the byte-exact preimage
//! assembly; the signing operations double-SHA-256 the preimage and the
//! `signing_serialization.full_*` identifiers expose it raw.

use tessera_crypto::capability::Sha256;
use tessera_crypto::hash::hash256;

use crate::encoding::encode_var_int;

const ALL: u8 = 0x01;
const NONE: u8 = 0x02;
const SINGLE: u8 = 0x03;
const FORK_ID: u8 = 0x40;
const SINGLE_INPUT: u8 = 0x80;

/// Transaction context required to produce a signing serialization.
///
/// All numeric fields are unsigned with the fixed widths of the wire
/// format; `transaction_outpoints`, `transaction_outputs` and
/// `transaction_sequence_numbers` are the already-serialized
/// concatenations hashed into the preimage.
#[derive(Debug, Clone)]
pub struct OperationData {
    pub version: u32,
    pub locktime: u32,
    pub outpoint_transaction_hash: [u8; 32],
    pub outpoint_index: u32,
    pub output_value: u64,
    pub sequence_number: u32,
    /// The locking bytecode covered by the signature.
    pub covered_bytecode: Vec<u8>,
    /// The serialized output at this input's index, when one exists.
    pub corresponding_output: Option<Vec<u8>>,
    pub transaction_outpoints: Vec<u8>,
    pub transaction_outputs: Vec<u8>,
    pub transaction_sequence_numbers: Vec<u8>,
}

/// The closed set of SIGHASH algorithms a signature identifier may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningSerializationAlgorithm {
    AllOutputs,
    AllOutputsSingleInput,
    CorrespondingOutput,
    CorrespondingOutputSingleInput,
    NoOutputs,
    NoOutputsSingleInput,
}

impl SigningSerializationAlgorithm {
    /// Look up the algorithm named by an identifier segment.
    pub fn from_identifier(name: &str) -> Option<Self> {
        match name {
            "all_outputs" => Some(Self::AllOutputs),
            "all_outputs_single_input" => Some(Self::AllOutputsSingleInput),
            "corresponding_output" => Some(Self::CorrespondingOutput),
            "corresponding_output_single_input" => Some(Self::CorrespondingOutputSingleInput),
            "no_outputs" => Some(Self::NoOutputs),
            "no_outputs_single_input" => Some(Self::NoOutputsSingleInput),
            _ => None,
        }
    }

    pub const fn identifier(self) -> &'static str {
        match self {
            Self::AllOutputs => "all_outputs",
            Self::AllOutputsSingleInput => "all_outputs_single_input",
            Self::CorrespondingOutput => "corresponding_output",
            Self::CorrespondingOutputSingleInput => "corresponding_output_single_input",
            Self::NoOutputs => "no_outputs",
            Self::NoOutputsSingleInput => "no_outputs_single_input",
        }
    }

    /// The SIGHASH byte: the base flag, the fork id, and the
    /// single-input bit where the algorithm requests it.
    pub const fn sighash_byte(self) -> u8 {
        match self {
            Self::AllOutputs => ALL | FORK_ID,
            Self::AllOutputsSingleInput => ALL | SINGLE_INPUT | FORK_ID,
            Self::CorrespondingOutput => SINGLE | FORK_ID,
            Self::CorrespondingOutputSingleInput => SINGLE | SINGLE_INPUT | FORK_ID,
            Self::NoOutputs => NONE | FORK_ID,
            Self::NoOutputsSingleInput => NONE | SINGLE_INPUT | FORK_ID,
        }
    }

    const fn base(self) -> u8 {
        self.sighash_byte() & 0x1f
    }

    const fn single_input(self) -> bool {
        self.sighash_byte() & SINGLE_INPUT != 0
    }
}

const ZERO_HASH: [u8; 32] = [0u8; 32];

/// Assemble the signing-serialization preimage for `algorithm`.
///
/// The layout is fixed: version, the outpoints and sequence-number
/// digests (or zeros, per the SIGHASH flags), this input's outpoint,
/// the length-prefixed covered bytecode, value, sequence number, the
/// outputs digest (or zeros), locktime, and the 4-byte little-endian
/// sighash type.
pub fn generate_signing_serialization(
    sha256: &dyn Sha256,
    algorithm: SigningSerializationAlgorithm,
    data: &OperationData,
) -> Vec<u8> {
    let hash_outpoints = if algorithm.single_input() {
        ZERO_HASH
    } else {
        *hash256(sha256, &data.transaction_outpoints)
    };

    let hash_sequence_numbers = if algorithm.single_input() || algorithm.base() != ALL {
        ZERO_HASH
    } else {
        *hash256(sha256, &data.transaction_sequence_numbers)
    };

    let hash_outputs = match algorithm.base() {
        ALL => *hash256(sha256, &data.transaction_outputs),
        SINGLE => data
            .corresponding_output
            .as_deref()
            .map(|output| *hash256(sha256, output))
            .unwrap_or(ZERO_HASH),
        _ => ZERO_HASH,
    };

    let covered_length = encode_var_int(data.covered_bytecode.len() as u64);

    let mut serialization =
        Vec::with_capacity(108 + 32 * 3 + covered_length.len() + data.covered_bytecode.len());
    serialization.extend_from_slice(&data.version.to_le_bytes());
    serialization.extend_from_slice(&hash_outpoints);
    serialization.extend_from_slice(&hash_sequence_numbers);
    serialization.extend_from_slice(&data.outpoint_transaction_hash);
    serialization.extend_from_slice(&data.outpoint_index.to_le_bytes());
    serialization.extend_from_slice(&covered_length);
    serialization.extend_from_slice(&data.covered_bytecode);
    serialization.extend_from_slice(&data.output_value.to_le_bytes());
    serialization.extend_from_slice(&data.sequence_number.to_le_bytes());
    serialization.extend_from_slice(&hash_outputs);
    serialization.extend_from_slice(&data.locktime.to_le_bytes());
    serialization.extend_from_slice(&(algorithm.sighash_byte() as u32).to_le_bytes());
    serialization
}
