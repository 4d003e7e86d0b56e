//! Asymmetric key back-ends.

pub mod secp256k1;
