//! Rust-native building blocks for authentication-template compilation
//!
//! Tessera is a collection of modules for turning declarative
//! authentication templates into executable script bytecode. This crate
//! doesn't provide any particular application; it is meant as a base
//! layer for wallets, IDEs and other tooling that needs to compile,
//! sign and inspect template-described transactions.

#[doc(inline)]
pub use tessera_compiler as compiler;

#[doc(inline)]
pub use tessera_crypto as crypto;

#[doc(inline)]
pub use tessera_hd as hd;

#[doc(inline)]
pub use tessera_template as template;
