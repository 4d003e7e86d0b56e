use crate::hash::Hash;

macro_rules! common_hasher {
    ($(#[$docs:meta])* $name:ident, $algo:ty, $size:literal) => {
        $(#[$docs])*
        pub struct $name($algo);

        impl $name {
            /// create a new hasher
            #[inline]
            pub fn new() -> Self {
                Self(<$algo>::new())
            }

            /// update the hasher with the given inputs
            #[inline]
            pub fn input(&mut self, bytes: &[u8]) {
                use cryptoxide::digest::Digest as _;
                self.0.input(bytes);
            }

            /// convenient function to directly generate the hash
            /// of the given bytes without creating the intermediary
            /// hasher and calling [`Self::input`].
            #[inline]
            pub fn hash(bytes: &[u8]) -> Hash<$size> {
                let mut hasher = Self::new();
                hasher.input(bytes);
                hasher.finalize()
            }

            /// consume the hasher and returns the computed digest
            pub fn finalize(mut self) -> Hash<$size> {
                use cryptoxide::digest::Digest as _;
                let mut digest = [0; $size];
                self.0.result(&mut digest);
                Hash::new(digest)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

common_hasher!(
    /// Streaming SHA-1 (20 byte digest).
    Sha1Hasher,
    cryptoxide::sha1::Sha1,
    20
);

common_hasher!(
    /// Streaming SHA-256 (32 byte digest).
    ///
    /// ```
    /// # use tessera_crypto::hash::Sha256Hasher;
    /// let digest = Sha256Hasher::hash(b"abc");
    /// # assert_eq!(
    /// #   "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
    /// #   hex::encode(digest)
    /// # );
    /// ```
    Sha256Hasher,
    cryptoxide::sha2::Sha256,
    32
);

common_hasher!(
    /// Streaming SHA-512 (64 byte digest).
    Sha512Hasher,
    cryptoxide::sha2::Sha512,
    64
);

common_hasher!(
    /// Streaming RIPEMD-160 (20 byte digest).
    Ripemd160Hasher,
    cryptoxide::ripemd160::Ripemd160,
    20
);
