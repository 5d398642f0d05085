//! Capability interfaces over the DH, AEAD and hash functions, and the registered
//! implementations a protocol name can select.
//!
//! - [`dh`]: X25519 via `x25519-dalek`
//! - [`cipher`]: ChaChaPoly1305 and AES-256-GCM
//! - [`hash`]: BLAKE2s, BLAKE2b, SHA-256, SHA-512, with HMAC and the Noise HKDF

pub mod cipher;
pub mod dh;
pub mod hash;

use std::fmt;

pub use cipher::{Cipher, CipherKey};
pub use dh::Dh;
pub use hash::Hash;

/// The three primitives a handshake runs on, resolved from a protocol name.
///
/// Implementations are stateless statics, so a suite is freely copyable.
#[derive(Clone, Copy)]
pub struct CryptoSuite {
    pub dh: &'static dyn Dh,
    pub cipher: &'static dyn Cipher,
    pub hash: &'static dyn Hash,
}

impl fmt::Debug for CryptoSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoSuite")
            .field("dh", &self.dh.name())
            .field("cipher", &self.cipher.name())
            .field("hash", &self.hash.name())
            .finish()
    }
}
