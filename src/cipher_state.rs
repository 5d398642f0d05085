use log::trace;

use crate::{
    error::{Error, Result},
    nonce::Nonce,
    primitives::{cipher, Cipher, CipherKey},
};

/// One symmetric key plus its nonce counter.
///
/// During the handshake a `SymmState` owns one of these; after split each party holds one for
/// sending and one for receiving.
pub struct CipherState {
    cipher: &'static dyn Cipher,
    nonce: Nonce,
    key: CipherKey,
}

/// The two transport ciphers produced by a completed handshake.
pub struct CipherPair {
    pub reader: CipherState,
    pub writer: CipherState,
}

impl CipherPair {
    /// `(send, receive)`
    pub fn into_split(self) -> (CipherState, CipherState) {
        (self.writer, self.reader)
    }

    /// Encrypts an outgoing transport message with empty associated data.
    pub fn encrypt(&mut self, plain_text: &[u8]) -> Result<Vec<u8>> {
        self.writer.encrypt_with_ad(&[], plain_text)
    }

    /// Decrypts an incoming transport message with empty associated data.
    pub fn decrypt(&mut self, cipher_text: &[u8]) -> Result<Vec<u8>> {
        self.reader.decrypt_with_ad(&[], cipher_text)
    }
}

impl CipherState {
    pub(crate) fn init(cipher: &'static dyn Cipher, key: CipherKey) -> Self {
        Self {
            cipher,
            nonce: Nonce::new(),
            key,
        }
    }

    /// Builds a transport cipher from a raw key, e.g. one exported from another implementation.
    pub fn from_key(cipher: &'static dyn Cipher, key: [u8; cipher::KEY_LEN]) -> Self {
        Self::init(cipher, CipherKey::from_bytes(key))
    }

    /// Copy for speculative handshake processing. Not `Clone`: two live copies of a transport
    /// cipher would reuse nonces.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            cipher: self.cipher,
            nonce: self.nonce.duplicate(),
            key: self.key.duplicate(),
        }
    }

    /// The nonce the next operation will use.
    pub fn nonce(&self) -> u64 {
        self.nonce.value()
    }

    pub fn cipher_name(&self) -> &'static str {
        self.cipher.name()
    }

    /// AEAD-seals `plain_text` under the current nonce, then advances it.
    pub fn encrypt_with_ad(&mut self, associated_data: &[u8], plain_text: &[u8]) -> Result<Vec<u8>> {
        let n = self.nonce.harvest()?;
        let text = self.cipher.encrypt(&self.key, n, associated_data, plain_text)?;
        self.nonce.advance();
        trace!("sealed {} bytes at nonce {n}", plain_text.len());
        Ok(text)
    }

    /// AEAD-opens `cipher_text`. The nonce advances only if the tag verifies; a failed message
    /// must be dropped, not retried.
    pub fn decrypt_with_ad(&mut self, associated_data: &[u8], cipher_text: &[u8]) -> Result<Vec<u8>> {
        let n = self.nonce.harvest()?;
        let text = self.cipher.decrypt(&self.key, n, associated_data, cipher_text)?;
        self.nonce.advance();
        trace!("opened {} bytes at nonce {n}", text.len());
        Ok(text)
    }

    /// Replaces the key with REKEY(k). The nonce is left untouched.
    pub fn rekey(&mut self) -> Result<()> {
        self.key = cipher::rekey(self.cipher, &self.key)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn with_nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = nonce;
        self
    }
}

impl std::fmt::Debug for CipherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherState")
            .field("cipher", &self.cipher.name())
            .field("nonce", &self.nonce.value())
            .finish_non_exhaustive()
    }
}

/// Rejects the message outright; used where a ciphertext is shorter than a tag.
pub(crate) fn check_tag_room(cipher_text: &[u8]) -> Result<()> {
    if cipher_text.len() < cipher::TAG_LEN {
        return Err(Error::InvalidMessage);
    }
    Ok(())
}
