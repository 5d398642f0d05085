use zeroize::Zeroizing;

use crate::{
    cipher_state::{CipherPair, CipherState},
    error::Result,
    primitives::{CipherKey, CryptoSuite},
};

/// The running chaining key and handshake hash, plus the handshake-phase cipher once a key has
/// been mixed in.
pub struct SymmState {
    suite: CryptoSuite,
    cipher_state: Option<CipherState>,
    chaining_key: Zeroizing<Vec<u8>>,
    output_hash: Vec<u8>,
}

impl Clone for SymmState {
    fn clone(&self) -> Self {
        Self {
            suite: self.suite,
            cipher_state: self.cipher_state.as_ref().map(CipherState::duplicate),
            chaining_key: self.chaining_key.clone(),
            output_hash: self.output_hash.clone(),
        }
    }
}

impl SymmState {
    /// Names no longer than the hash are zero-padded; longer ones are hashed.
    pub(crate) fn init(proto_name: &[u8], suite: CryptoSuite) -> Self {
        let hash_len = suite.hash.hash_len();
        let init_state = if proto_name.len() > hash_len {
            suite.hash.hash(&[proto_name])
        } else {
            let mut init_state = vec![0; hash_len];
            init_state[..proto_name.len()].copy_from_slice(proto_name);
            init_state
        };

        Self {
            suite,
            cipher_state: None,
            chaining_key: Zeroizing::new(init_state.clone()),
            output_hash: init_state,
        }
    }

    pub(crate) fn has_key(&self) -> bool {
        self.cipher_state.is_some()
    }

    pub(crate) fn handshake_hash(&self) -> &[u8] {
        &self.output_hash
    }

    fn install_key(&mut self, key_material: &[u8]) -> Result<()> {
        let key = CipherKey::from_hash_output(key_material)?;
        self.cipher_state = Some(CipherState::init(self.suite.cipher, key));
        Ok(())
    }

    /// `(ck, k) = HKDF(ck, ikm, 2)`; the handshake cipher restarts at nonce 0 under `k`.
    pub(crate) fn mix_key(&mut self, input: &[u8]) -> Result<()> {
        let (new_key, reinit_key) = self.suite.hash.hkdf2(&self.chaining_key, input)?;
        self.chaining_key = new_key;
        self.install_key(&reinit_key)
    }

    /// `h = HASH(h || data)`
    pub(crate) fn mix_hash(&mut self, data: &[u8]) {
        self.output_hash = self.suite.hash.hash(&[self.output_hash.as_slice(), data]);
    }

    /// `(ck, temp_h, k) = HKDF(ck, ikm, 3)`, then `MixHash(temp_h)` and rekey with `k`.
    pub(crate) fn mix_key_and_hash(&mut self, input: &[u8]) -> Result<()> {
        let (new_key, temp_hash, reinit_key) = self.suite.hash.hkdf3(&self.chaining_key, input)?;
        self.chaining_key = new_key;
        self.mix_hash(&temp_hash);
        self.install_key(&reinit_key)
    }

    /// Encrypts with `h` as associated data once a key exists, otherwise passes `text` through.
    /// Either way the output is mixed into `h`.
    pub(crate) fn encrypt_and_hash(&mut self, text: &[u8]) -> Result<Vec<u8>> {
        let out = match self.cipher_state.as_mut() {
            Some(state) => state.encrypt_with_ad(&self.output_hash, text)?,
            None => text.to_vec(),
        };
        self.mix_hash(&out);
        Ok(out)
    }

    /// Inverse of `encrypt_and_hash`. On a tag mismatch `h` is left untouched.
    pub(crate) fn decrypt_and_hash(&mut self, text: &[u8]) -> Result<Vec<u8>> {
        let out = match self.cipher_state.as_mut() {
            Some(state) => state.decrypt_with_ad(&self.output_hash, text)?,
            None => text.to_vec(),
        };
        self.mix_hash(text);
        Ok(out)
    }

    /// Derives the two transport ciphers, `(initiator -> responder, responder -> initiator)`.
    /// Consumes the handshake-phase state.
    pub(crate) fn split(self) -> Result<(CipherState, CipherState)> {
        let (k1, k2) = self.suite.hash.hkdf2(&self.chaining_key, &[])?;
        let c1 = CipherState::init(self.suite.cipher, CipherKey::from_hash_output(&k1)?);
        let c2 = CipherState::init(self.suite.cipher, CipherKey::from_hash_output(&k2)?);
        Ok((c1, c2))
    }

    /// Splits and orients the ciphers for one side of the handshake.
    pub(crate) fn split_for(self, initiator: bool) -> Result<CipherPair> {
        let (c1, c2) = self.split()?;
        Ok(if initiator {
            CipherPair {
                writer: c1,
                reader: c2,
            }
        } else {
            CipherPair {
                writer: c2,
                reader: c1,
            }
        })
    }

    #[cfg(test)]
    pub(crate) fn chaining_key(&self) -> &[u8] {
        &self.chaining_key
    }
}
