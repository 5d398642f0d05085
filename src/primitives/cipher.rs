use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    consts::U12,
    ChaCha20Poly1305,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// key for AEAD cipher. Both registered ciphers take 256-bit keys.
#[derive(Zeroize, ZeroizeOnDrop, Eq, PartialEq)]
pub struct CipherKey([u8; KEY_LEN]);

impl CipherKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Takes the first `KEY_LEN` bytes of a hash output; 64-byte hashes are truncated.
    pub(crate) fn from_hash_output(output: &[u8]) -> Result<Self> {
        let prefix = output.get(..KEY_LEN).ok_or(Error::InvalidKey)?;
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(prefix);
        Ok(Self(key))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self(self.0)
    }
}

/// An AEAD cipher. Ciphertexts carry a trailing `TAG_LEN` byte tag.
pub trait Cipher: Send + Sync {
    fn name(&self) -> &'static str;

    fn encrypt(&self, key: &CipherKey, nonce: u64, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Fails with `AuthenticationFailure` if the tag does not verify.
    fn decrypt(&self, key: &CipherKey, nonce: u64, ad: &[u8], ciphertext: &[u8])
        -> Result<Vec<u8>>;
}

pub struct ChaChaPoly;
pub struct AesGcm;

pub static CHACHA_POLY: ChaChaPoly = ChaChaPoly;
pub static AES_GCM: AesGcm = AesGcm;

/// 32 bits of zeros followed by little-endian encoding of n
fn chacha_nonce(n: u64) -> [u8; NONCE_LEN] {
    let mut nonce = [0; NONCE_LEN];
    nonce[4..].copy_from_slice(&n.to_le_bytes());
    nonce
}

/// 32 bits of zeros followed by big-endian encoding of n
fn aesgcm_nonce(n: u64) -> [u8; NONCE_LEN] {
    let mut nonce = [0; NONCE_LEN];
    nonce[4..].copy_from_slice(&n.to_be_bytes());
    nonce
}

fn seal<A>(aead: A, nonce: [u8; NONCE_LEN], ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    A: AeadInPlace<NonceSize = U12>,
{
    let mut text = Vec::with_capacity(plaintext.len() + TAG_LEN);
    text.extend_from_slice(plaintext);
    aead.encrypt_in_place(&nonce.into(), ad, &mut text)
        .map_err(|_| Error::MessageTooLarge)?;
    Ok(text)
}

fn open<A>(aead: A, nonce: [u8; NONCE_LEN], ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    A: AeadInPlace<NonceSize = U12>,
{
    if ciphertext.len() < TAG_LEN {
        return Err(Error::AuthenticationFailure);
    }
    let mut text = ciphertext.to_vec();
    aead.decrypt_in_place(&nonce.into(), ad, &mut text)
        .map_err(|_| Error::AuthenticationFailure)?;
    Ok(text)
}

impl Cipher for ChaChaPoly {
    fn name(&self) -> &'static str {
        "ChaChaPoly"
    }

    fn encrypt(&self, key: &CipherKey, nonce: u64, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let aead = ChaCha20Poly1305::new(key.as_bytes().into());
        seal(aead, chacha_nonce(nonce), ad, plaintext)
    }

    fn decrypt(&self, key: &CipherKey, nonce: u64, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let aead = ChaCha20Poly1305::new(key.as_bytes().into());
        open(aead, chacha_nonce(nonce), ad, ciphertext)
    }
}

impl Cipher for AesGcm {
    fn name(&self) -> &'static str {
        "AESGCM"
    }

    fn encrypt(&self, key: &CipherKey, nonce: u64, ad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let aead = Aes256Gcm::new(key.as_bytes().into());
        seal(aead, aesgcm_nonce(nonce), ad, plaintext)
    }

    fn decrypt(&self, key: &CipherKey, nonce: u64, ad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let aead = Aes256Gcm::new(key.as_bytes().into());
        open(aead, aesgcm_nonce(nonce), ad, ciphertext)
    }
}

/// REKEY(k): the first 32 bytes of encrypting 32 zero bytes under the reserved max nonce.
pub(crate) fn rekey(cipher: &dyn Cipher, key: &CipherKey) -> Result<CipherKey> {
    let mut out = cipher.encrypt(key, u64::MAX, &[], &[0u8; KEY_LEN])?;
    let new_key = CipherKey::from_hash_output(&out);
    out.zeroize();
    new_key
}

#[cfg(test)]
mod test {
    use super::*;

    const KEY: [u8; KEY_LEN] = *b"fizzbuzz000000000000000000000000";

    #[test]
    fn le_construction() {
        let ref_array = [44, 46, 42, 89, 12, 19, 13, 121];
        let n = chacha_nonce(u64::from_le_bytes(ref_array));
        assert_eq!(n[..4], [0; 4]);
        assert_eq!(n[4..], ref_array);
    }

    #[test]
    fn be_construction() {
        let n = aesgcm_nonce(1);
        assert_eq!(n, [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn encryption_round_trip() {
        let start_text = b"without using any actual techniques that you would use when we give you the job";
        let key = CipherKey::from_bytes(KEY);
        let ad = b"foobar";
        for cipher in [&CHACHA_POLY as &dyn Cipher, &AES_GCM] {
            let ct = cipher.encrypt(&key, 7, ad, start_text).unwrap();
            assert_eq!(ct.len(), start_text.len() + TAG_LEN);
            let pt = cipher.decrypt(&key, 7, ad, &ct).unwrap();
            assert_eq!(pt.as_slice(), start_text);
        }
    }

    #[test]
    fn wrong_nonce_or_ad_fails() {
        let key = CipherKey::from_bytes(KEY);
        for cipher in [&CHACHA_POLY as &dyn Cipher, &AES_GCM] {
            let ct = cipher.encrypt(&key, 0, b"ad", b"hello").unwrap();
            assert_eq!(
                cipher.decrypt(&key, 1, b"ad", &ct),
                Err(Error::AuthenticationFailure)
            );
            assert_eq!(
                cipher.decrypt(&key, 0, b"da", &ct),
                Err(Error::AuthenticationFailure)
            );
        }
    }

    #[test]
    fn truncated_ciphertext() {
        let key = CipherKey::from_bytes(KEY);
        assert_eq!(
            CHACHA_POLY.decrypt(&key, 0, &[], &[0u8; TAG_LEN - 1]),
            Err(Error::AuthenticationFailure)
        );
    }

    #[test]
    fn ciphers_disagree() {
        let key = CipherKey::from_bytes(KEY);
        let a = CHACHA_POLY.encrypt(&key, 1, &[], b"same").unwrap();
        let b = AES_GCM.encrypt(&key, 1, &[], b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rekey_is_deterministic() {
        let key = CipherKey::from_bytes(KEY);
        let a = rekey(&CHACHA_POLY, &key).unwrap();
        let b = rekey(&CHACHA_POLY, &key).unwrap();
        assert!(a == b);
        assert!(a != key);
    }
}
