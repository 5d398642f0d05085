use std::marker::PhantomData;

use blake2::{Blake2b512, Blake2s256};
use hmac::{digest::core_api::BlockSizeUser, Mac, SimpleHmac};
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Two zeroized HKDF output blocks.
pub type HkdfOutput2 = (Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>);

/// Three zeroized HKDF output blocks.
pub type HkdfOutput3 = (Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>);

/// A hash function, plus the HMAC and HKDF built from it.
pub trait Hash: Send + Sync {
    fn name(&self) -> &'static str;

    fn hash_len(&self) -> usize;

    fn block_len(&self) -> usize;

    /// Hash of the concatenation of `parts`.
    fn hash(&self, parts: &[&[u8]]) -> Vec<u8>;

    /// HMAC per RFC 2104 over the concatenation of `parts`.
    fn hmac(&self, key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<Vec<u8>>>;

    /// `HKDF(chaining_key, input_key_material, 2)`
    fn hkdf2(&self, chaining_key: &[u8], input_key_material: &[u8]) -> Result<HkdfOutput2> {
        let temp_key = self.hmac(chaining_key, &[input_key_material])?;
        let output1 = self.hmac(&temp_key, &[&[0x01]])?;
        let output2 = self.hmac(&temp_key, &[output1.as_slice(), &[0x02]])?;
        Ok((output1, output2))
    }

    /// `HKDF(chaining_key, input_key_material, 3)`
    fn hkdf3(&self, chaining_key: &[u8], input_key_material: &[u8]) -> Result<HkdfOutput3> {
        let temp_key = self.hmac(chaining_key, &[input_key_material])?;
        let output1 = self.hmac(&temp_key, &[&[0x01]])?;
        let output2 = self.hmac(&temp_key, &[output1.as_slice(), &[0x02]])?;
        let output3 = self.hmac(&temp_key, &[output2.as_slice(), &[0x03]])?;
        Ok((output1, output2, output3))
    }
}

/// Any RustCrypto digest, named the way protocol names spell it.
pub struct DigestHash<D> {
    name: &'static str,
    _digest: PhantomData<fn() -> D>,
}

impl<D> DigestHash<D> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _digest: PhantomData,
        }
    }
}

pub static BLAKE2S: DigestHash<Blake2s256> = DigestHash::new("BLAKE2s");
pub static BLAKE2B: DigestHash<Blake2b512> = DigestHash::new("BLAKE2b");
pub static SHA256: DigestHash<Sha256> = DigestHash::new("SHA256");
pub static SHA512: DigestHash<Sha512> = DigestHash::new("SHA512");

impl<D> Hash for DigestHash<D>
where
    D: Digest + BlockSizeUser,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn hash_len(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn block_len(&self) -> usize {
        D::block_size()
    }

    fn hash(&self, parts: &[&[u8]]) -> Vec<u8> {
        let mut hasher = D::new();
        for part in parts {
            Digest::update(&mut hasher, part);
        }
        hasher.finalize().to_vec()
    }

    // BLAKE2's keyed mode is not HMAC; the generic construction keeps the output compatible with
    // other Noise implementations.
    fn hmac(&self, key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<Vec<u8>>> {
        let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(key).map_err(|_| Error::InvalidKey)?;
        for part in parts {
            Mac::update(&mut mac, part);
        }
        Ok(Zeroizing::new(mac.finalize().into_bytes().to_vec()))
    }
}
