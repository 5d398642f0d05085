use rand_core::CryptoRngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// A Diffie-Hellman function over fixed-length keys.
pub trait Dh: Send + Sync {
    fn name(&self) -> &'static str;

    /// Length of public keys and of the DH output.
    fn pub_len(&self) -> usize;

    fn priv_len(&self) -> usize;

    /// Draws a fresh private key from `rng`.
    fn generate_private(&self, rng: &mut dyn CryptoRngCore) -> Result<Zeroizing<Vec<u8>>>;

    /// Derives the public key by base-point multiplication.
    fn public_key(&self, private: &[u8]) -> Result<Vec<u8>>;

    fn dh(&self, private: &[u8], public: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// using x25519-dalek
pub struct X25519;

pub static X25519_DH: X25519 = X25519;

const DH_LEN: usize = 32;

fn secret_from(private: &[u8]) -> Result<StaticSecret> {
    let bytes: [u8; DH_LEN] = private.try_into().map_err(|_| Error::InvalidKey)?;
    Ok(StaticSecret::from(bytes))
}

impl Dh for X25519 {
    fn name(&self) -> &'static str {
        "25519"
    }

    fn pub_len(&self) -> usize {
        DH_LEN
    }

    fn priv_len(&self) -> usize {
        DH_LEN
    }

    fn generate_private(&self, rng: &mut dyn CryptoRngCore) -> Result<Zeroizing<Vec<u8>>> {
        let mut bytes = Zeroizing::new(vec![0u8; DH_LEN]);
        rng.try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RandomSourceUnavailable)?;
        Ok(bytes)
    }

    fn public_key(&self, private: &[u8]) -> Result<Vec<u8>> {
        let secret = secret_from(private)?;
        Ok(PublicKey::from(&secret).as_bytes().to_vec())
    }

    /// Rejects low-order peer keys: a non-contributory result means the output is predictable.
    fn dh(&self, private: &[u8], public: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let secret = secret_from(private)?;
        let public: [u8; DH_LEN] = public.try_into().map_err(|_| Error::InvalidKey)?;
        let shared = secret.diffie_hellman(&PublicKey::from(public));
        if !shared.was_contributory() {
            return Err(Error::InvalidKey);
        }
        Ok(Zeroizing::new(shared.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    // RFC 7748, section 6.1
    #[test]
    fn rfc7748_vector() {
        let alice_priv = unhex("77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a");
        let bob_priv = unhex("5dab087e624a8a4b79e17f8b83800ee66f3bb1292618b6fd1c2f8b27ff88e0eb");
        let alice_pub = X25519_DH.public_key(&alice_priv).unwrap();
        let bob_pub = X25519_DH.public_key(&bob_priv).unwrap();
        assert_eq!(
            alice_pub,
            unhex("8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a")
        );
        assert_eq!(
            bob_pub,
            unhex("de9edb7d7b7dc1b4d35b61c2ece435373f8343c85b78674dadfc7e146f882b4f")
        );

        let shared = unhex("4a5d9d5ba4ce2de1728e3bf480350f25e07e21c947d19e3376f09b3c1e161742");
        assert_eq!(*X25519_DH.dh(&alice_priv, &bob_pub).unwrap(), shared);
        assert_eq!(*X25519_DH.dh(&bob_priv, &alice_pub).unwrap(), shared);
    }

    #[test]
    fn reject_zero_public_key() {
        let result = X25519_DH.dh(&[1u8; 32], &[0u8; 32]);
        assert_eq!(result.unwrap_err(), Error::InvalidKey);
    }

    #[test]
    fn wrong_lengths() {
        assert_eq!(X25519_DH.public_key(&[1u8; 31]), Err(Error::InvalidKey));
        assert_eq!(
            X25519_DH.dh(&[1u8; 32], &[9u8; 33]).unwrap_err(),
            Error::InvalidKey
        );
    }

    #[test]
    fn generated_keys_agree() {
        let a = X25519_DH.generate_private(&mut rand_core::OsRng).unwrap();
        let b = X25519_DH.generate_private(&mut rand_core::OsRng).unwrap();
        let a_pub = X25519_DH.public_key(&a).unwrap();
        let b_pub = X25519_DH.public_key(&b).unwrap();
        assert_eq!(
            *X25519_DH.dh(&a, &b_pub).unwrap(),
            *X25519_DH.dh(&b, &a_pub).unwrap()
        );
    }
}
