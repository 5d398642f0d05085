use std::{fmt, str::FromStr};

use crate::{
    error::{Error, Result},
    pattern::HandshakePattern,
    primitives::{
        cipher::{AES_GCM, CHACHA_POLY},
        dh::X25519_DH,
        hash::{BLAKE2B, BLAKE2S, SHA256, SHA512},
        Cipher, CryptoSuite, Dh, Hash,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DhChoice {
    Curve25519,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherChoice {
    ChaChaPoly,
    AesGcm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashChoice {
    Blake2s,
    Blake2b,
    Sha256,
    Sha512,
}

impl DhChoice {
    pub fn resolve(self) -> &'static dyn Dh {
        match self {
            DhChoice::Curve25519 => &X25519_DH,
        }
    }
}

impl CipherChoice {
    pub fn resolve(self) -> &'static dyn Cipher {
        match self {
            CipherChoice::ChaChaPoly => &CHACHA_POLY,
            CipherChoice::AesGcm => &AES_GCM,
        }
    }
}

impl HashChoice {
    pub fn resolve(self) -> &'static dyn Hash {
        match self {
            HashChoice::Blake2s => &BLAKE2S,
            HashChoice::Blake2b => &BLAKE2B,
            HashChoice::Sha256 => &SHA256,
            HashChoice::Sha512 => &SHA512,
        }
    }
}

impl FromStr for DhChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "25519" => Ok(DhChoice::Curve25519),
            _ => Err(Error::InvalidProtocolName(format!("unsupported DH function {s}"))),
        }
    }
}

impl FromStr for CipherChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ChaChaPoly" => Ok(CipherChoice::ChaChaPoly),
            "AESGCM" => Ok(CipherChoice::AesGcm),
            _ => Err(Error::InvalidProtocolName(format!("unsupported cipher {s}"))),
        }
    }
}

impl FromStr for HashChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BLAKE2s" => Ok(HashChoice::Blake2s),
            "BLAKE2b" => Ok(HashChoice::Blake2b),
            "SHA256" => Ok(HashChoice::Sha256),
            "SHA512" => Ok(HashChoice::Sha512),
            _ => Err(Error::InvalidProtocolName(format!("unsupported hash {s}"))),
        }
    }
}

/// A parsed `Noise_<Pattern>_<DH>_<Cipher>_<Hash>` name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolName {
    pub pattern: HandshakePattern,
    pub dh: DhChoice,
    pub cipher: CipherChoice,
    pub hash: HashChoice,
}

impl ProtocolName {
    pub fn parse(name: &str) -> Result<Self> {
        let mut parts = name.split('_');
        let (Some("Noise"), Some(pattern), Some(dh), Some(cipher), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(Error::InvalidProtocolName(name.to_owned()));
        };

        Ok(Self {
            pattern: HandshakePattern::parse(pattern)?,
            dh: dh.parse()?,
            cipher: cipher.parse()?,
            hash: hash.parse()?,
        })
    }

    pub fn suite(&self) -> CryptoSuite {
        CryptoSuite {
            dh: self.dh.resolve(),
            cipher: self.cipher.resolve(),
            hash: self.hash.resolve(),
        }
    }
}

impl FromStr for ProtocolName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ProtocolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Noise_{}_{}_{}_{}",
            self.pattern,
            self.dh.resolve().name(),
            self.cipher.resolve().name(),
            self.hash.resolve().name()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pattern::Pattern;

    #[test]
    fn parse_xk() {
        let name = ProtocolName::parse("Noise_XK_25519_ChaChaPoly_BLAKE2b").unwrap();
        assert_eq!(name.pattern.base(), Pattern::XK);
        assert!(!name.pattern.has_psk());
        assert_eq!(name.dh, DhChoice::Curve25519);
        assert_eq!(name.cipher, CipherChoice::ChaChaPoly);
        assert_eq!(name.hash, HashChoice::Blake2b);
        assert_eq!(name.suite().hash.hash_len(), 64);
    }

    #[test]
    fn display_is_canonical() {
        for text in [
            "Noise_XK_25519_ChaChaPoly_BLAKE2b",
            "Noise_NNpsk0+psk2_25519_AESGCM_SHA256",
            "Noise_IKpsk1_25519_ChaChaPoly_SHA512",
            "Noise_N_25519_AESGCM_BLAKE2s",
        ] {
            assert_eq!(ProtocolName::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn rejects_unsupported_or_malformed() {
        for text in [
            "Noise_XK_448_ChaChaPoly_BLAKE2b",
            "Noise_XK_25519_AESGCM256_BLAKE2b",
            "Noise_XK_25519_ChaChaPoly_MD5",
            "Noise_QQ_25519_ChaChaPoly_BLAKE2b",
            "Noise_XK_25519_ChaChaPoly",
            "Noise_XK_25519_ChaChaPoly_BLAKE2b_extra",
            "NoisePQ_XK_25519_ChaChaPoly_BLAKE2b",
            "",
        ] {
            assert!(
                matches!(ProtocolName::parse(text), Err(Error::InvalidProtocolName(_))),
                "{text} should be rejected"
            );
        }
    }
}
