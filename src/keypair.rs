use rand_core::{CryptoRngCore, OsRng};
use zeroize::Zeroizing;

use crate::{error::Result, protocol::DhChoice};

/// A DH key pair. Only the public half ever leaves the owner; the private half is zeroized on
/// drop.
#[derive(Clone)]
pub struct KeyPair {
    curve: DhChoice,
    private: Zeroizing<Vec<u8>>,
    public: Vec<u8>,
}

impl KeyPair {
    /// Generates a key pair from the OS random source.
    pub fn generate(curve: DhChoice) -> Result<Self> {
        Self::generate_with_rng(curve, &mut OsRng)
    }

    pub fn generate_with_rng(curve: DhChoice, rng: &mut dyn CryptoRngCore) -> Result<Self> {
        let private = curve.resolve().generate_private(rng)?;
        Self::from_private(curve, &private)
    }

    /// Rebuilds a key pair from stored private key bytes, deriving the public half.
    pub fn from_private(curve: DhChoice, private: &[u8]) -> Result<Self> {
        let public = curve.resolve().public_key(private)?;
        Ok(Self {
            curve,
            private: Zeroizing::new(private.to_vec()),
            public,
        })
    }

    pub fn curve(&self) -> DhChoice {
        self.curve
    }

    pub fn public(&self) -> &[u8] {
        &self.public
    }

    pub fn private(&self) -> &[u8] {
        &self.private
    }

    /// DH between our private key and `remote_public`.
    pub(crate) fn dh(&self, remote_public: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.curve.resolve().dh(&self.private, remote_public)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("curve", &self.curve)
            .field("public", &hex::encode(&self.public))
            .finish_non_exhaustive()
    }
}

/// `generate(curveId)`: a fresh key pair from the OS random source.
pub fn generate_keypair(curve: DhChoice) -> Result<KeyPair> {
    KeyPair::generate(curve)
}
