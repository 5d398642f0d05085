use rand_core::CryptoRngCore;

use crate::{
    error::Result,
    hs_state::{HandshakeState, Role},
    keypair::KeyPair,
    protocol::ProtocolName,
};

/// Collects handshake configuration and produces an initialized `HandshakeState`.
///
/// ```
/// use vuvuzella::{generate_keypair, Builder, DhChoice};
///
/// let server = generate_keypair(DhChoice::Curve25519).unwrap();
/// let initiator = Builder::new("Noise_NK_25519_ChaChaPoly_BLAKE2s")
///     .unwrap()
///     .prologue(b"demo v1")
///     .remote_static(server.public())
///     .build_initiator()
///     .unwrap();
/// assert!(initiator.is_initiator());
/// ```
pub struct Builder {
    protocol: ProtocolName,
    prologue: Vec<u8>,
    local_static: Option<KeyPair>,
    remote_static: Option<Vec<u8>>,
    psks: Vec<Vec<u8>>,
    rng: Option<Box<dyn CryptoRngCore + Send>>,
    fixed_ephemeral: Option<KeyPair>,
}

impl Builder {
    pub fn new(protocol_name: &str) -> Result<Self> {
        Ok(Self::from_protocol(ProtocolName::parse(protocol_name)?))
    }

    pub fn from_protocol(protocol: ProtocolName) -> Self {
        Self {
            protocol,
            prologue: Vec::new(),
            local_static: None,
            remote_static: None,
            psks: Vec::new(),
            rng: None,
            fixed_ephemeral: None,
        }
    }

    pub fn prologue(mut self, prologue: &[u8]) -> Self {
        self.prologue = prologue.to_vec();
        self
    }

    pub fn local_static(mut self, keypair: KeyPair) -> Self {
        self.local_static = Some(keypair);
        self
    }

    pub fn remote_static(mut self, public: &[u8]) -> Self {
        self.remote_static = Some(public.to_vec());
        self
    }

    /// Appends a pre-shared key. Keys are consumed in the order the pattern's `psk` tokens appear.
    pub fn psk(mut self, psk: &[u8]) -> Self {
        self.psks.push(psk.to_vec());
        self
    }

    pub fn rng(mut self, rng: impl CryptoRngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    pub fn fixed_ephemeral(mut self, keypair: KeyPair) -> Self {
        self.fixed_ephemeral = Some(keypair);
        self
    }

    pub fn build_initiator(self) -> Result<HandshakeState> {
        self.build(Role::Initiator)
    }

    pub fn build_responder(self) -> Result<HandshakeState> {
        self.build(Role::Responder)
    }

    fn build(self, role: Role) -> Result<HandshakeState> {
        let mut state = HandshakeState::from_protocol(self.protocol, role);
        if let Some(rng) = self.rng {
            state.set_rng(rng)?;
        }
        if let Some(ephemeral) = self.fixed_ephemeral {
            state.set_fixed_ephemeral(ephemeral)?;
        }
        let psks: Vec<&[u8]> = self.psks.iter().map(Vec::as_slice).collect();
        state.initialize(
            Some(&self.prologue),
            self.local_static,
            self.remote_static.as_deref(),
            &psks,
        )?;
        Ok(state)
    }
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;

    use super::*;
    use crate::{error::Error, hs_state::Action, protocol::DhChoice};

    #[test]
    fn builds_both_roles() {
        let server = KeyPair::generate(DhChoice::Curve25519).unwrap();
        let initiator = Builder::new("Noise_NK_25519_AESGCM_SHA256")
            .unwrap()
            .remote_static(server.public())
            .rng(OsRng)
            .build_initiator()
            .unwrap();
        let responder = Builder::new("Noise_NK_25519_AESGCM_SHA256")
            .unwrap()
            .local_static(server)
            .build_responder()
            .unwrap();
        assert_eq!(initiator.action(), Action::WriteMessage);
        assert_eq!(responder.action(), Action::ReadMessage);
        assert_eq!(initiator.handshake_hash(), responder.handshake_hash());
    }

    #[test]
    fn prologue_is_bound() {
        let a = Builder::new("Noise_NN_25519_ChaChaPoly_BLAKE2s")
            .unwrap()
            .prologue(b"one")
            .build_initiator()
            .unwrap();
        let b = Builder::new("Noise_NN_25519_ChaChaPoly_BLAKE2s")
            .unwrap()
            .prologue(b"two")
            .build_responder()
            .unwrap();
        assert_ne!(a.handshake_hash(), b.handshake_hash());
    }

    #[test]
    fn surfaces_configuration_errors() {
        assert!(matches!(
            Builder::new("Noise_QQ_25519_ChaChaPoly_BLAKE2s"),
            Err(Error::InvalidProtocolName(_))
        ));
        let missing = Builder::new("Noise_NNpsk2_25519_ChaChaPoly_BLAKE2s")
            .unwrap()
            .build_initiator();
        assert!(matches!(missing, Err(Error::MissingPreSharedKey)));
        let ok = Builder::new("Noise_NNpsk2_25519_ChaChaPoly_BLAKE2s")
            .unwrap()
            .psk(&[3; 32])
            .build_initiator();
        assert!(ok.is_ok());
    }
}
