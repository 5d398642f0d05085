use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use log::{debug, trace, warn};
use rand_core::{CryptoRngCore, OsRng};
use zeroize::Zeroizing;

use crate::{
    cipher_state::{check_tag_room, CipherPair},
    error::{Error, Result},
    keypair::KeyPair,
    pattern::Token,
    primitives::cipher::TAG_LEN,
    protocol::ProtocolName,
    symm_state::SymmState,
};

/// Noise caps every handshake and transport message at this many bytes.
pub const MAX_MESSAGE_LEN: usize = 65535;

pub const PSK_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// What the owner of a `HandshakeState` has to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    WriteMessage,
    ReadMessage,
    /// All message lines are consumed; call `split`.
    Split,
    /// Nothing can be done: not yet initialized, or already split.
    Failed,
}

/// Everything a message line mutates. Lines are processed against a copy of this and the copy
/// is committed only once the whole line succeeded.
#[derive(Clone)]
struct Progress {
    symm_state: SymmState,
    local_ephemeral: Option<KeyPair>,
    remote_static: Option<Vec<u8>>,
    remote_ephemeral: Option<Vec<u8>>,
    next_psk: usize,
}

enum Phase {
    Uninitialized,
    Running(Progress),
    Finished {
        handshake_hash: Vec<u8>,
        remote_static: Option<Vec<u8>>,
    },
}

/// One party's side of a Noise handshake.
///
/// Drive it by asking `action()` and calling `write_message` / `read_message` until it reports
/// `Action::Split`, then call `split` for the transport ciphers. An instance is single-owner:
/// the two parties each run their own, connected only by the bytes they exchange.
pub struct HandshakeState {
    protocol: ProtocolName,
    role: Role,
    phase: Phase,
    local_static: Option<KeyPair>,
    message_patterns: VecDeque<Vec<Token>>,
    lines_done: usize,
    psks: Vec<Zeroizing<[u8; PSK_LEN]>>,
    fixed_ephemeral: Option<KeyPair>,
    rng: Box<dyn CryptoRngCore + Send>,
}

fn key_prefix(key: &[u8]) -> String {
    hex::encode(&key[..key.len().min(4)])
}

fn take(buf: &mut Bytes, len: usize) -> Result<Bytes> {
    if buf.len() < len {
        return Err(Error::InvalidMessage);
    }
    Ok(buf.split_to(len))
}

impl HandshakeState {
    pub fn new(protocol_name: &str, role: Role) -> Result<Self> {
        Ok(Self::from_protocol(ProtocolName::parse(protocol_name)?, role))
    }

    pub fn from_protocol(protocol: ProtocolName, role: Role) -> Self {
        Self {
            protocol,
            role,
            phase: Phase::Uninitialized,
            local_static: None,
            message_patterns: VecDeque::new(),
            lines_done: 0,
            psks: Vec::new(),
            fixed_ephemeral: None,
            rng: Box::new(OsRng),
        }
    }

    /// Replaces the OS random source used for ephemeral keys. Only valid before `initialize`.
    pub fn set_rng(&mut self, rng: Box<dyn CryptoRngCore + Send>) -> Result<()> {
        self.ensure_uninitialized()?;
        self.rng = rng;
        Ok(())
    }

    /// Pins the local ephemeral key instead of generating one; for reproducible test vectors.
    /// Only valid before `initialize`.
    pub fn set_fixed_ephemeral(&mut self, ephemeral: KeyPair) -> Result<()> {
        self.ensure_uninitialized()?;
        if ephemeral.curve() != self.protocol.dh {
            return Err(Error::InvalidKey);
        }
        self.fixed_ephemeral = Some(ephemeral);
        Ok(())
    }

    fn ensure_uninitialized(&self) -> Result<()> {
        match self.phase {
            Phase::Uninitialized => Ok(()),
            _ => Err(Error::InvalidState),
        }
    }

    /// Starts the handshake: hashes the protocol name, the prologue and any pre-message static
    /// keys (initiator's first), and loads the pattern's message lines.
    ///
    /// A `remote_static` is only used when the pattern shares it before the first message; for
    /// patterns that transmit it, it is learned from the peer instead.
    pub fn initialize(
        &mut self,
        prologue: Option<&[u8]>,
        local_static: Option<KeyPair>,
        remote_static: Option<&[u8]>,
        psks: &[&[u8]],
    ) -> Result<()> {
        self.ensure_uninitialized()?;
        let suite = self.protocol.suite();

        if local_static
            .as_ref()
            .is_some_and(|kp| kp.curve() != self.protocol.dh)
        {
            return Err(Error::InvalidKey);
        }
        if remote_static.is_some_and(|rs| rs.len() != suite.dh.pub_len()) {
            return Err(Error::InvalidKey);
        }

        let psk_count = self.protocol.pattern.psk_count();
        if psks.len() < psk_count {
            return Err(Error::MissingPreSharedKey);
        }
        if psks.len() > psk_count {
            return Err(Error::InvalidPreSharedKey);
        }
        let psks = psks
            .iter()
            .map(|psk| {
                <[u8; PSK_LEN]>::try_from(*psk)
                    .map(Zeroizing::new)
                    .map_err(|_| Error::InvalidPreSharedKey)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut symm_state = SymmState::init(self.protocol.to_string().as_bytes(), suite);
        symm_state.mix_hash(prologue.unwrap_or_default());

        let base = self.protocol.pattern.base();
        let initiator = self.role == Role::Initiator;
        let remote_pre_shared = if initiator {
            base.responder_pre_shared()
        } else {
            base.initiator_pre_shared()
        };
        let local_pub = local_static.as_ref().map(KeyPair::public);
        for (pre_shared, ours) in [
            (base.initiator_pre_shared(), initiator),
            (base.responder_pre_shared(), !initiator),
        ] {
            if !pre_shared {
                continue;
            }
            let key = if ours {
                local_pub.ok_or(Error::MissingLocalKey)?
            } else {
                remote_static.ok_or(Error::MissingRemoteKey)?
            };
            symm_state.mix_hash(key);
        }

        let remote_static = match remote_static {
            Some(rs) if remote_pre_shared => Some(rs.to_vec()),
            Some(rs) => {
                warn!(
                    "{} does not pre-share the remote static key; ignoring {}",
                    self.protocol,
                    key_prefix(rs)
                );
                None
            }
            None => None,
        };

        self.message_patterns = self.protocol.pattern.message_lines().into();
        self.lines_done = 0;
        self.local_static = local_static;
        self.psks = psks;
        self.phase = Phase::Running(Progress {
            symm_state,
            local_ephemeral: None,
            remote_static,
            remote_ephemeral: None,
            next_psk: 0,
        });
        debug!(
            "initialized {} as {:?}, {} message lines",
            self.protocol,
            self.role,
            self.message_patterns.len()
        );
        Ok(())
    }

    /// Whose turn it is follows strictly from the message index: the initiator writes the even
    /// lines, the responder the odd ones.
    pub fn action(&self) -> Action {
        match self.phase {
            Phase::Uninitialized | Phase::Finished { .. } => Action::Failed,
            Phase::Running(_) if self.message_patterns.is_empty() => Action::Split,
            Phase::Running(_) => {
                let initiator_turn = self.lines_done % 2 == 0;
                if initiator_turn == (self.role == Role::Initiator) {
                    Action::WriteMessage
                } else {
                    Action::ReadMessage
                }
            }
        }
    }

    fn expect(&self, action: Action) -> Result<&Progress> {
        if self.action() != action {
            return Err(Error::InvalidState);
        }
        match &self.phase {
            Phase::Running(progress) => Ok(progress),
            _ => Err(Error::InvalidState),
        }
    }

    fn next_line(&self) -> Result<Vec<Token>> {
        self.message_patterns
            .front()
            .cloned()
            .ok_or(Error::InvalidState)
    }

    fn commit(&mut self, progress: Progress) {
        self.phase = Phase::Running(progress);
        self.message_patterns.pop_front();
        self.lines_done += 1;
    }

    /// Produces the next handshake message, carrying `payload` (encrypted if a key has been
    /// established by this point). On error the state is unchanged.
    pub fn write_message(&mut self, payload: Option<&[u8]>) -> Result<Bytes> {
        let mut scratch = self.expect(Action::WriteMessage)?.clone();
        let line = self.next_line()?;
        let mut buff = BytesMut::new();

        for token in line {
            trace!("{:?} writing token {token:?}", self.role);
            match token {
                Token::E => self.write_e(&mut scratch, &mut buff)?,
                Token::S => {
                    let local = self.local_static.as_ref().ok_or(Error::MissingLocalKey)?;
                    let ct = scratch.symm_state.encrypt_and_hash(local.public())?;
                    buff.extend_from_slice(&ct);
                }
                Token::Psk => self.mix_psk(&mut scratch)?,
                Token::Ee | Token::Es | Token::Se | Token::Ss => self.mix_dh(&mut scratch, token)?,
            }
        }

        let ct = scratch
            .symm_state
            .encrypt_and_hash(payload.unwrap_or_default())?;
        buff.extend_from_slice(&ct);
        if buff.len() > MAX_MESSAGE_LEN {
            return Err(Error::MessageTooLarge);
        }

        self.commit(scratch);
        debug!(
            "{:?} wrote handshake message {} ({} bytes)",
            self.role,
            self.lines_done,
            buff.len()
        );
        Ok(buff.freeze())
    }

    /// Consumes the peer's next handshake message and returns its decrypted payload.
    ///
    /// With `payload_auth_required`, a payload the peer could only send in the clear (no key yet
    /// established) is rejected with `UnauthenticatedPayload`. On error the state is unchanged,
    /// so a forged message can be dropped and the genuine one read afterwards.
    pub fn read_message(&mut self, message: &[u8], payload_auth_required: bool) -> Result<Bytes> {
        let mut scratch = self.expect(Action::ReadMessage)?.clone();
        if message.len() > MAX_MESSAGE_LEN {
            return Err(Error::InvalidMessage);
        }
        let line = self.next_line()?;
        let dh_len = self.protocol.suite().dh.pub_len();
        let mut buf = Bytes::copy_from_slice(message);

        for token in line {
            trace!("{:?} reading token {token:?}", self.role);
            match token {
                Token::E => {
                    let re = take(&mut buf, dh_len)?;
                    self.read_e(&mut scratch, &re)?;
                }
                Token::S => {
                    let tag = if scratch.symm_state.has_key() { TAG_LEN } else { 0 };
                    let field = take(&mut buf, dh_len + tag)?;
                    let rs = scratch.symm_state.decrypt_and_hash(&field)?;
                    debug!("{:?} learned remote static {}", self.role, key_prefix(&rs));
                    scratch.remote_static = Some(rs);
                }
                Token::Psk => self.mix_psk(&mut scratch)?,
                Token::Ee | Token::Es | Token::Se | Token::Ss => self.mix_dh(&mut scratch, token)?,
            }
        }

        if scratch.symm_state.has_key() {
            check_tag_room(&buf)?;
        } else if payload_auth_required {
            return Err(Error::UnauthenticatedPayload);
        }
        let payload = scratch.symm_state.decrypt_and_hash(&buf)?;

        self.commit(scratch);
        debug!(
            "{:?} read handshake message {} ({} bytes)",
            self.role,
            self.lines_done,
            message.len()
        );
        Ok(Bytes::from(payload))
    }

    /// Sends our ephemeral, generating it on first use.
    fn write_e(&mut self, scratch: &mut Progress, buff: &mut BytesMut) -> Result<()> {
        let ephemeral = match (&scratch.local_ephemeral, &self.fixed_ephemeral) {
            (Some(existing), _) => existing.clone(),
            (None, Some(fixed)) => fixed.clone(),
            (None, None) => KeyPair::generate_with_rng(self.protocol.dh, &mut *self.rng)?,
        };
        let my_pub = ephemeral.public();
        scratch.symm_state.mix_hash(my_pub);
        if self.protocol.pattern.has_psk() {
            scratch.symm_state.mix_key(my_pub)?;
        }
        buff.extend_from_slice(my_pub);
        scratch.local_ephemeral = Some(ephemeral);
        Ok(())
    }

    fn read_e(&self, scratch: &mut Progress, re: &[u8]) -> Result<()> {
        scratch.symm_state.mix_hash(re);
        if self.protocol.pattern.has_psk() {
            scratch.symm_state.mix_key(re)?;
        }
        scratch.remote_ephemeral = Some(re.to_vec());
        Ok(())
    }

    fn mix_psk(&self, scratch: &mut Progress) -> Result<()> {
        let psk = self
            .psks
            .get(scratch.next_psk)
            .ok_or(Error::MissingPreSharedKey)?;
        scratch.symm_state.mix_key_and_hash(psk.as_slice())?;
        scratch.next_psk += 1;
        Ok(())
    }

    /// Performs the DH named by `token` from this side's point of view and mixes the output into
    /// the chaining key.
    fn mix_dh(&self, scratch: &mut Progress, token: Token) -> Result<()> {
        let initiator = self.role == Role::Initiator;
        // (local key is ephemeral, remote key is ephemeral)
        let (local_e, remote_e) = match token {
            Token::Ee => (true, true),
            Token::Es => (initiator, !initiator),
            Token::Se => (!initiator, initiator),
            Token::Ss => (false, false),
            Token::E | Token::S | Token::Psk => return Err(Error::InvalidState),
        };

        let local = if local_e {
            scratch.local_ephemeral.as_ref()
        } else {
            self.local_static.as_ref()
        }
        .ok_or(Error::MissingLocalKey)?;
        let remote = if remote_e {
            scratch.remote_ephemeral.as_deref()
        } else {
            scratch.remote_static.as_deref()
        }
        .ok_or(Error::MissingRemoteKey)?;

        let shared = local.dh(remote)?;
        scratch.symm_state.mix_key(&shared)
    }

    /// Ends the handshake, returning this side's transport ciphers. The initiator's writer is the
    /// responder's reader and vice versa. Afterwards every other call fails with `InvalidState`.
    pub fn split(&mut self) -> Result<CipherPair> {
        let progress = self.expect(Action::Split)?;
        let pair = progress
            .symm_state
            .clone()
            .split_for(self.role == Role::Initiator)?;
        let handshake_hash = progress.symm_state.handshake_hash().to_vec();
        let remote_static = progress.remote_static.clone();

        self.phase = Phase::Finished {
            handshake_hash,
            remote_static,
        };
        self.psks.clear();
        self.fixed_ephemeral = None;
        debug!("{:?} split into transport mode", self.role);
        Ok(pair)
    }

    /// The transcript hash so far, frozen at its final value after `split`. Suitable for channel
    /// binding once the handshake is complete.
    pub fn handshake_hash(&self) -> Option<&[u8]> {
        match &self.phase {
            Phase::Uninitialized => None,
            Phase::Running(progress) => Some(progress.symm_state.handshake_hash()),
            Phase::Finished { handshake_hash, .. } => Some(handshake_hash),
        }
    }

    /// The peer's static public key, once known.
    pub fn remote_static(&self) -> Option<&[u8]> {
        match &self.phase {
            Phase::Uninitialized => None,
            Phase::Running(progress) => progress.remote_static.as_deref(),
            Phase::Finished { remote_static, .. } => remote_static.as_deref(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_initiator(&self) -> bool {
        self.role == Role::Initiator
    }

    pub fn protocol_name(&self) -> &ProtocolName {
        &self.protocol
    }
}
