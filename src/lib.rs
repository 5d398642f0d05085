//! Noise Protocol Framework handshakes and transport encryption.
//!
//! A [`HandshakeState`] runs one side of a handshake. Once it reports [`Action::Split`] it hands
//! back a [`CipherPair`] for transport messages.

/// Builder for configured handshakes.
pub mod builder;
/// One each during the handshake. During transport, each party has one for sending and one for
/// receiving.
pub mod cipher_state;
pub mod error;
/// Contains a symmetric state, plus the DH keys and the remaining message lines.
/// Consumed by `split` once the handshake is complete.
pub mod hs_state;
pub mod keypair;
pub mod nonce;
pub mod pattern;
/// DH, AEAD and hash functions behind the names a protocol string can carry.
pub mod primitives;
pub mod protocol;
/// Contains cipher_state + ck and h variables. Each party's sole symm_state encapsulates the
/// "symmetric cryptography" used by Noise.
pub mod symm_state;

pub use builder::Builder;
pub use cipher_state::{CipherPair, CipherState};
pub use error::{Error, Result};
pub use hs_state::{Action, HandshakeState, Role, MAX_MESSAGE_LEN, PSK_LEN};
pub use keypair::{generate_keypair, KeyPair};
pub use pattern::{HandshakePattern, Pattern, Token};
pub use primitives::CryptoSuite;
pub use protocol::{CipherChoice, DhChoice, HashChoice, ProtocolName};
