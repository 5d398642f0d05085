//! Handshake patterns and the tokens they are written in.

use std::fmt;

use crate::error::{Error, Result};

/// One cryptographic step of a handshake message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// Ephemeral public key, sent in the clear
    E,
    /// Static public key, encrypted once a key is available
    S,
    /// DH between both ephemerals
    Ee,
    /// DH between the initiator's ephemeral and the responder's static
    Es,
    /// DH between the initiator's static and the responder's ephemeral
    Se,
    /// DH between both statics
    Ss,
    /// Mix in the next pre-shared key
    Psk,
}

/// Fundamental patterns key:
/// # First character
/// N: **N**o static key for initiator
/// K: Static key for initiator **K**nown to responder
/// X: Static key for initiator **X**mitted to responder
/// I: Static key for initiator **I**mmediately transmitted to responder, despite reduced or absent ID
/// hiding
///
/// # Second character
/// N: **N**o static key for responder
/// K: Static key for responder **K**nown to initiator
/// X: Static key for responder **X**mitted to initiator
///
/// Single character patterns are one-way: only the initiator ever sends.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Pattern {
    N,
    K,
    X,
    NN,
    NK,
    NX,
    KN,
    KK,
    KX,
    XN,
    XK,
    XX,
    IN,
    IK,
    IX,
}

const ALL: [Pattern; 15] = [
    Pattern::N,
    Pattern::K,
    Pattern::X,
    Pattern::NN,
    Pattern::NK,
    Pattern::NX,
    Pattern::KN,
    Pattern::KK,
    Pattern::KX,
    Pattern::XN,
    Pattern::XK,
    Pattern::XX,
    Pattern::IN,
    Pattern::IK,
    Pattern::IX,
];

impl Pattern {
    pub fn all() -> &'static [Pattern] {
        &ALL
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pattern::N => "N",
            Pattern::K => "K",
            Pattern::X => "X",
            Pattern::NN => "NN",
            Pattern::NK => "NK",
            Pattern::NX => "NX",
            Pattern::KN => "KN",
            Pattern::KK => "KK",
            Pattern::KX => "KX",
            Pattern::XN => "XN",
            Pattern::XK => "XK",
            Pattern::XX => "XX",
            Pattern::IN => "IN",
            Pattern::IK => "IK",
            Pattern::IX => "IX",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|p| p.name() == name)
    }

    pub fn is_one_way(&self) -> bool {
        matches!(self, Pattern::N | Pattern::K | Pattern::X)
    }

    /// Whether the initiator's static key is known to the responder before the first message.
    pub(crate) fn initiator_pre_shared(&self) -> bool {
        matches!(self, Pattern::K | Pattern::KN | Pattern::KK | Pattern::KX)
    }

    /// Whether the responder's static key is known to the initiator before the first message.
    pub(crate) fn responder_pre_shared(&self) -> bool {
        matches!(
            self,
            Pattern::N | Pattern::K | Pattern::X | Pattern::NK | Pattern::KK | Pattern::XK | Pattern::IK
        )
    }

    fn make_sequence(&self) -> Vec<Vec<Token>> {
        use Token::*;
        match self {
            Pattern::N => vec![vec![E, Es]],
            Pattern::K => vec![vec![E, Es, Ss]],
            Pattern::X => vec![vec![E, Es, S, Ss]],
            Pattern::NN => vec![vec![E], vec![E, Ee]],
            Pattern::NK => vec![vec![E, Es], vec![E, Ee]],
            Pattern::NX => vec![vec![E], vec![E, Ee, S, Es]],
            Pattern::KN => vec![vec![E], vec![E, Ee, Se]],
            Pattern::KK => vec![vec![E, Es, Ss], vec![E, Ee, Se]],
            Pattern::KX => vec![vec![E], vec![E, Ee, Se, S, Es]],
            Pattern::XN => vec![vec![E], vec![E, Ee], vec![S, Se]],
            Pattern::XK => vec![vec![E, Es], vec![E, Ee], vec![S, Se]],
            Pattern::XX => vec![vec![E], vec![E, Ee, S, Es], vec![S, Se]],
            Pattern::IN => vec![vec![E, S], vec![E, Ee, Se]],
            Pattern::IK => vec![vec![E, Es, S, Ss], vec![E, Ee, Se]],
            Pattern::IX => vec![vec![E, S], vec![E, Ee, Se, S, Es]],
        }
    }
}

/// A fundamental pattern plus its `pskN` modifiers, e.g. `XKpsk3` or `NNpsk0+psk2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakePattern {
    base: Pattern,
    psk_positions: Vec<usize>,
}

impl HandshakePattern {
    pub fn new(base: Pattern) -> Self {
        Self {
            base,
            psk_positions: Vec::new(),
        }
    }

    /// Adds a `pskN` modifier. `psk0` goes at the start of the first message, `pskN` at the end
    /// of message N. Modifiers must be given in ascending order.
    pub fn with_psk(mut self, position: usize) -> Result<Self> {
        let lines = self.base.make_sequence().len();
        let ascending = self.psk_positions.last().map_or(true, |&last| last < position);
        if position > lines || !ascending {
            return Err(Error::InvalidProtocolName(format!(
                "{}psk{position}",
                self.base.name()
            )));
        }
        self.psk_positions.push(position);
        Ok(self)
    }

    /// Parses the pattern section of a protocol name.
    pub fn parse(text: &str) -> Result<Self> {
        let bad = || Error::InvalidProtocolName(text.to_owned());
        let split = text
            .find(|c: char| !c.is_ascii_uppercase())
            .unwrap_or(text.len());
        let (base, modifiers) = text.split_at(split);
        let mut pattern = Self::new(Pattern::from_name(base).ok_or_else(bad)?);
        if modifiers.is_empty() {
            return Ok(pattern);
        }
        for modifier in modifiers.split('+') {
            let position = modifier
                .strip_prefix("psk")
                .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|digits| digits.parse().ok())
                .ok_or_else(bad)?;
            pattern = pattern.with_psk(position).map_err(|_| bad())?;
        }
        Ok(pattern)
    }

    pub fn base(&self) -> Pattern {
        self.base
    }

    pub fn has_psk(&self) -> bool {
        !self.psk_positions.is_empty()
    }

    pub fn psk_count(&self) -> usize {
        self.psk_positions.len()
    }

    /// The ordered message lines, psk tokens included. Line `i` is sent by the initiator when `i`
    /// is even.
    pub fn message_lines(&self) -> Vec<Vec<Token>> {
        let mut lines = self.base.make_sequence();
        for &position in &self.psk_positions {
            match position {
                0 => lines[0].insert(0, Token::Psk),
                n => lines[n - 1].push(Token::Psk),
            }
        }
        lines
    }
}

impl fmt::Display for HandshakePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.name())?;
        for (i, position) in self.psk_positions.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "psk{position}")?;
        }
        Ok(())
    }
}
