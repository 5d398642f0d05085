//! Noise has strict rules about the nonce:
//! Reusing one under the same key is catastrophic, and the max value is reserved for rekeying.
//!
//! We use rusts type system to encapsulate these rules: the counter is never exposed mutably, and
//! only moves forward after a cipher operation has succeeded.

use zeroize::Zeroize;

use crate::error::{Error, Result};

#[derive(Zeroize, Eq, PartialEq)]
#[cfg_attr(test, derive(Debug))]
pub struct Nonce(u64);

impl Nonce {
    pub fn new() -> Self {
        Self(0)
    }

    /// The value that the next encrypt/decrypt will use.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Hands out the nonce for the next cipher operation without consuming it.
    ///
    /// Fails with `NonceOverflow` once the reserved max-value for u64 is reached; the counter can
    /// never wrap back to a used value.
    pub(crate) fn harvest(&self) -> Result<u64> {
        if self.0 == u64::MAX {
            return Err(Error::NonceOverflow);
        }
        Ok(self.0)
    }

    /// Moves past the nonce handed out by the last `harvest`. Call only after the operation
    /// using it succeeded.
    pub(crate) fn advance(&mut self) {
        debug_assert!(self.0 < u64::MAX);
        self.0 = self.0.saturating_add(1);
    }

    pub(crate) fn duplicate(&self) -> Self {
        Self(self.0)
    }

    #[cfg(test)]
    pub(crate) fn at(value: u64) -> Self {
        Self(value)
    }
}

impl Default for Nonce {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic_inc() {
        let mut nonce = Nonce::new();
        assert_eq!(0, nonce.harvest().unwrap());
        nonce.advance();
        assert_eq!(1, nonce.harvest().unwrap());
        nonce.advance();
        nonce.advance();
        assert_eq!(3, nonce.value());
    }

    #[test]
    fn harvest_does_not_advance() {
        let nonce = Nonce::at(41);
        assert_eq!(41, nonce.harvest().unwrap());
        assert_eq!(41, nonce.harvest().unwrap());
    }

    #[test]
    fn final_inc() {
        let mut nonce = Nonce::at(u64::MAX - 1);
        assert_eq!(u64::MAX - 1, nonce.harvest().unwrap());
        nonce.advance();
        assert_eq!(Err(Error::NonceOverflow), nonce.harvest());
    }

    #[test]
    fn max_is_reserved() {
        let nonce = Nonce::at(u64::MAX);
        assert_eq!(Err(Error::NonceOverflow), nonce.harvest());
    }
}
