use thiserror::Error;

/// Everything that can go wrong while parsing a protocol name, running a handshake, or using the
/// transport ciphers.
///
/// `InvalidState`, `MissingRemoteKey` and `MissingLocalKey` mean the caller drove the state
/// machine wrongly; retrying the same call will fail the same way. `AuthenticationFailure` means
/// the received bytes were forged or corrupted. `NonceOverflow` is terminal for the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid protocol name: {0}")]
    InvalidProtocolName(String),

    #[error("operation not permitted in the current handshake state")]
    InvalidState,

    #[error("pattern requires a remote public key that is not known")]
    MissingRemoteKey,

    #[error("pattern requires a local key pair that was not provided")]
    MissingLocalKey,

    #[error("pattern requires a pre-shared key that was not provided")]
    MissingPreSharedKey,

    #[error("pre-shared keys must be exactly 32 bytes and match the pattern's psk tokens")]
    InvalidPreSharedKey,

    #[error("key material has the wrong length or is not valid for the curve")]
    InvalidKey,

    #[error("authentication tag did not verify")]
    AuthenticationFailure,

    #[error("nonce space exhausted; the session must be torn down")]
    NonceOverflow,

    #[error("secure random source unavailable")]
    RandomSourceUnavailable,

    #[error("malformed handshake message")]
    InvalidMessage,

    #[error("message exceeds the 65535 byte limit")]
    MessageTooLarge,

    #[error("payload was required to be authenticated but was sent in the clear")]
    UnauthenticatedPayload,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_carries_protocol_name() {
        let err = Error::InvalidProtocolName("Noise_ZZ".into());
        assert_eq!(err.to_string(), "invalid protocol name: Noise_ZZ");
    }
}
