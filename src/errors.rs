use thiserror::Error;

/// Failure taxonomy for the token rotation protocol.
///
/// `Configuration` is only produced at startup; everything else is
/// per-request. The HTTP layer collapses the per-request variants into
/// opaque status codes so callers cannot distinguish an expired session
/// from a replayed or malformed token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or unusable signing key. Fatal at boot, never per-request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Signature, claim shape, algorithm, or cross-binding failure.
    /// Always client-caused; never retried.
    #[error("token failed verification")]
    InvalidToken,

    /// The session identifier is retired or never existed. The client
    /// must obtain a fresh pair through the issue endpoint.
    #[error("session is not live")]
    SessionExpired,

    /// Registry I/O failure. Possibly transient; surfaced to the caller
    /// as an internal error without automatic retry.
    #[error("session registry failure")]
    Storage(#[source] anyhow::Error),
}

impl AuthError {
    pub(crate) fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AuthError::Storage(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keeps_source() {
        let err = AuthError::storage(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "connect timeout",
        ));
        assert!(matches!(err, AuthError::Storage(_)));
        let source = std::error::Error::source(&err);
        assert!(source.is_some());
    }

    #[test]
    fn test_display_does_not_leak_detail() {
        // Per-request variants render a fixed message; the registry source
        // is only reachable through Error::source for logging.
        assert_eq!(AuthError::InvalidToken.to_string(), "token failed verification");
        assert_eq!(AuthError::SessionExpired.to_string(), "session is not live");
    }
}
