//! Classification of errors that must never be retried.
//!
//! The driver asks a classifier before consulting the retryer. Errors it
//! reports as permanent are returned at once. The default classifier,
//! [`is_unknown_authority`], recognises a single condition: the peer's TLS
//! certificate was signed by an authority the local trust store does not
//! know (typically missing CA certificates). Many other transport failures
//! are transient and left to the retryer.

use std::error::Error;

/// Message fragments emitted by TLS stacks when the issuing authority of a
/// peer certificate is unknown.
const UNKNOWN_AUTHORITY_MARKERS: &[&str] = &[
    // Go crypto/x509 `UnknownAuthorityError`
    "certificate signed by unknown authority",
    // rustls `CertificateError::UnknownIssuer`
    "UnknownIssuer",
    // OpenSSL verify error 20 (`X509_V_ERR_UNABLE_TO_GET_ISSUER_CERT_LOCALLY`)
    "unable to get local issuer certificate",
];

/// Returns `true` if `error`, or any error in its `source()` chain, reports a
/// certificate signed by an unknown authority.
///
/// # Examples
///
/// ```rust
/// use retry_backoff::classify::is_unknown_authority;
/// use std::io;
///
/// let err = io::Error::other("x509: certificate signed by unknown authority");
/// assert!(is_unknown_authority(&err));
///
/// let err = io::Error::other("connection reset by peer");
/// assert!(!is_unknown_authority(&err));
/// ```
pub fn is_unknown_authority(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let message = err.to_string();
        if UNKNOWN_AUTHORITY_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
        {
            return true;
        }
        current = err.source();
    }
    false
}

/// A classifier that treats every error as transient.
pub fn never_permanent<E: ?Sized>(_error: &E) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::io;

    #[derive(Debug)]
    struct Handshake {
        source: io::Error,
    }

    impl fmt::Display for Handshake {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "tls handshake failed")
        }
    }

    impl Error for Handshake {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn test_matches_top_level_message() {
        let err = io::Error::other("x509: certificate signed by unknown authority");
        assert!(is_unknown_authority(&err));
    }

    #[test]
    fn test_matches_in_source_chain() {
        let err = Handshake {
            source: io::Error::other("invalid peer certificate: UnknownIssuer"),
        };
        assert!(is_unknown_authority(&err));
    }

    #[test]
    fn test_matches_each_tls_stack() {
        for message in [
            "tls: failed to verify certificate: x509: certificate signed by unknown authority",
            "invalid peer certificate: UnknownIssuer",
            "certificate verify failed (unable to get local issuer certificate)",
        ] {
            assert!(is_unknown_authority(&io::Error::other(message)), "{message}");
        }
    }

    #[test]
    fn test_transient_errors_not_permanent() {
        for message in ["connection refused", "deadline exceeded", "503 unavailable"] {
            assert!(!is_unknown_authority(&io::Error::other(message)));
        }
    }

    #[test]
    fn test_never_permanent() {
        let err = io::Error::other("x509: certificate signed by unknown authority");
        assert!(!never_permanent(&err));
    }
}
