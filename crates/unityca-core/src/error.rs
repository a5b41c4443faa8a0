//! Error types for the rotation protocol

use thiserror::Error;

/// Result type alias using RotationError
pub type Result<T> = std::result::Result<T, RotationError>;

/// Which of the two rotation signatures failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySlot {
    /// The replacement key being enrolled
    New,
    /// The key currently trusted for the host
    Old,
}

impl std::fmt::Display for KeySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySlot::New => write!(f, "newkey"),
            KeySlot::Old => write!(f, "oldkey"),
        }
    }
}

/// Errors that can occur while processing a key rotation
#[derive(Error, Debug)]
pub enum RotationError {
    /// Structural or format violation in the request body
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// A key algorithm other than the single supported one
    #[error("unsupported algorithm: {0} (only ed25519 supported)")]
    UnsupportedAlgorithm(String),

    /// One of the two rotation signatures failed verification
    #[error("invalid {0} signature")]
    InvalidSignature(KeySlot),

    /// The presented keys do not match what is on file for some hostname
    #[error("public key does not match existing key on file for '{hostname}'")]
    KeyConflict { hostname: String },

    /// The external signer failed to produce a certificate
    #[error("certificate signing failed: {0}")]
    SigningFailure(String),

    /// The external verification or signing primitive could not be invoked
    #[error("subprocess failure: {0}")]
    Subprocess(String),

    /// Filesystem error on the host key store
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RotationError {
    /// Whether this error is the caller's fault (as opposed to a server-side
    /// failure). Client errors never leave mutated live state behind, with
    /// the single exception of the proposed-key side file on `KeyConflict`.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RotationError::MalformedRequest(_)
                | RotationError::UnsupportedAlgorithm(_)
                | RotationError::InvalidSignature(_)
                | RotationError::KeyConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(RotationError::MalformedRequest("x".into()).is_client_error());
        assert!(RotationError::UnsupportedAlgorithm("rsa".into()).is_client_error());
        assert!(RotationError::InvalidSignature(KeySlot::New).is_client_error());
        assert!(RotationError::KeyConflict { hostname: "a".into() }.is_client_error());

        assert!(!RotationError::SigningFailure("boom".into()).is_client_error());
        assert!(!RotationError::Subprocess("spawn".into()).is_client_error());
    }

    #[test]
    fn test_invalid_signature_names_slot() {
        let new = RotationError::InvalidSignature(KeySlot::New).to_string();
        let old = RotationError::InvalidSignature(KeySlot::Old).to_string();
        assert!(new.contains("newkey"));
        assert!(old.contains("oldkey"));
        assert_ne!(new, old);
    }
}
