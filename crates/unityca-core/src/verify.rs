//! Signature verification seam
//!
//! Verification is an external capability (in production, `ssh-keygen -Y
//! verify` run as a subprocess). The trait keeps the protocol logic
//! independent of how the primitive is provided, and lets tests substitute
//! a deterministic verifier.

use async_trait::async_trait;

use crate::error::Result;

/// Identity-based signature verification primitive.
///
/// `verify` decides whether `signature` (armored) was produced over
/// `message` by `public_key`, scoped to `identity` and the given allowed
/// namespaces. A clean "no" is `Ok(false)`; `Err` means the primitive
/// itself could not be invoked.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(
        &self,
        message: &str,
        signature: &str,
        public_key: &str,
        identity: &str,
        namespaces: &[String],
    ) -> Result<bool>;
}

/// Build the one-line allowed-signers record for a verification call:
/// the identity followed by the key's algorithm and base64 body, with any
/// trailing comment stripped. Newline-terminated.
pub fn allowed_signers_line(identity: &str, public_key: &str) -> String {
    let key_tokens: Vec<&str> = public_key.split_whitespace().take(2).collect();
    format!("{} {}\n", identity, key_tokens.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_signers_strips_comment() {
        let line = allowed_signers_line(
            "unityca-1700000000000@db.example.com",
            "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFoo root@db",
        );
        assert_eq!(
            line,
            "unityca-1700000000000@db.example.com ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFoo\n"
        );
    }

    #[test]
    fn test_allowed_signers_without_comment() {
        let line = allowed_signers_line("id@host", "ssh-ed25519 AAAAbm9jb21tZW50");
        assert_eq!(line, "id@host ssh-ed25519 AAAAbm9jb21tZW50\n");
    }
}
