//! Certificate issuance orchestration
//!
//! Runs only after the trust reconciler has accepted a rotation: persists
//! the new key, has the external CA primitive sign it, cleans up files
//! superseded by a differently-named key, and mirrors the result to every
//! alias the certificate covers.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::error::{Result, RotationError};
use crate::request::RotationRequest;
use crate::store::HostKeyStore;

/// External CA signing primitive.
///
/// Given a public key file on disk, produces the adjacent certificate file
/// (`X.pub` → `X-cert.pub`). The validity window and the CA key are the
/// implementation's own configuration; the key ID and principal list vary
/// per request.
#[async_trait]
pub trait CertificateSigner: Send + Sync {
    async fn sign_host_key(&self, key_path: &Path, identity: &str, principals: &str) -> Result<()>;
}

/// Issue a certificate for an accepted rotation and return its bytes.
///
/// The canonical hostname is written and signed first; every alias then
/// receives a mirrored copy of the key and certificate, with stale-path
/// cleanup applied independently per alias. A signing failure returns
/// before any alias is touched, and never leaves the canonical key file
/// silently paired with a missing certificate.
pub async fn grant(
    req: &RotationRequest,
    store: &HostKeyStore,
    signer: &dyn CertificateSigner,
) -> Result<Vec<u8>> {
    let canonical = req.hostname();
    let key_new = store.key_path(canonical, req.key_type());
    let key_old = store.key_path(canonical, req.old_key_type());
    let cert_new = store.cert_path(canonical, req.key_type());
    let cert_old = store.cert_path(canonical, req.old_key_type());

    store.write_staged(&key_new, req.new_pubkey().as_bytes()).await?;

    signer
        .sign_host_key(&key_new, req.identity(), &req.principals())
        .await?;

    // A signer that reported success without producing the certificate
    // file is still a signing failure; the new key must not end up
    // enrolled without a readable certificate beside it.
    let certificate = fs::read(&cert_new).await.map_err(|e| {
        RotationError::SigningFailure(format!(
            "signer produced no certificate at {}: {}",
            cert_new.display(),
            e
        ))
    })?;

    if key_old != key_new {
        store.remove_stale(&key_old).await?;
    }
    if cert_old != cert_new {
        store.remove_stale(&cert_old).await?;
    }

    for alias in req.aliases() {
        let alias_key_new = store.key_path(alias, req.key_type());
        let alias_key_old = store.key_path(alias, req.old_key_type());
        let alias_cert_new = store.cert_path(alias, req.key_type());
        let alias_cert_old = store.cert_path(alias, req.old_key_type());

        store.copy_staged(&key_new, &alias_key_new).await?;
        store.copy_staged(&cert_new, &alias_cert_new).await?;

        if alias_key_old != alias_key_new {
            store.remove_stale(&alias_key_old).await?;
        }
        if alias_cert_old != alias_cert_new {
            store.remove_stale(&alias_cert_old).await?;
        }
    }

    info!(
        hostname = %canonical,
        identity = %req.identity(),
        aliases = req.aliases().len(),
        "issued host certificate"
    );

    Ok(certificate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::SignatureVerifier;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const NEW_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIJnew host";
    const OLD_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIJold host";

    struct AcceptAll;

    #[async_trait]
    impl SignatureVerifier for AcceptAll {
        async fn verify(&self, _: &str, _: &str, _: &str, _: &str, _: &[String]) -> Result<bool> {
            Ok(true)
        }
    }

    /// Signer that writes a deterministic certificate next to the key and
    /// records what it was asked to sign.
    struct FakeSigner {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeSigner {
        fn new() -> Self {
            Self { calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl CertificateSigner for FakeSigner {
        async fn sign_host_key(&self, key_path: &Path, identity: &str, principals: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((identity.to_string(), principals.to_string()));
            let key = std::fs::read_to_string(key_path)?;
            let cert_path = key_path.with_file_name(
                key_path
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .replace("_key.pub", "_key-cert.pub"),
            );
            std::fs::write(cert_path, format!("cert-for[{}]", key.trim()))?;
            Ok(())
        }
    }

    /// Signer that claims success but writes nothing.
    struct VanishingSigner;

    #[async_trait]
    impl CertificateSigner for VanishingSigner {
        async fn sign_host_key(&self, _: &Path, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    async fn request(hostnames: &str) -> RotationRequest {
        let body = format!(
            "{}\n1700000000000\n{}\n{}\n\nc2ln\nc2ln",
            hostnames, NEW_KEY, OLD_KEY
        );
        RotationRequest::parse(&body, &AcceptAll).await.unwrap()
    }

    #[tokio::test]
    async fn test_grant_writes_key_and_returns_certificate() {
        let dir = TempDir::new().unwrap();
        let store = HostKeyStore::new(dir.path());
        let signer = FakeSigner::new();
        let req = request("db.example.com").await;

        let cert = grant(&req, &store, &signer).await.unwrap();

        assert_eq!(cert, format!("cert-for[{}]", NEW_KEY).into_bytes());
        assert_eq!(
            store.current_key("db.example.com", "ed25519").await.unwrap(),
            Some(NEW_KEY.to_string())
        );
    }

    #[tokio::test]
    async fn test_signer_sees_identity_and_full_principal_list() {
        let dir = TempDir::new().unwrap();
        let store = HostKeyStore::new(dir.path());
        let signer = FakeSigner::new();
        let req = request("a.example.com,b.example.com").await;

        grant(&req, &store, &signer).await.unwrap();

        let calls = signer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "unityca-1700000000000@a.example.com");
        assert_eq!(calls[0].1, "a.example.com,b.example.com");
    }

    #[tokio::test]
    async fn test_aliases_receive_mirrored_key_and_certificate() {
        let dir = TempDir::new().unwrap();
        let store = HostKeyStore::new(dir.path());
        let signer = FakeSigner::new();
        let req = request("a.example.com,b.example.com,c.example.com").await;

        let cert = grant(&req, &store, &signer).await.unwrap();

        for alias in ["b.example.com", "c.example.com"] {
            assert_eq!(
                store.current_key(alias, "ed25519").await.unwrap(),
                Some(NEW_KEY.to_string()),
                "alias {}",
                alias
            );
            let alias_cert = std::fs::read(store.cert_path(alias, "ed25519")).unwrap();
            assert_eq!(alias_cert, cert, "alias {}", alias);
        }
    }

    #[tokio::test]
    async fn test_missing_certificate_is_a_signing_failure() {
        let dir = TempDir::new().unwrap();
        let store = HostKeyStore::new(dir.path());
        let req = request("db.example.com,alias.example.com").await;

        let err = grant(&req, &store, &VanishingSigner).await.unwrap_err();

        assert!(matches!(err, RotationError::SigningFailure(_)));
        // No alias mirroring happens after a signing failure.
        assert!(store.current_key("alias.example.com", "ed25519").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repeat_grant_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let store = HostKeyStore::new(dir.path());
        let signer = FakeSigner::new();
        let req = request("db.example.com").await;

        let first = grant(&req, &store, &signer).await.unwrap();
        let second = grant(&req, &store, &signer).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_same_algorithm_rotation_keeps_shared_paths() {
        // Old and new key types coincide, so the "stale" paths are the
        // live paths and must survive the cleanup step.
        let dir = TempDir::new().unwrap();
        let store = HostKeyStore::new(dir.path());
        let signer = FakeSigner::new();
        let req = request("db.example.com").await;

        grant(&req, &store, &signer).await.unwrap();

        assert!(store.key_path("db.example.com", "ed25519").exists());
        assert!(store.cert_path("db.example.com", "ed25519").exists());
    }
}
