//! ssh-keygen subprocess adapter
//!
//! Provides both capability traits of the core crate by shelling out to
//! `ssh-keygen`: `-Y verify` for identity-based signature verification
//! and `-s` for host certificate signing. Inputs the tool must read by
//! path (the armored signature and the allowed-signers record) are staged
//! in a temporary directory that is removed on every exit path; the
//! message is streamed over stdin. Every invocation is bounded by the
//! configured timeout, and a timed-out child is killed rather than left
//! behind.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::debug;

use unityca_core::{allowed_signers_line, CertificateSigner, Result, RotationError, SignatureVerifier};

/// `ssh-keygen`-backed verifier and signer.
pub struct SshKeygen {
    host_ca_key: PathBuf,
    validity: String,
    timeout: Duration,
}

impl SshKeygen {
    pub fn new(host_ca_key: impl Into<PathBuf>, validity: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host_ca_key: host_ca_key.into(),
            validity: validity.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SignatureVerifier for SshKeygen {
    async fn verify(
        &self,
        message: &str,
        signature: &str,
        public_key: &str,
        identity: &str,
        namespaces: &[String],
    ) -> Result<bool> {
        let staging = tempfile::tempdir()?;
        let sig_path = staging.path().join("signature");
        let signers_path = staging.path().join("allowed_signers");

        tokio::fs::write(&sig_path, signature).await?;
        tokio::fs::write(&signers_path, allowed_signers_line(identity, public_key)).await?;

        let child = Command::new("ssh-keygen")
            .arg("-Y")
            .arg("verify")
            .arg("-n")
            .arg(namespaces.join(","))
            .arg("-s")
            .arg(&sig_path)
            .arg("-I")
            .arg(identity)
            .arg("-f")
            .arg(&signers_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RotationError::Subprocess(format!("spawn ssh-keygen -Y verify: {}", e)))?;

        let output = feed_and_wait(child, message, self.timeout).await?;

        if !output.status.success() {
            debug!(
                identity,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "signature verification failed"
            );
        }

        Ok(output.status.success())
    }
}

/// Stream `message` to the child's stdin and collect its output, with the
/// entire exchange bounded by `bound`. The write sits inside the timeout:
/// a child that never reads stdin would otherwise block the caller once
/// the message outgrows the pipe buffer.
async fn feed_and_wait(
    mut child: Child,
    message: &str,
    bound: Duration,
) -> Result<std::process::Output> {
    timeout(bound, async {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RotationError::Subprocess("child stdin unavailable".into()))?;
        stdin
            .write_all(message.as_bytes())
            .await
            .map_err(|e| RotationError::Subprocess(format!("write message to child: {}", e)))?;
        drop(stdin);

        child
            .wait_with_output()
            .await
            .map_err(|e| RotationError::Subprocess(format!("collect child output: {}", e)))
    })
    .await
    .map_err(|_| RotationError::Subprocess("ssh-keygen -Y verify timed out".into()))?
}

#[async_trait]
impl CertificateSigner for SshKeygen {
    async fn sign_host_key(&self, key_path: &Path, identity: &str, principals: &str) -> Result<()> {
        let output = timeout(
            self.timeout,
            Command::new("ssh-keygen")
                .arg("-h")
                .arg("-s")
                .arg(&self.host_ca_key)
                .arg("-I")
                .arg(identity)
                .arg("-n")
                .arg(principals)
                .arg("-V")
                .arg(&self.validity)
                .arg(key_path)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| RotationError::SigningFailure("ssh-keygen signing timed out".into()))?
        .map_err(|e| RotationError::SigningFailure(format!("spawn ssh-keygen -s: {}", e)))?;

        if !output.status.success() {
            return Err(RotationError::SigningFailure(format!(
                "ssh-keygen exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
