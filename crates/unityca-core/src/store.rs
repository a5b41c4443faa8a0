//! On-disk host key records
//!
//! Durable state is the filesystem: one directory per hostname under the
//! hosts root, holding the current public key
//! (`ssh_host_<type>_key.pub`), its certificate
//! (`ssh_host_<type>_key-cert.pub`), and on rejected rotations a
//! `.pub.proposed` side file for operator review.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::error::Result;

/// Filesystem layout for per-hostname key material.
#[derive(Debug, Clone)]
pub struct HostKeyStore {
    root: PathBuf,
}

impl HostKeyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a host's public key file for the given algorithm.
    pub fn key_path(&self, hostname: &str, key_type: &str) -> PathBuf {
        self.root
            .join(hostname)
            .join(format!("ssh_host_{}_key.pub", key_type))
    }

    /// Path of the certificate adjacent to a key file (`X.pub` →
    /// `X-cert.pub`).
    pub fn cert_path(&self, hostname: &str, key_type: &str) -> PathBuf {
        self.root
            .join(hostname)
            .join(format!("ssh_host_{}_key-cert.pub", key_type))
    }

    /// Path of the proposed-key side file left behind by a rejected
    /// rotation.
    pub fn proposed_path(&self, hostname: &str, key_type: &str) -> PathBuf {
        self.root
            .join(hostname)
            .join(format!("ssh_host_{}_key.pub.proposed", key_type))
    }

    /// The current on-file public key for a hostname, trimmed, or `None`
    /// when the host has never been enrolled under this algorithm.
    pub async fn current_key(&self, hostname: &str, key_type: &str) -> Result<Option<String>> {
        let path = self.key_path(hostname, key_type);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Record a rejected rotation's new key for operator review. Does not
    /// touch the live key file.
    pub async fn record_proposed(&self, hostname: &str, key_type: &str, pubkey: &str) -> Result<()> {
        let path = self.proposed_path(hostname, key_type);
        self.write_staged(&path, pubkey.as_bytes()).await?;
        info!(hostname, path = %path.display(), "recorded proposed key for operator review");
        Ok(())
    }

    /// Write a file atomically with respect to readers: stage into a
    /// sibling temp file, then rename over the target. Creates the host
    /// directory on first use.
    pub async fn write_staged(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let staged = staging_path(path);
        fs::write(&staged, contents).await?;
        fs::rename(&staged, path).await?;
        Ok(())
    }

    /// Copy one record file over another via the same staged-rename path.
    pub async fn copy_staged(&self, from: &Path, to: &Path) -> Result<()> {
        let contents = fs::read(from).await?;
        self.write_staged(to, &contents).await
    }

    /// Remove a superseded file; missing files are fine.
    pub async fn remove_stale(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
