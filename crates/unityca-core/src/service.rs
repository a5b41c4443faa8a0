//! Rotation service
//!
//! Ties the reconciler and the issuance orchestrator together under a
//! per-hostname lock, so concurrent rotations for the same canonical
//! hostname cannot interleave their file writes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Result, RotationError};
use crate::issue::{grant, CertificateSigner};
use crate::reconcile::acceptable;
use crate::request::RotationRequest;
use crate::store::HostKeyStore;

/// Processes authenticated rotation requests against the host key store.
pub struct RotationService {
    store: HostKeyStore,
    signer: Arc<dyn CertificateSigner>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RotationService {
    pub fn new(store: HostKeyStore, signer: Arc<dyn CertificateSigner>) -> Self {
        Self {
            store,
            signer,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &HostKeyStore {
        &self.store
    }

    /// Apply an authenticated rotation: reconcile against on-disk state,
    /// then issue. On rejection the proposed key is recorded for operator
    /// review and `KeyConflict` is returned; no live key or certificate
    /// changes.
    ///
    /// Reconciliation and issuance run under a lock keyed by the canonical
    /// hostname, making the check-then-write sequence atomic per host.
    pub async fn process(&self, req: &RotationRequest) -> Result<Vec<u8>> {
        let lock = self.lock_for(req.hostname()).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.rotate(req).await
        };
        self.release(req.hostname(), lock).await;
        outcome
    }

    async fn rotate(&self, req: &RotationRequest) -> Result<Vec<u8>> {
        if !acceptable(req, &self.store).await? {
            self.store
                .record_proposed(req.hostname(), req.key_type(), req.new_pubkey())
                .await?;
            return Err(RotationError::KeyConflict {
                hostname: req.hostname().to_string(),
            });
        }

        let certificate = grant(req, &self.store, self.signer.as_ref()).await?;

        info!(hostname = %req.hostname(), "rotation applied");
        Ok(certificate)
    }

    async fn lock_for(&self, hostname: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(hostname.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map entry for `hostname` once no task holds a clone of
    /// its lock. Clones are only handed out under the map lock, so a
    /// strong count of one here means the map holds the last reference.
    async fn release(&self, hostname: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks.get(hostname).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(hostname);
        }
    }
}
