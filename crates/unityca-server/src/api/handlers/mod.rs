//! API request handlers

pub mod keys;
pub mod revoked;
pub mod rotate;

use std::sync::Arc;

use unityca_core::{RevocationStore, RotationService, SignatureVerifier};

use crate::config::CaConfig;

/// Application state shared across handlers
pub struct AppState {
    /// Rotation pipeline: reconcile + issue over the host key store
    pub service: RotationService,
    /// Signature verification primitive for request authentication
    pub verifier: Arc<dyn SignatureVerifier>,
    /// Revocation directory read path
    pub revocations: RevocationStore,
    /// Process-wide configuration
    pub config: CaConfig,
}

pub use keys::{host_ca_key, user_ca_key};
pub use revoked::list_revoked;
pub use rotate::rotate_host_key;
