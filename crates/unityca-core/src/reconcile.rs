//! Trust reconciliation
//!
//! This module decides whether an authenticated rotation request may be
//! applied. It enforces the core safety invariant of the protocol:
//! acceptance must be unanimous across every hostname the certificate
//! covers.

use tracing::warn;

use crate::error::Result;
use crate::request::RotationRequest;
use crate::store::HostKeyStore;

/// Decide whether a rotation is acceptable against the on-disk state.
///
/// For every hostname in the request, the current key on file must be one
/// of:
/// - absent — the host was never enrolled;
/// - the request's old key — a genuine rotation;
/// - the request's new key — a retry of an already-applied rotation,
///   which stays idempotent.
///
/// Any hostname holding a third, unrelated key rejects the rotation
/// globally. A rotation must never partially apply across aliases.
pub async fn acceptable(req: &RotationRequest, store: &HostKeyStore) -> Result<bool> {
    for hostname in req.hostnames() {
        let current = store.current_key(hostname, req.key_type()).await?;

        let continuous = match current.as_deref() {
            None => true,
            Some(key) => key == req.old_pubkey() || key == req.new_pubkey(),
        };

        if !continuous {
            warn!(
                hostname = %hostname,
                canonical = %req.hostname(),
                "rotation rejected: on-file key matches neither old nor new key"
            );
            return Ok(false);
        }
    }

    Ok(true)
}
