//! UnityCA core
//!
//! The key-rotation trust protocol for an SSH host certificate authority.
//! A host holding a certified key requests a certificate for a
//! replacement key by presenting signatures from both the old and the new
//! key over the same request, proving continuity of identity.
//!
//! Pipeline: raw body → [`RotationRequest::parse`] (structure, algorithm,
//! dual-signature authentication) → [`reconcile::acceptable`] (unanimous
//! continuity across every alias) → [`issue::grant`] (persist, sign,
//! mirror). [`RotationService`] runs the last two under a per-hostname
//! lock. The revocation read path is independent.
//!
//! The cryptographic primitives themselves are capability traits
//! ([`SignatureVerifier`], [`CertificateSigner`]); the server crate
//! provides them by invoking `ssh-keygen`.

pub mod codec;
pub mod error;
pub mod issue;
pub mod reconcile;
pub mod request;
pub mod revocation;
pub mod service;
pub mod store;
pub mod verify;

pub use codec::reconstitute_signature;
pub use error::{KeySlot, Result, RotationError};
pub use issue::CertificateSigner;
pub use request::{RotationRequest, SUPPORTED_ALGORITHM};
pub use revocation::RevocationStore;
pub use service::RotationService;
pub use store::HostKeyStore;
pub use verify::{allowed_signers_line, SignatureVerifier};
