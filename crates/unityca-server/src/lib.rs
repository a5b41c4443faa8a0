//! UnityCA Server
//!
//! HTTP service for the UnityCA host key rotation protocol:
//! - `POST /host` - submit a dual-signed rotation request, receive the
//!   new host certificate
//! - `GET /host_ca.pub` - the host CA's public key
//! - `GET /user_ca.pub` - the user CA's public key
//! - `GET /revoked` - aggregated revocation listing
//! - `GET /health` - liveness check
//!
//! The trust protocol itself lives in `unityca-core`; this crate supplies
//! the routing, the configuration, and the `ssh-keygen` subprocess
//! implementation of the verification and signing primitives.

pub mod api;
pub mod config;
pub mod keygen;

pub use api::create_router;
pub use api::handlers::AppState;
pub use config::CaConfig;
pub use keygen::SshKeygen;
