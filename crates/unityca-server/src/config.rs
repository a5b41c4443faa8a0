//! Service configuration
//!
//! All configuration is read from the environment once at startup into an
//! immutable struct. The CA key paths are process-wide state; nothing
//! reconfigures at runtime.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Immutable UnityCA configuration, constructed at startup.
#[derive(Debug, Clone)]
pub struct CaConfig {
    /// Port the HTTP service binds on.
    pub port: u16,
    /// Root directory of per-hostname key records.
    pub hosts_dir: PathBuf,
    /// CA private key used to sign host certificates. Must be usable
    /// without a passphrase prompt.
    pub host_ca_key: PathBuf,
    /// CA key pair for user certificates; only its public half is served.
    pub user_ca_key: PathBuf,
    /// Operator-managed revocation directory.
    pub revoked_dir: PathBuf,
    /// Certificate validity window, in `ssh-keygen -V` syntax.
    pub cert_validity: String,
    /// Upper bound on any single ssh-keygen invocation.
    pub keygen_timeout: Duration,
}

impl CaConfig {
    /// Read configuration from `UNITYCA_*` environment variables, falling
    /// back to the conventional relative layout.
    pub fn from_env() -> Self {
        let port = env::var("UNITYCA_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("UNITYCA_PORT must be a valid port number");

        let timeout_secs: u64 = env::var("UNITYCA_KEYGEN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("UNITYCA_KEYGEN_TIMEOUT_SECS must be a number of seconds");

        Self {
            port,
            hosts_dir: env::var("UNITYCA_HOSTS_DIR").unwrap_or_else(|_| "hosts".into()).into(),
            host_ca_key: env::var("UNITYCA_HOST_CA_KEY")
                .unwrap_or_else(|_| "keys/host_ca_key".into())
                .into(),
            user_ca_key: env::var("UNITYCA_USER_CA_KEY")
                .unwrap_or_else(|_| "keys/user_ca_key".into())
                .into(),
            revoked_dir: env::var("UNITYCA_REVOKED_DIR").unwrap_or_else(|_| "revoked".into()).into(),
            cert_validity: env::var("UNITYCA_CERT_VALIDITY").unwrap_or_else(|_| "+1w".into()),
            keygen_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Public half of the host CA key (`<host_ca_key>.pub`).
    pub fn host_ca_pub(&self) -> PathBuf {
        pub_sibling(&self.host_ca_key)
    }

    /// Public half of the user CA key (`<user_ca_key>.pub`).
    pub fn user_ca_pub(&self) -> PathBuf {
        pub_sibling(&self.user_ca_key)
    }
}

fn pub_sibling(key: &Path) -> PathBuf {
    let mut name = key.file_name().unwrap_or_default().to_os_string();
    name.push(".pub");
    key.with_file_name(name)
}
