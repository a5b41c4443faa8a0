//! UnityCA Server Binary
//!
//! Runs the UnityCA HTTP service for SSH host key rotation.

use std::env;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use unityca_core::{HostKeyStore, RevocationStore, RotationService};
use unityca_server::{create_router, AppState, CaConfig, SshKeygen};

#[tokio::main]
async fn main() {
    // Initialize logging
    let log_level = env::var("UNITYCA_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Configuration
    let config = CaConfig::from_env();

    // The revocation directory is operator-writable; make sure it exists
    // so the read path never 500s on a fresh install.
    tokio::fs::create_dir_all(&config.revoked_dir)
        .await
        .expect("Failed to create revocation directory");

    let keygen = Arc::new(SshKeygen::new(
        config.host_ca_key.clone(),
        config.cert_validity.clone(),
        config.keygen_timeout,
    ));

    let service = RotationService::new(HostKeyStore::new(config.hosts_dir.clone()), keygen.clone());
    let revocations = RevocationStore::new(config.revoked_dir.clone());

    info!(
        hosts_dir = %config.hosts_dir.display(),
        host_ca_key = %config.host_ca_key.display(),
        validity = %config.cert_validity,
        port = config.port,
        "Starting UnityCA server"
    );

    // Create application state
    let state = Arc::new(AppState {
        service,
        verifier: keygen,
        revocations,
        config: config.clone(),
    });

    // Build router
    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "UnityCA listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
