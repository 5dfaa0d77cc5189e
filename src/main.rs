// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use axum::http::HeaderValue;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use recipes_server::{
    api::router,
    auth::MagicClient,
    config::{AppConfig, TlsSettings},
    logging,
    state::AppState,
    storage::{ensure_admin, DocumentStore, StoragePaths, UserDatabase},
};

/// How often idle throttle entries are dropped.
const THROTTLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// Time given to in-flight requests once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("storage: {0}")]
    Storage(#[from] recipes_server::storage::StorageError),

    #[error("user database: {0}")]
    UserDb(#[from] recipes_server::storage::UserDbError),

    #[error("identity provider client: {0}")]
    Verifier(#[from] recipes_server::auth::VerifierError),

    #[error("invalid CLIENT_ORIGIN header value: {0}")]
    Origin(#[from] axum::http::header::InvalidHeaderValue),

    #[error("invalid bind address {0}")]
    BindAddress(String),

    #[error("failed to install rustls crypto provider")]
    CryptoProvider,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.log_format, config.log_path.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let paths = StoragePaths::new(&config.data_dir);
    let users = UserDatabase::open(&paths.users_db())?;
    let mut storage = DocumentStore::new(paths);
    storage.initialize()?;

    if let Some(email) = &config.seed_admin_email {
        let admin = ensure_admin(&users, email)?;
        info!(user_id = %admin.id, email = %admin.email, "Seed admin ensured");
    }

    let verifier = Arc::new(MagicClient::from_settings(&config.magic)?);
    let state = AppState::new(storage, users, verifier, &config.jwt, &config.throttle);
    let throttle = state.throttle.clone();

    let origin = HeaderValue::from_str(&config.client_origin)?;
    let app = router(state, origin).into_make_service_with_connect_info::<SocketAddr>();

    let bind = config.bind_address();
    let addr: SocketAddr = bind
        .parse()
        .map_err(|_| StartupError::BindAddress(bind.clone()))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let sweep_token = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(THROTTLE_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = sweep_token.cancelled() => break,
                _ = interval.tick() => throttle.retain_recent(),
            }
        }
    });

    match &config.tls {
        Some(tls) => serve_https(addr, tls, app, shutdown).await?,
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Recipes server listening on http://{addr} (docs at /docs)");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn serve_https(
    addr: SocketAddr,
    tls: &TlsSettings,
    app: axum::extract::connect_info::IntoMakeServiceWithConnectInfo<axum::Router, SocketAddr>,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| StartupError::CryptoProvider)?;

    let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!("Recipes server listening on https://{addr} (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app)
        .await?;
    Ok(())
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    token.cancel();
}
