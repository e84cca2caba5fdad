//! Wi-Fi Scan Standards Service - Main Entry Point

use std::sync::Arc;

use clap::Parser;
use listenfd::ListenFd;
use tokio::net::UnixListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wifi_scan_standards::{
    NormalizedScanRecord, ScanCoordinator,
    backend::{CtrlSocketAccess, WpactrlBackend},
    config::{CliArgs, Settings},
    transport::UnixSocketServer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wifi_scan_standards=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let args = CliArgs::parse();
    info!(?args, "Starting Wi-Fi scan standards service");
    let settings = Settings::from(args);

    // Create Wi-Fi backend
    let backend = Arc::new(WpactrlBackend::new(
        settings.interface.clone(),
        &settings.ctrl_dir,
        settings.platform_version,
    ));
    let permissions = Arc::new(CtrlSocketAccess::new(backend.ctrl_path()));
    info!(
        "Wi-Fi backend initialized for interface: {}",
        settings.interface
    );

    let coordinator = Arc::new(ScanCoordinator::new(
        backend,
        permissions,
        settings.scan_timeout,
    ));

    if settings.once {
        return match coordinator.scan_standards().await {
            Ok(records) => {
                print_records(&records)?;
                Ok(())
            }
            Err(e) => {
                error!(kind = e.kind(), "Scan request failed: {}", e);
                Err(e.into())
            }
        };
    }

    let server = UnixSocketServer::new(
        settings.socket_path.clone(),
        settings.socket_mode,
        coordinator,
    );
    let listener = match inherited_listener()? {
        Some(listener) => {
            info!("Using socket-activated listener");
            listener
        }
        None => server.bind().await?,
    };

    let task = tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            error!("Unix socket server error: {}", e);
        }
    });

    notify_ready();
    info!("Service started successfully");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = shutdown_signal() => {
            info!("Received SIGTERM, shutting down gracefully");
        }
        _ = task => {
            info!("Server task completed");
        }
    }

    info!("Shutting down...");
    Ok(())
}

/// Listener passed in by the service manager, if any
fn inherited_listener() -> std::io::Result<Option<UnixListener>> {
    let mut listenfd = ListenFd::from_env();
    match listenfd.take_unix_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            Ok(Some(UnixListener::from_std(listener)?))
        }
        None => Ok(None),
    }
}

fn print_records(records: &[NormalizedScanRecord]) -> serde_json::Result<()> {
    for record in records {
        info!(
            bssid = %record.bssid,
            ssid = %record.ssid,
            channel = ?record.channel(),
            width = ?record.width(),
            "{}",
            record.standard()
        );
    }
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

#[cfg(feature = "systemd")]
fn notify_ready() {
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("Failed to notify systemd: {}", e);
    }
}

#[cfg(not(feature = "systemd"))]
fn notify_ready() {}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
