//! Unix socket server implementation

use std::{os::unix::fs::PermissionsExt, path::PathBuf, sync::Arc};
use tokio::{
    fs,
    net::{UnixListener, UnixStream},
};
use tracing::{error, info, warn};

use crate::{
    backend::{PermissionProvider, WifiBackend},
    core::{coordinator::ScanCoordinator, error::TransportResult},
    transport::unix_socket::{handler::RequestHandler, session::UnixSocketSession},
};

/// Unix socket server
pub struct UnixSocketServer<B: WifiBackend, P: PermissionProvider> {
    socket_path: PathBuf,
    socket_mode: u32,
    handler: Arc<RequestHandler<B, P>>,
}

impl<B: WifiBackend, P: PermissionProvider> UnixSocketServer<B, P> {
    /// Create a new Unix socket server
    pub fn new(
        socket_path: impl Into<PathBuf>,
        socket_mode: u32,
        coordinator: Arc<ScanCoordinator<B, P>>,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            socket_mode,
            handler: Arc::new(RequestHandler::new(coordinator)),
        }
    }

    /// Bind the configured socket path, replacing a stale socket file
    pub async fn bind(&self) -> TransportResult<UnixListener> {
        if self.socket_path.exists() {
            fs::remove_file(&self.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        fs::set_permissions(
            &self.socket_path,
            std::fs::Permissions::from_mode(self.socket_mode),
        )
        .await?;

        info!(
            path = %self.socket_path.display(),
            mode = format_args!("{:o}", self.socket_mode),
            "Unix socket server listening"
        );
        Ok(listener)
    }

    /// Serve clients on an already bound listener
    pub async fn serve(&self, listener: UnixListener) -> TransportResult<()> {
        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_client(stream, handler).await {
                            error!("Error handling client: {}", e);
                        }
                    });
                }
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                }
            }
        }
    }

    async fn handle_client(
        stream: UnixStream,
        handler: Arc<RequestHandler<B, P>>,
    ) -> TransportResult<()> {
        let mut session = UnixSocketSession::new(stream);

        info!("New client connected: {}", session.id());

        while let Some(line) = session.next_line().await? {
            let response = handler.handle_line(&line).await;
            session.send(&response).await?;
        }

        info!("Client disconnected: {}", session.id());
        Ok(())
    }
}
