//! JSON-RPC request handler for Unix socket transport

use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    backend::{PermissionProvider, WifiBackend},
    core::coordinator::ScanCoordinator,
    protocol::{
        JsonRpcError, JsonRpcRequest, JsonRpcResponse, Request, RequestId, Response,
        jsonrpc::JSONRPC_VERSION,
    },
};

/// JSON-RPC request handler
pub struct RequestHandler<B: WifiBackend, P: PermissionProvider> {
    coordinator: Arc<ScanCoordinator<B, P>>,
}

impl<B: WifiBackend, P: PermissionProvider> RequestHandler<B, P> {
    /// Create a new request handler
    pub fn new(coordinator: Arc<ScanCoordinator<B, P>>) -> Self {
        Self { coordinator }
    }

    /// Handle one raw line read from a client
    pub async fn handle_line(&self, line: &str) -> JsonRpcResponse {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Invalid JSON-RPC request: {}", e);
                JsonRpcResponse::error(JsonRpcError::parse_error(), RequestId::Null)
            }
        }
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::error(
                JsonRpcError::invalid_request(format!(
                    "Unsupported JSON-RPC version: {}",
                    request.jsonrpc
                )),
                request.id,
            );
        }

        match request.request() {
            Some(Request::GetScanStandards) => self.handle_get_scan_standards(request.id).await,
            None => {
                debug!(method = %request.method, "Unknown method");
                JsonRpcResponse::error(JsonRpcError::not_implemented(), request.id)
            }
        }
    }

    async fn handle_get_scan_standards(&self, id: RequestId) -> JsonRpcResponse {
        match self.coordinator.scan_standards().await {
            Ok(records) => JsonRpcResponse::success(Response::ScanStandards(records), id),
            Err(e) => JsonRpcResponse::error(JsonRpcError::from(&e), id),
        }
    }
}
