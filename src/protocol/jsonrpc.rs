//! JSON-RPC 2.0 message envelope

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    core::error::ScanError,
    protocol::{request::Request, response::Response},
};

/// JSON-RPC protocol version
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request wrapper
///
/// The method stays a plain string so unknown methods can still be answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: RequestId,
}

/// JSON-RPC 2.0 response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: RequestId,
}

/// Request ID (number, string or null)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    #[default]
    Null,
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Standard JSON-RPC error codes
impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;

    // Custom error codes
    pub const PERMISSION_DENIED: i32 = -32001;
    pub const SCAN_BUSY: i32 = -32002;
    pub const NATIVE_ERROR: i32 = -32003;

    fn with_kind(code: i32, message: impl Into<String>, kind: &str) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(json!({ "kind": kind })),
        }
    }

    pub fn parse_error() -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: "Parse error".to_string(),
            data: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: message.into(),
            data: None,
        }
    }

    pub fn not_implemented() -> Self {
        Self::with_kind(Self::METHOD_NOT_FOUND, "Not implemented", "NotImplemented")
    }

    /// Machine-readable kind carried in `data`, if any
    pub fn kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

impl From<&ScanError> for JsonRpcError {
    fn from(error: &ScanError) -> Self {
        let code = match error {
            ScanError::PermissionDenied(_) => Self::PERMISSION_DENIED,
            ScanError::Busy => Self::SCAN_BUSY,
            ScanError::Native(_) => Self::NATIVE_ERROR,
        };
        Self::with_kind(code, error.to_string(), error.kind())
    }
}

impl JsonRpcRequest {
    pub fn new(request: Request, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: request.method().to_string(),
            params: None,
            id,
        }
    }

    /// Known method this request calls, if any
    pub fn request(&self) -> Option<Request> {
        Request::from_method(&self.method)
    }
}

impl JsonRpcResponse {
    pub fn success(result: Response, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(error: JsonRpcError, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capabilities::PermissionFamily;

    #[test]
    fn test_jsonrpc_request_serialization() {
        let request = JsonRpcRequest::new(Request::GetScanStandards, RequestId::Number(1));
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""method":"getScanStandards""#));
        assert!(json.contains(r#""id":1"#));
        assert!(!json.contains("params"));

        let deserialized: JsonRpcRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, request);
        assert_eq!(deserialized.request(), Some(Request::GetScanStandards));
    }

    #[test]
    fn test_jsonrpc_request_with_string_id() {
        let request = JsonRpcRequest::new(
            Request::GetScanStandards,
            RequestId::String("abc-123".to_string()),
        );
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains(r#""id":"abc-123""#));
    }

    #[test]
    fn test_jsonrpc_request_unknown_method_still_parses() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"connect","params":{"ssid":"x"},"id":7}"#)
                .unwrap();

        assert_eq!(request.method, "connect");
        assert_eq!(request.request(), None);
        assert_eq!(request.id, RequestId::Number(7));
    }

    #[test]
    fn test_jsonrpc_request_without_id() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"getScanStandards"}"#).unwrap();
        assert_eq!(request.id, RequestId::Null);
    }

    #[test]
    fn test_jsonrpc_response_success() {
        let response = JsonRpcResponse::success(Response::ScanStandards(vec![]), RequestId::Number(1));
        let json = serde_json::to_string(&response).unwrap();

        assert_eq!(json, r#"{"jsonrpc":"2.0","result":[],"id":1}"#);

        let deserialized: JsonRpcResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, response);
    }

    #[test]
    fn test_jsonrpc_parse_error_has_null_id() {
        let response = JsonRpcResponse::error(JsonRpcError::parse_error(), RequestId::Null);
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains(r#""code":-32700"#));
        assert!(json.contains(r#""id":null"#));
        assert!(!json.contains(r#""result""#));
    }

    #[test]
    fn test_not_implemented() {
        let err = JsonRpcError::not_implemented();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);
        assert_eq!(err.message, "Not implemented");
        assert_eq!(err.kind(), Some("NotImplemented"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(JsonRpcError::PARSE_ERROR, -32700);
        assert_eq!(JsonRpcError::INVALID_REQUEST, -32600);
        assert_eq!(JsonRpcError::PERMISSION_DENIED, -32001);
        assert_eq!(JsonRpcError::NATIVE_ERROR, -32003);
    }

    #[test]
    fn test_scan_error_mapping() {
        let err = JsonRpcError::from(&ScanError::PermissionDenied(
            PermissionFamily::NearbyWifiDevices,
        ));
        assert_eq!(err.code, JsonRpcError::PERMISSION_DENIED);
        assert_eq!(err.kind(), Some("PermissionDenied"));
        assert!(err.message.contains("NEARBY_WIFI_DEVICES"));

        let err = JsonRpcError::from(&ScanError::Busy);
        assert_eq!(err.code, JsonRpcError::SCAN_BUSY);
        assert_eq!(err.kind(), Some("Busy"));

        let err = JsonRpcError::from(&ScanError::Native("ctrl socket gone".into()));
        assert_eq!(err.code, JsonRpcError::NATIVE_ERROR);
        assert_eq!(err.kind(), Some("NativeError"));
        assert_eq!(err.message, "ctrl socket gone");
    }
}
