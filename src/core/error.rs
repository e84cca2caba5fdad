//! Error types for the Wi-Fi scan standards service

use thiserror::Error;

use super::capabilities::PermissionFamily;

/// Result type for Wi-Fi backend operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Result type for scan requests
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors related to Wi-Fi backend operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WifiError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("wpa_supplicant error: {0}")]
    WpaSupplicantError(String),

    #[error("Unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error("No reply to {0} within timeout")]
    ReplyTimeout(String),

    #[error("Control socket out of sync after a missed reply to {0}")]
    Desynchronized(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),
}

/// Errors delivered to the caller of a scan request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("{0} not granted")]
    PermissionDenied(PermissionFamily),

    #[error("Scan request already in flight")]
    Busy,

    #[error("{0}")]
    Native(String),
}

impl ScanError {
    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::PermissionDenied(_) => "PermissionDenied",
            ScanError::Busy => "Busy",
            ScanError::Native(_) => "NativeError",
        }
    }
}

impl From<WifiError> for ScanError {
    fn from(error: WifiError) -> Self {
        ScanError::Native(error.to_string())
    }
}

/// Errors related to transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_kinds() {
        assert_eq!(
            ScanError::PermissionDenied(PermissionFamily::FineLocation).kind(),
            "PermissionDenied"
        );
        assert_eq!(ScanError::Busy.kind(), "Busy");
        assert_eq!(ScanError::Native("boom".into()).kind(), "NativeError");
    }

    #[test]
    fn test_scan_error_messages() {
        let err = ScanError::PermissionDenied(PermissionFamily::NearbyWifiDevices);
        assert_eq!(err.to_string(), "NEARBY_WIFI_DEVICES not granted");
    }

    #[test]
    fn test_wifi_error_wraps_into_native() {
        let err: ScanError = WifiError::ReplyTimeout("SCAN_RESULTS".into()).into();
        assert_eq!(
            err,
            ScanError::Native("No reply to SCAN_RESULTS within timeout".into())
        );
    }
}
