//! Wi-Fi backend trait definitions

use trait_variant::make;

use crate::core::{
    capabilities::{PermissionFamily, PlatformVersion},
    error::WifiResult,
    types::{RawScanRecord, ScanSubscription, SubscriptionId},
};

/// Abstraction over the platform Wi-Fi scanning subsystem
///
/// This trait enables testing by allowing mock implementations
/// while providing a standard interface for scan operations.
#[make(Send)]
pub trait WifiBackend: Sync + 'static {
    /// Platform API level the backend's scan records are produced under
    fn platform_version(&self) -> PlatformVersion;

    /// Ask the platform to start a scan
    ///
    /// Returns `false` if the platform refused (busy, throttled). Completion
    /// is announced through [`WifiBackend::subscribe_scan_completed`].
    async fn trigger_scan(&self) -> WifiResult<bool>;

    /// Read the scan results the platform currently holds
    ///
    /// `None` means the platform has no result list at all.
    async fn scan_results(&self) -> WifiResult<Option<Vec<RawScanRecord>>>;

    /// Subscribe to the next scan completion event
    async fn subscribe_scan_completed(&self) -> WifiResult<ScanSubscription>;

    /// Release a subscription
    ///
    /// Releasing an unknown or already released id is a no-op.
    fn unsubscribe_scan_completed(&self, id: SubscriptionId);
}

/// Abstraction over the platform permission subsystem
#[make(Send)]
pub trait PermissionProvider: Sync + 'static {
    /// Whether the permission is currently granted
    async fn is_granted(&self, permission: PermissionFamily) -> bool;
}
