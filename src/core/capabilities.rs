//! Platform capability descriptor
//!
//! Which scan record fields a platform reports, and which permission guards
//! scanning, depends on the platform API level. The descriptor is resolved
//! once and handed to the normalizer and coordinator.

use serde::{Deserialize, Serialize};

/// Platform API level scan records were produced under
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlatformVersion(pub u32);

impl PlatformVersion {
    /// First level reporting channel width and center frequencies
    pub const CHANNEL_INFO: PlatformVersion = PlatformVersion(23);
    /// First level reporting the Wi-Fi standard
    pub const WIFI_STANDARD: PlatformVersion = PlatformVersion(30);
    /// First level guarding scans with the nearby-devices permission
    pub const NEARBY_WIFI_PERMISSION: PlatformVersion = PlatformVersion(33);
}

impl std::fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Permission required to observe nearby Wi-Fi information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionFamily {
    #[serde(rename = "NEARBY_WIFI_DEVICES")]
    NearbyWifiDevices,
    #[serde(rename = "ACCESS_FINE_LOCATION")]
    FineLocation,
}

impl PermissionFamily {
    pub fn for_platform(platform: PlatformVersion) -> Self {
        if platform >= PlatformVersion::NEARBY_WIFI_PERMISSION {
            PermissionFamily::NearbyWifiDevices
        } else {
            PermissionFamily::FineLocation
        }
    }
}

impl std::fmt::Display for PermissionFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionFamily::NearbyWifiDevices => write!(f, "NEARBY_WIFI_DEVICES"),
            PermissionFamily::FineLocation => write!(f, "ACCESS_FINE_LOCATION"),
        }
    }
}

/// Field availability and permission requirements of one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub platform: PlatformVersion,
    /// Wi-Fi standard code is reported
    pub wifi_standard: bool,
    /// Channel width and center frequencies are reported
    pub channel_info: bool,
    pub permission: PermissionFamily,
}

impl Capabilities {
    pub fn resolve(platform: PlatformVersion) -> Self {
        Self {
            platform,
            wifi_standard: platform >= PlatformVersion::WIFI_STANDARD,
            channel_info: platform >= PlatformVersion::CHANNEL_INFO,
            permission: PermissionFamily::for_platform(platform),
        }
    }
}
