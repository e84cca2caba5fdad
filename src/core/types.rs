//! Domain types for Wi-Fi scan standards

use serde::{Deserialize, Serialize};

/// Scan record as reported by the platform Wi-Fi subsystem
///
/// Every field the platform may withhold is optional. Frequency and level are
/// always reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawScanRecord {
    /// Network SSID, possibly redacted or missing
    pub ssid: Option<String>,
    /// Access point hardware address
    pub bssid: Option<String>,
    /// Primary channel frequency in MHz
    pub frequency: i32,
    /// Signal level in dBm
    pub level: i32,
    /// Channel width code
    pub channel_width: Option<i32>,
    /// Center frequency of the whole channel (or first segment) in MHz
    pub center_freq0: Option<i32>,
    /// Center frequency of the second segment for 80+80 MHz channels
    pub center_freq1: Option<i32>,
    /// Wi-Fi standard code
    pub wifi_standard: Option<i32>,
}

/// Scan record handed to callers
///
/// Fields unavailable on the producing platform are omitted (channel
/// information) or carry [`WifiStandard::UNKNOWN_CODE`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedScanRecord {
    pub ssid: String,
    pub bssid: String,
    pub frequency: i32,
    pub level: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_freq0: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_freq1: Option<i32>,
    pub wifi_standard: i32,
}

impl NormalizedScanRecord {
    /// Typed view of the standard code
    pub fn standard(&self) -> WifiStandard {
        WifiStandard::from(self.wifi_standard)
    }

    /// Typed view of the channel width code, if reported
    pub fn width(&self) -> Option<ChannelWidth> {
        self.channel_width.map(ChannelWidth::from)
    }

    /// Primary channel number derived from the frequency
    pub fn channel(&self) -> Option<u32> {
        u32::try_from(self.frequency)
            .ok()
            .and_then(crate::core::channel::frequency_to_channel)
    }
}

/// IEEE 802.11 generation an access point advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WifiStandard {
    Unknown,
    Legacy,
    Ieee80211n,
    Ieee80211ac,
    Ieee80211ax,
    Ieee80211be,
    /// Code without a known meaning, kept as reported
    Other(i32),
}

impl WifiStandard {
    /// Sentinel for "standard not available"
    pub const UNKNOWN_CODE: i32 = -1;

    pub fn code(self) -> i32 {
        match self {
            WifiStandard::Unknown => Self::UNKNOWN_CODE,
            WifiStandard::Legacy => 1,
            WifiStandard::Ieee80211n => 4,
            WifiStandard::Ieee80211ac => 5,
            WifiStandard::Ieee80211ax => 6,
            WifiStandard::Ieee80211be => 7,
            WifiStandard::Other(code) => code,
        }
    }
}

impl From<i32> for WifiStandard {
    fn from(code: i32) -> Self {
        match code {
            Self::UNKNOWN_CODE => WifiStandard::Unknown,
            1 => WifiStandard::Legacy,
            4 => WifiStandard::Ieee80211n,
            5 => WifiStandard::Ieee80211ac,
            6 => WifiStandard::Ieee80211ax,
            7 => WifiStandard::Ieee80211be,
            other => WifiStandard::Other(other),
        }
    }
}

impl From<WifiStandard> for i32 {
    fn from(standard: WifiStandard) -> Self {
        standard.code()
    }
}

impl std::fmt::Display for WifiStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WifiStandard::Unknown => write!(f, "unknown"),
            WifiStandard::Legacy => write!(f, "802.11a/b/g"),
            WifiStandard::Ieee80211n => write!(f, "802.11n"),
            WifiStandard::Ieee80211ac => write!(f, "802.11ac"),
            WifiStandard::Ieee80211ax => write!(f, "802.11ax"),
            WifiStandard::Ieee80211be => write!(f, "802.11be"),
            WifiStandard::Other(code) => write!(f, "standard code {}", code),
        }
    }
}

/// Operating channel width of an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelWidth {
    Mhz20,
    Mhz40,
    Mhz80,
    Mhz160,
    Mhz80Plus80,
    Mhz320,
    /// Code without a known meaning, kept as reported
    Other(i32),
}

impl ChannelWidth {
    pub fn code(self) -> i32 {
        match self {
            ChannelWidth::Mhz20 => 0,
            ChannelWidth::Mhz40 => 1,
            ChannelWidth::Mhz80 => 2,
            ChannelWidth::Mhz160 => 3,
            ChannelWidth::Mhz80Plus80 => 4,
            ChannelWidth::Mhz320 => 5,
            ChannelWidth::Other(code) => code,
        }
    }

    /// Total occupied bandwidth in MHz
    pub fn mhz(self) -> Option<u32> {
        match self {
            ChannelWidth::Mhz20 => Some(20),
            ChannelWidth::Mhz40 => Some(40),
            ChannelWidth::Mhz80 => Some(80),
            ChannelWidth::Mhz160 | ChannelWidth::Mhz80Plus80 => Some(160),
            ChannelWidth::Mhz320 => Some(320),
            ChannelWidth::Other(_) => None,
        }
    }

    /// Whether the second center frequency carries meaning
    pub fn has_second_segment(self) -> bool {
        self == ChannelWidth::Mhz80Plus80
    }
}

impl From<i32> for ChannelWidth {
    fn from(code: i32) -> Self {
        match code {
            0 => ChannelWidth::Mhz20,
            1 => ChannelWidth::Mhz40,
            2 => ChannelWidth::Mhz80,
            3 => ChannelWidth::Mhz160,
            4 => ChannelWidth::Mhz80Plus80,
            5 => ChannelWidth::Mhz320,
            other => ChannelWidth::Other(other),
        }
    }
}

impl From<ChannelWidth> for i32 {
    fn from(width: ChannelWidth) -> Self {
        width.code()
    }
}

impl std::fmt::Display for ChannelWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelWidth::Mhz80Plus80 => write!(f, "80+80 MHz"),
            ChannelWidth::Other(code) => write!(f, "width code {}", code),
            width => match width.mhz() {
                Some(mhz) => write!(f, "{} MHz", mhz),
                None => write!(f, "width code {}", width.code()),
            },
        }
    }
}

/// Scan coordinator lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    PermissionChecking,
    Scanning,
    Fetching,
    Delivering,
}

/// How the wait for fresh scan results ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCompletion {
    /// The completion signal fired; `success` is informational only
    Signalled { success: bool },
    /// The platform refused to start a scan
    TriggerRejected,
    /// Starting the scan failed outright
    TriggerFailed(String),
    /// Subscribing to the completion signal failed
    SubscriptionFailed(String),
    /// The signal source went away without firing
    SignalLost,
    /// No signal within the scan timeout
    TimedOut,
}

impl ScanCompletion {
    /// Whether cached results are reported instead of a fresh scan
    pub fn is_degraded(&self) -> bool {
        !matches!(self, ScanCompletion::Signalled { success: true })
    }
}

/// Scan completion event published by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCompleted {
    pub success: bool,
}

/// Identifier of one scan completion subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Active scan completion subscription
///
/// The receiver resolves at most once. Release the subscription through the
/// backend it came from.
#[derive(Debug)]
pub struct ScanSubscription {
    pub id: SubscriptionId,
    pub completed: tokio::sync::oneshot::Receiver<ScanCompleted>,
}

/// Identifier of one accepted scan request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(uuid::Uuid);

impl RequestTicket {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestTicket {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier for transport connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
