//! Scan record normalization

use crate::core::{
    capabilities::Capabilities,
    types::{NormalizedScanRecord, RawScanRecord, WifiStandard},
};

/// Maps raw platform scan records to caller-facing records
///
/// Pure: the output depends only on the record and the capabilities the
/// normalizer was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResultNormalizer {
    capabilities: Capabilities,
}

impl ScanResultNormalizer {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn normalize(&self, raw: &RawScanRecord) -> NormalizedScanRecord {
        normalize(raw, &self.capabilities)
    }

    /// Normalize a batch, keeping the platform's order
    pub fn normalize_all(&self, raws: &[RawScanRecord]) -> Vec<NormalizedScanRecord> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }
}

/// Normalize one record under the given capabilities
pub fn normalize(raw: &RawScanRecord, capabilities: &Capabilities) -> NormalizedScanRecord {
    let channel = |value: Option<i32>| value.filter(|_| capabilities.channel_info);

    let wifi_standard = if capabilities.wifi_standard {
        raw.wifi_standard.unwrap_or(WifiStandard::UNKNOWN_CODE)
    } else {
        WifiStandard::UNKNOWN_CODE
    };

    NormalizedScanRecord {
        ssid: raw.ssid.clone().unwrap_or_default(),
        bssid: raw.bssid.clone().unwrap_or_default(),
        frequency: raw.frequency,
        level: raw.level,
        channel_width: channel(raw.channel_width),
        center_freq0: channel(raw.center_freq0),
        center_freq1: channel(raw.center_freq1),
        wifi_standard,
    }
}
