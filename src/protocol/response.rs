//! Response message types

use serde::{Deserialize, Serialize};

use crate::core::types::NormalizedScanRecord;

/// Response payloads from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    /// Normalized scan records in the platform's order
    ScanStandards(Vec<NormalizedScanRecord>),
}
