//! Request message types

use serde::{Deserialize, Serialize};

/// Methods a client may call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Request {
    /// Scan and report the Wi-Fi standard of every visible access point
    #[serde(rename = "getScanStandards")]
    GetScanStandards,
}

impl Request {
    /// Wire name of the method
    pub fn method(&self) -> &'static str {
        match self {
            Request::GetScanStandards => "getScanStandards",
        }
    }

    /// Look up a method by its wire name
    pub fn from_method(method: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(method.to_string())).ok()
    }
}
