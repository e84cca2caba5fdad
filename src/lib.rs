//! Wi-Fi Scan Standards Service
//!
//! Scans for nearby access points and reports, for each one, the Wi-Fi
//! standard and channel layout the platform can observe. Results are served
//! as JSON-RPC 2.0 over a Unix domain socket.

pub mod backend;
pub mod config;
pub mod core;
pub mod protocol;
pub mod transport;

pub use core::{
    capabilities::{Capabilities, PermissionFamily, PlatformVersion},
    coordinator::{Responder, ScanCoordinator, ScanResponse},
    error::{ScanError, TransportError, WifiError},
    normalizer::ScanResultNormalizer,
    types::{ChannelWidth, NormalizedScanRecord, RawScanRecord, ScanPhase, WifiStandard},
};
