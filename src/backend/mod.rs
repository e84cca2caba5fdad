//! Wi-Fi backend abstraction layer

pub mod ctrl_socket;
pub mod ies;
pub mod mock_backend;
pub mod permission;
pub mod wifi_backend;
pub mod wpactrl_backend;

pub use permission::CtrlSocketAccess;
pub use wifi_backend::{PermissionProvider, WifiBackend};
pub use wpactrl_backend::WpactrlBackend;

#[cfg(test)]
pub use mock_backend::{MockPermissions, MockWifiBackend, SignalMode};
