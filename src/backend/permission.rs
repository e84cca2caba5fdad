//! Control socket access as the scan permission

use std::{io::ErrorKind, os::unix::net::UnixDatagram, path::PathBuf};
use tracing::{debug, warn};

use crate::{backend::PermissionProvider, core::capabilities::PermissionFamily};

/// Grants scanning when this process may talk to wpa_supplicant
///
/// Every permission family maps to write access on the control socket.
/// Only a permission error counts as "not granted"; a missing or dead
/// supplicant surfaces later as a backend error instead.
#[derive(Debug, Clone)]
pub struct CtrlSocketAccess {
    ctrl_path: PathBuf,
}

impl CtrlSocketAccess {
    pub fn new(ctrl_path: impl Into<PathBuf>) -> Self {
        Self {
            ctrl_path: ctrl_path.into(),
        }
    }
}

impl PermissionProvider for CtrlSocketAccess {
    async fn is_granted(&self, permission: PermissionFamily) -> bool {
        let connected = UnixDatagram::unbound().and_then(|socket| socket.connect(&self.ctrl_path));

        match connected {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                warn!(%permission, path = %self.ctrl_path.display(), "Control socket access denied");
                false
            }
            Err(e) => {
                debug!(%permission, "Control socket check failed: {}", e);
                true
            }
        }
    }
}
