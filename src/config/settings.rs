//! Runtime settings

use std::{path::PathBuf, time::Duration};
use tracing::warn;

use crate::{config::CliArgs, core::capabilities::PlatformVersion};

const DEFAULT_SOCKET_MODE: u32 = 0o660;

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub interface: String,
    pub ctrl_dir: PathBuf,
    pub socket_path: PathBuf,
    pub socket_mode: u32,
    pub scan_timeout: Duration,
    pub platform_version: PlatformVersion,
    pub once: bool,
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        // Parse octal socket mode
        let socket_mode = u32::from_str_radix(&args.socket_mode, 8).unwrap_or_else(|_| {
            warn!(
                socket_mode = %args.socket_mode,
                "Invalid socket mode, using {:o}", DEFAULT_SOCKET_MODE
            );
            DEFAULT_SOCKET_MODE
        });

        Settings {
            interface: args.interface,
            ctrl_dir: PathBuf::from(args.ctrl_dir),
            socket_path: PathBuf::from(args.socket_path),
            socket_mode,
            scan_timeout: Duration::from_secs(args.scan_timeout_secs),
            platform_version: PlatformVersion(args.platform_version),
            once: args.once,
        }
    }
}
