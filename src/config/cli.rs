//! Command-line argument parsing

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[clap(name = "wifi-scan-standards", version, author)]
#[clap(about = "Reports the Wi-Fi standard of nearby access points over a Unix socket")]
pub struct CliArgs {
    /// Wireless network interface name
    #[clap(short, long, default_value = "wlan0")]
    pub interface: String,

    /// wpa_supplicant control interface directory
    #[clap(long, default_value = "/var/run/wpa_supplicant")]
    pub ctrl_dir: String,

    /// Path for Unix socket
    #[clap(long, default_value = "/run/wifi-scan-standards.sock")]
    pub socket_path: String,

    /// Socket file permissions (octal, e.g., 660)
    #[clap(long, default_value = "660")]
    pub socket_mode: String,

    /// Seconds to wait for a scan to complete before reporting cached results
    #[clap(long, default_value_t = 8)]
    pub scan_timeout_secs: u64,

    /// Platform API level used to gate reported fields
    #[clap(long, default_value_t = 34)]
    pub platform_version: u32,

    /// Run a single scan request, print the result as JSON and exit
    #[clap(long)]
    pub once: bool,
}
