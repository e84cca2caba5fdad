//! wpa_supplicant control socket client
//!
//! The control interface is a Unix datagram socket per network interface.
//! Each client binds its own local socket, sends a command datagram and reads
//! the reply datagram. After `ATTACH` the same socket also receives
//! unsolicited event datagrams of the form `<level>EVENT-NAME ...`.
//!
//! Replies carry no request id. Once a reply is missed, a late datagram may
//! still arrive and would be read as the answer to the next command, so a
//! socket that timed out refuses further requests.

use std::{
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};
use tokio::net::UnixDatagram;
use tracing::{debug, trace, warn};

use crate::core::error::{WifiError, WifiResult};

/// wpa_supplicant builds each reply in a buffer of this size and drops
/// whatever does not fit
pub const MAX_REPLY_SIZE: usize = 4096;

pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(3);

static SOCKET_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Connected control socket bound to a private local path
#[derive(Debug)]
pub struct CtrlSocket {
    socket: UnixDatagram,
    local_path: PathBuf,
    reply_timeout: Duration,
    desynchronized: AtomicBool,
}

impl CtrlSocket {
    /// Connect to the control socket at `ctrl_path`
    pub fn open(ctrl_path: &Path, reply_timeout: Duration) -> WifiResult<Self> {
        let local_path = std::env::temp_dir().join(format!(
            "wifi-scan-standards-{}-{}",
            std::process::id(),
            SOCKET_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        // Leftover from a crashed process with the same pid
        let _ = std::fs::remove_file(&local_path);

        let socket = UnixDatagram::bind(&local_path).map_err(|e| {
            WifiError::BackendUnavailable(format!(
                "Failed to bind {}: {}",
                local_path.display(),
                e
            ))
        })?;

        // Owns the path from here on so it is removed on every error path
        let ctrl = Self {
            socket,
            local_path,
            reply_timeout,
            desynchronized: AtomicBool::new(false),
        };

        ctrl.socket.connect(ctrl_path).map_err(|e| {
            WifiError::BackendUnavailable(format!(
                "Failed to connect to wpa_supplicant at {}: {}",
                ctrl_path.display(),
                e
            ))
        })?;

        Ok(ctrl)
    }

    /// Send a command and wait for its reply
    ///
    /// Event datagrams arriving in between are skipped. After a timeout the
    /// socket is unusable and every further request fails.
    pub async fn request(&self, command: &str) -> WifiResult<String> {
        if self.desynchronized.load(Ordering::Acquire) {
            return Err(WifiError::Desynchronized(command.to_string()));
        }

        trace!(command, "ctrl request");
        self.socket
            .send(command.as_bytes())
            .await
            .map_err(|e| io_error(command, e))?;

        let mut buf = vec![0u8; MAX_REPLY_SIZE];
        loop {
            let n = match tokio::time::timeout(self.reply_timeout, self.socket.recv(&mut buf)).await
            {
                Ok(received) => received.map_err(|e| io_error(command, e))?,
                Err(_) => {
                    warn!(command, "No reply from wpa_supplicant, abandoning socket");
                    self.desynchronized.store(true, Ordering::Release);
                    return Err(WifiError::ReplyTimeout(command.to_string()));
                }
            };

            let reply = String::from_utf8_lossy(&buf[..n]);
            if is_event(&reply) {
                debug!(event = %reply.trim_end(), "Skipping event while awaiting reply");
                continue;
            }
            return Ok(reply.into_owned());
        }
    }

    /// Send a command whose only valid reply is `OK`
    pub async fn request_ok(&self, command: &str) -> WifiResult<()> {
        let reply = self.request(command).await?;
        if reply.trim_end() == "OK" {
            Ok(())
        } else {
            Err(WifiError::UnexpectedReply {
                command: command.to_string(),
                reply: reply.trim_end().to_string(),
            })
        }
    }

    /// Wait for the next event datagram on an attached socket
    pub async fn next_event(&self) -> WifiResult<String> {
        let mut buf = vec![0u8; MAX_REPLY_SIZE];
        loop {
            let n = self
                .socket
                .recv(&mut buf)
                .await
                .map_err(|e| io_error("event", e))?;

            let message = String::from_utf8_lossy(&buf[..n]);
            if is_event(&message) {
                return Ok(message.into_owned());
            }
        }
    }
}

impl Drop for CtrlSocket {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.local_path);
    }
}

/// Unsolicited messages carry a `<level>` prefix
fn is_event(message: &str) -> bool {
    message.starts_with('<')
}

/// Strip the `<level>` prefix from an event message
pub fn event_body(message: &str) -> &str {
    match message.strip_prefix('<').and_then(|rest| rest.split_once('>')) {
        Some((_, body)) => body.trim_end(),
        None => message.trim_end(),
    }
}

fn io_error(command: &str, error: io::Error) -> WifiError {
    WifiError::WpaSupplicantError(format!("{} failed: {}", command, error))
}
