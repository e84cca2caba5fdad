//! wpa_supplicant backend implementation

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    backend::{
        WifiBackend,
        ctrl_socket::{CtrlSocket, DEFAULT_REPLY_TIMEOUT, event_body},
        ies,
    },
    core::{
        capabilities::PlatformVersion,
        error::{WifiError, WifiResult},
        types::{RawScanRecord, ScanCompleted, ScanSubscription, SubscriptionId},
    },
};

const EVENT_SCAN_RESULTS: &str = "CTRL-EVENT-SCAN-RESULTS";
const EVENT_SCAN_FAILED: &str = "CTRL-EVENT-SCAN-FAILED";

/// id, bssid, freq, level, ie and ssid
const BSS_FIELD_MASK: &str = "MASK=0x1487";
/// Upper bound on a table walk
const MAX_BSS_ENTRIES: usize = 1024;

/// Real wpa_supplicant backend implementation
pub struct WpactrlBackend {
    interface: String,
    ctrl_path: PathBuf,
    platform: PlatformVersion,
    reply_timeout: Duration,
    monitors: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
    next_subscription: AtomicU64,
}

impl WpactrlBackend {
    /// Create a new wpa_supplicant backend
    pub fn new(interface: String, ctrl_dir: &Path, platform: PlatformVersion) -> Self {
        let ctrl_path = ctrl_dir.join(&interface);
        Self {
            interface,
            ctrl_path,
            platform,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            monitors: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Path of the interface's control socket
    pub fn ctrl_path(&self) -> &Path {
        &self.ctrl_path
    }

    /// Override the per-command reply timeout
    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    fn open_ctrl(&self) -> WifiResult<CtrlSocket> {
        CtrlSocket::open(&self.ctrl_path, self.reply_timeout)
    }

    /// Issue one `BSS` query, retrying once on a fresh socket after a missed reply
    async fn bss_request(&self, ctrl: &mut CtrlSocket, command: &str) -> WifiResult<String> {
        match ctrl.request(command).await {
            Err(WifiError::ReplyTimeout(_)) => {
                warn!(command, "Retrying on a fresh control socket");
                *ctrl = self.open_ctrl()?;
                ctrl.request(command).await
            }
            reply => reply,
        }
    }

    fn lock_monitors(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, JoinHandle<()>>> {
        self.monitors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One entry of wpa_supplicant's BSS table
#[derive(Debug, PartialEq)]
struct BssEntry {
    id: u64,
    record: RawScanRecord,
}

/// Parse a `BSS` reply
///
/// `None` for an empty or `FAIL` reply, which ends the table walk. Missing or
/// garbled fields still yield a record; radio fields stay absent without IEs.
fn parse_bss_entry(output: &str) -> Option<BssEntry> {
    let fields: HashMap<&str, &str> = output
        .lines()
        .filter_map(|line| line.split_once('='))
        .collect();

    let id = fields.get("id")?.parse().ok()?;
    let frequency = fields
        .get("freq")
        .and_then(|f| f.parse().ok())
        .unwrap_or(0);

    let mut record = RawScanRecord {
        ssid: fields.get("ssid").map(|ssid| ssid.to_string()),
        bssid: fields
            .get("bssid")
            .filter(|bssid| !bssid.is_empty())
            .map(|bssid| bssid.to_string()),
        frequency,
        level: fields
            .get("level")
            .and_then(|l| l.parse().ok())
            .unwrap_or(0),
        ..Default::default()
    };

    // Prefer the last received IEs, beacon IEs when there are none
    let ies = fields
        .get("ie")
        .filter(|ie| !ie.is_empty())
        .or_else(|| fields.get("beacon_ie"))
        .and_then(|ie| hex::decode(ie).ok());

    match ies {
        Some(ies) => {
            let info = ies::decode(&ies, frequency);
            record.wifi_standard = Some(info.standard.code());
            record.channel_width = Some(info.width.code());
            record.center_freq0 = Some(info.center_freq0);
            record.center_freq1 = Some(info.center_freq1);
        }
        None => debug!(id, "No information elements for BSS"),
    }

    Some(BssEntry { id, record })
}

/// Map a control interface event to a scan completion
fn scan_event(message: &str) -> Option<ScanCompleted> {
    let body = event_body(message);
    if body.starts_with(EVENT_SCAN_RESULTS) {
        Some(ScanCompleted { success: true })
    } else if body.starts_with(EVENT_SCAN_FAILED) {
        Some(ScanCompleted { success: false })
    } else {
        None
    }
}

/// Forward the first scan completion event seen on an attached socket
async fn monitor_scan_events(ctrl: CtrlSocket, tx: oneshot::Sender<ScanCompleted>) {
    loop {
        match ctrl.next_event().await {
            Ok(message) => {
                if let Some(event) = scan_event(&message) {
                    debug!(?event, "Scan completion event");
                    let _ = tx.send(event);
                    break;
                }
            }
            Err(e) => {
                warn!("Event monitor stopped: {}", e);
                break;
            }
        }
    }

    if let Err(e) = ctrl.request_ok("DETACH").await {
        debug!("DETACH failed: {}", e);
    }
}

impl WifiBackend for WpactrlBackend {
    fn platform_version(&self) -> PlatformVersion {
        self.platform
    }

    async fn trigger_scan(&self) -> WifiResult<bool> {
        debug!("Triggering WiFi scan on interface: {}", self.interface);

        let ctrl = self.open_ctrl()?;
        let reply = ctrl.request("SCAN").await?;

        match reply.trim_end() {
            "OK" => Ok(true),
            other => {
                debug!(reply = other, "Scan request refused");
                Ok(false)
            }
        }
    }

    async fn scan_results(&self) -> WifiResult<Option<Vec<RawScanRecord>>> {
        let mut ctrl = self.open_ctrl()?;
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut command = format!("BSS FIRST {}", BSS_FIELD_MASK);

        while records.len() < MAX_BSS_ENTRIES {
            let reply = self.bss_request(&mut ctrl, &command).await?;
            let Some(entry) = parse_bss_entry(&reply) else {
                break;
            };
            if !seen.insert(entry.id) {
                warn!(id = entry.id, "BSS table walk revisited an entry");
                break;
            }

            command = format!("BSS NEXT-{} {}", entry.id, BSS_FIELD_MASK);
            records.push(entry.record);
        }

        debug!("Read {} scan results", records.len());
        Ok(Some(records))
    }

    async fn subscribe_scan_completed(&self) -> WifiResult<ScanSubscription> {
        let ctrl = self.open_ctrl()?;
        ctrl.request_ok("ATTACH")
            .await
            .map_err(|e| WifiError::SubscriptionFailed(e.to_string()))?;

        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(monitor_scan_events(ctrl, tx));
        self.lock_monitors().insert(id, task);

        debug!(%id, "Subscribed to scan events");
        Ok(ScanSubscription { id, completed: rx })
    }

    fn unsubscribe_scan_completed(&self, id: SubscriptionId) {
        // Aborting drops the monitor socket; wpa_supplicant prunes the
        // detached monitor on its next failed delivery.
        if let Some(task) = self.lock_monitors().remove(&id) {
            task.abort();
            debug!(%id, "Unsubscribed from scan events");
        }
    }
}

impl Drop for WpactrlBackend {
    fn drop(&mut self) {
        for (_, task) in self.lock_monitors().drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ctrl_socket::MAX_REPLY_SIZE;
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::net::UnixDatagram;

    /// Scripted wpa_supplicant: replies to each command with the mapped text
    fn spawn_fake_supplicant(
        path: &Path,
        replies: HashMap<&'static str, String>,
    ) -> JoinHandle<()> {
        let server = UnixDatagram::bind(path).unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((n, peer)) = server.recv_from(&mut buf).await else {
                    break;
                };
                let command = String::from_utf8_lossy(&buf[..n]).to_string();
                let reply = replies
                    .get(command.as_str())
                    .cloned()
                    .unwrap_or_else(|| "UNKNOWN COMMAND\n".to_string());
                if let Some(peer) = peer.as_pathname() {
                    let _ = server.send_to(reply.as_bytes(), peer).await;
                }
                if command == "ATTACH" {
                    if let Some(peer) = peer.as_pathname() {
                        let _ = server
                            .send_to(b"<3>CTRL-EVENT-SCAN-STARTED ", peer)
                            .await;
                        let _ = server
                            .send_to(b"<2>CTRL-EVENT-SCAN-RESULTS ", peer)
                            .await;
                    }
                }
            }
        })
    }

    /// Scripted BSS table; ids start at [`FIRST_BSS_ID`]
    ///
    /// The first reply is held back by `first_reply_delay`.
    fn spawn_bss_supplicant(
        path: &Path,
        entries: Vec<String>,
        first_reply_delay: Duration,
    ) -> JoinHandle<()> {
        let server = Arc::new(UnixDatagram::bind(path).unwrap());
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            let mut delay = first_reply_delay;
            loop {
                let Ok((n, peer)) = server.recv_from(&mut buf).await else {
                    break;
                };
                let Some(peer) = peer.as_pathname().map(Path::to_path_buf) else {
                    continue;
                };
                let command = String::from_utf8_lossy(&buf[..n]).to_string();

                let index = if command.starts_with("BSS FIRST") {
                    Some(0)
                } else {
                    command
                        .strip_prefix("BSS NEXT-")
                        .and_then(|rest| rest.split_whitespace().next())
                        .and_then(|id| id.parse::<u64>().ok())
                        .map(|id| (id - FIRST_BSS_ID + 1) as usize)
                };
                let reply = index
                    .and_then(|i| entries.get(i))
                    .cloned()
                    .unwrap_or_default();

                let server = server.clone();
                let wait = std::mem::take(&mut delay);
                tokio::spawn(async move {
                    tokio::time::sleep(wait).await;
                    let _ = server.send_to(reply.as_bytes(), &peer).await;
                });
            }
        })
    }

    const FIRST_BSS_ID: u64 = 40;

    fn bss_reply(index: usize, bssid: &str, freq: i32, ssid: &str, ies: &[u8]) -> String {
        format!(
            "id={}\nbssid={}\nfreq={}\nlevel=-55\nie={}\nssid={}\n",
            FIRST_BSS_ID + index as u64,
            bssid,
            freq,
            hex::encode(ies),
            ssid
        )
    }

    /// HT capabilities + HT operation, 40 MHz above
    fn ht40_ies() -> Vec<u8> {
        [
            vec![45u8, 26],
            vec![0u8; 26],
            vec![61u8, 6, 1, 0x05, 0, 0, 0, 0],
        ]
        .concat()
    }

    /// SSID element only
    fn legacy_ies(ssid: &str) -> Vec<u8> {
        [vec![0u8, ssid.len() as u8], ssid.as_bytes().to_vec()].concat()
    }

    #[test]
    fn test_parse_bss_entry() {
        let output = format!(
            "id=3\nbssid=01:02:03:04:05:06\nfreq=2412\nlevel=-50\nie={}\nssid=MyNetwork\n",
            hex::encode(ht40_ies())
        );
        let entry = parse_bss_entry(&output).unwrap();

        assert_eq!(entry.id, 3);
        assert_eq!(
            entry.record,
            RawScanRecord {
                ssid: Some("MyNetwork".into()),
                bssid: Some("01:02:03:04:05:06".into()),
                frequency: 2412,
                level: -50,
                channel_width: Some(1),
                center_freq0: Some(2422),
                center_freq1: Some(0),
                wifi_standard: Some(4),
            }
        );
    }

    #[test]
    fn test_parse_bss_entry_falls_back_to_beacon_ies() {
        let output = "id=7\nbssid=01:02:03:04:05:06\nfreq=2412\nie=\nbeacon_ie=00024142\n";
        let entry = parse_bss_entry(output).unwrap();
        assert_eq!(entry.record.wifi_standard, Some(1));
    }

    #[test]
    fn test_parse_bss_entry_is_best_effort() {
        let entry = parse_bss_entry("id=9\nbssid=\nfreq=abc\nie=zz\n").unwrap();

        assert_eq!(entry.record.bssid, None);
        assert_eq!(entry.record.ssid, None);
        assert_eq!(entry.record.frequency, 0);
        assert_eq!(entry.record.wifi_standard, None);
        assert_eq!(entry.record.channel_width, None);
    }

    #[test]
    fn test_parse_bss_entry_end_of_table() {
        assert_eq!(parse_bss_entry(""), None);
        assert_eq!(parse_bss_entry("FAIL\n"), None);
        assert_eq!(parse_bss_entry("bssid=01:02:03:04:05:06\n"), None);
    }

    #[test]
    fn test_scan_event() {
        assert_eq!(
            scan_event("<2>CTRL-EVENT-SCAN-RESULTS "),
            Some(ScanCompleted { success: true })
        );
        assert_eq!(
            scan_event("<3>CTRL-EVENT-SCAN-FAILED ret=-16 retry=1"),
            Some(ScanCompleted { success: false })
        );
        assert_eq!(scan_event("<3>CTRL-EVENT-SCAN-STARTED "), None);
    }

    #[tokio::test]
    async fn test_trigger_scan_replies() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34));
        let _server = spawn_fake_supplicant(
            backend.ctrl_path(),
            HashMap::from([("SCAN", "FAIL-BUSY\n".to_string())]),
        );

        assert!(!backend.trigger_scan().await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_results_walk_bss_table_in_order() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34));
        let _server = spawn_bss_supplicant(
            backend.ctrl_path(),
            vec![
                bss_reply(0, "01:02:03:04:05:06", 2412, "First", &ht40_ies()),
                bss_reply(1, "0a:0b:0c:0d:0e:0f", 2437, "Second", &legacy_ies("Second")),
            ],
            Duration::ZERO,
        );

        let records = backend.scan_results().await.unwrap().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].ssid.as_deref(), Some("First"));
        assert_eq!(records[0].wifi_standard, Some(4));
        assert_eq!(records[0].channel_width, Some(1));
        assert_eq!(records[0].center_freq0, Some(2422));

        assert_eq!(records[1].ssid.as_deref(), Some("Second"));
        assert_eq!(records[1].wifi_standard, Some(1));
        assert_eq!(records[1].channel_width, Some(0));
    }

    #[tokio::test]
    async fn test_scan_results_empty_table() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34));
        let _server = spawn_bss_supplicant(backend.ctrl_path(), vec![], Duration::ZERO);

        assert_eq!(backend.scan_results().await, Ok(Some(vec![])));
    }

    #[tokio::test]
    async fn test_scan_results_beyond_single_reply_size() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34));
        let entries: Vec<String> = (0..60)
            .map(|i| {
                bss_reply(
                    i,
                    &format!("02:00:00:00:00:{:02x}", i),
                    2412,
                    &format!("dense-network-{:02}", i),
                    &ht40_ies(),
                )
            })
            .collect();
        assert!(entries.iter().map(String::len).sum::<usize>() > MAX_REPLY_SIZE);
        let _server = spawn_bss_supplicant(backend.ctrl_path(), entries, Duration::ZERO);

        let records = backend.scan_results().await.unwrap().unwrap();

        assert_eq!(records.len(), 60);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.bssid, Some(format!("02:00:00:00:00:{:02x}", i)));
            assert_eq!(record.wifi_standard, Some(4));
        }
    }

    #[tokio::test]
    async fn test_missed_reply_does_not_shift_records() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34))
            .with_reply_timeout(Duration::from_millis(100));
        let _server = spawn_bss_supplicant(
            backend.ctrl_path(),
            vec![
                bss_reply(0, "0a:00:00:00:00:01", 2412, "A", &ht40_ies()),
                bss_reply(1, "0a:00:00:00:00:02", 2437, "B", &legacy_ies("B")),
            ],
            Duration::from_millis(300),
        );

        let records = backend.scan_results().await.unwrap().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bssid.as_deref(), Some("0a:00:00:00:00:01"));
        assert_eq!(records[0].wifi_standard, Some(4));
        assert_eq!(records[1].bssid.as_deref(), Some("0a:00:00:00:00:02"));
        assert_eq!(records[1].wifi_standard, Some(1));

        // Late reply to the abandoned socket must not surface anywhere
        tokio::time::sleep(Duration::from_millis(300)).await;
        let again = backend.scan_results().await.unwrap().unwrap();
        assert_eq!(again, records);
    }

    #[tokio::test]
    async fn test_subscribe_forwards_scan_results_event() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34));
        let _server = spawn_fake_supplicant(
            backend.ctrl_path(),
            HashMap::from([("ATTACH", "OK\n".to_string()), ("DETACH", "OK\n".to_string())]),
        );

        let subscription = backend.subscribe_scan_completed().await.unwrap();
        let event = subscription.completed.await.unwrap();
        assert!(event.success);

        backend.unsubscribe_scan_completed(subscription.id);
        assert!(backend.lock_monitors().is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_rejected_attach() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34));
        let _server = spawn_fake_supplicant(
            backend.ctrl_path(),
            HashMap::from([("ATTACH", "FAIL\n".to_string())]),
        );

        let result = backend.subscribe_scan_completed().await;
        assert!(matches!(result, Err(WifiError::SubscriptionFailed(_))));
    }

    #[tokio::test]
    async fn test_backend_unavailable_without_supplicant() {
        let dir = tempdir().unwrap();
        let backend = WpactrlBackend::new("wlan0".into(), dir.path(), PlatformVersion(34));

        assert!(matches!(
            backend.scan_results().await,
            Err(WifiError::BackendUnavailable(_))
        ));
    }
}
