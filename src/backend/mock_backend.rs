//! Mock Wi-Fi backend for testing

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Mutex, oneshot};

use crate::backend::{PermissionProvider, WifiBackend};
use crate::core::{
    capabilities::{PermissionFamily, PlatformVersion},
    error::{WifiError, WifiResult},
    types::{RawScanRecord, ScanCompleted, ScanSubscription, SubscriptionId},
};

/// When the mock publishes a scan completion event after subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMode {
    /// Fire right away with the given success flag
    Immediate(bool),
    /// Fire after a delay
    Delayed(Duration, bool),
    /// Only fire through [`MockWifiBackend::fire_scan_completed`]
    Never,
}

/// Internal state for the mock backend
#[derive(Debug, Clone)]
struct MockState {
    scan_results: Option<Vec<RawScanRecord>>,
    trigger_accepted: bool,
    should_fail_trigger: bool,
    should_fail_results: bool,
    should_fail_subscribe: bool,
    should_panic_results: bool,
    signal_mode: SignalMode,
}

type Subscribers = std::sync::Mutex<HashMap<SubscriptionId, oneshot::Sender<ScanCompleted>>>;

/// Mock Wi-Fi backend for testing
///
/// Allows configuring behavior for tests without requiring actual hardware.
#[derive(Debug, Clone)]
pub struct MockWifiBackend {
    platform: PlatformVersion,
    inner: Arc<Mutex<MockState>>,
    subscribers: Arc<Subscribers>,
    next_subscription: Arc<AtomicU64>,
    triggers: Arc<AtomicUsize>,
    subscribes: Arc<AtomicUsize>,
    unsubscribes: Arc<AtomicUsize>,
    fetches: Arc<AtomicUsize>,
}

impl MockWifiBackend {
    /// Create a new mock backend on a recent platform
    pub fn new() -> Self {
        Self::with_platform(PlatformVersion(34))
    }

    pub fn with_platform(platform: PlatformVersion) -> Self {
        Self {
            platform,
            inner: Arc::new(Mutex::new(MockState {
                scan_results: Some(vec![]),
                trigger_accepted: true,
                should_fail_trigger: false,
                should_fail_results: false,
                should_fail_subscribe: false,
                should_panic_results: false,
                signal_mode: SignalMode::Immediate(true),
            })),
            subscribers: Arc::new(std::sync::Mutex::new(HashMap::new())),
            next_subscription: Arc::new(AtomicU64::new(1)),
            triggers: Arc::new(AtomicUsize::new(0)),
            subscribes: Arc::new(AtomicUsize::new(0)),
            unsubscribes: Arc::new(AtomicUsize::new(0)),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the records returned on fetch
    pub async fn set_scan_results(&self, records: Option<Vec<RawScanRecord>>) {
        self.inner.lock().await.scan_results = records;
    }

    /// Configure whether the platform accepts scan triggers
    pub async fn set_trigger_accepted(&self, accepted: bool) {
        self.inner.lock().await.trigger_accepted = accepted;
    }

    /// Configure mock to fail scan triggers with an error
    pub async fn set_trigger_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_trigger = should_fail;
    }

    /// Configure mock to fail result fetches
    pub async fn set_results_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_results = should_fail;
    }

    /// Configure mock to fail subscriptions
    pub async fn set_subscribe_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_subscribe = should_fail;
    }

    /// Configure mock to panic while fetching results
    pub async fn set_results_panic(&self, should_panic: bool) {
        self.inner.lock().await.should_panic_results = should_panic;
    }

    pub async fn set_signal_mode(&self, mode: SignalMode) {
        self.inner.lock().await.signal_mode = mode;
    }

    /// Publish a completion event to every live subscription
    pub fn fire_scan_completed(&self, success: bool) -> usize {
        let senders: Vec<_> = self.lock_subscribers().drain().collect();
        let fired = senders.len();
        for (_, tx) in senders {
            let _ = tx.send(ScanCompleted { success });
        }
        fired
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.load(Ordering::SeqCst)
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Subscriptions not yet released
    pub fn live_subscriptions(&self) -> usize {
        self.lock_subscribers().len()
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, oneshot::Sender<ScanCompleted>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MockWifiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiBackend for MockWifiBackend {
    fn platform_version(&self) -> PlatformVersion {
        self.platform
    }

    async fn trigger_scan(&self) -> WifiResult<bool> {
        self.triggers.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.lock().await;
        if state.should_fail_trigger {
            Err(WifiError::WpaSupplicantError("Mock trigger failure".into()))
        } else {
            Ok(state.trigger_accepted)
        }
    }

    async fn scan_results(&self) -> WifiResult<Option<Vec<RawScanRecord>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.lock().await.clone();
        if state.should_panic_results {
            panic!("mock scan result panic");
        }
        if state.should_fail_results {
            Err(WifiError::BackendUnavailable("Mock fetch failure".into()))
        } else {
            Ok(state.scan_results)
        }
    }

    async fn subscribe_scan_completed(&self) -> WifiResult<ScanSubscription> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let mode = {
            let state = self.inner.lock().await;
            if state.should_fail_subscribe {
                return Err(WifiError::SubscriptionFailed("Mock subscribe failure".into()));
            }
            state.signal_mode
        };

        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = oneshot::channel();

        match mode {
            SignalMode::Immediate(success) => {
                let _ = tx.send(ScanCompleted { success });
            }
            SignalMode::Delayed(delay, success) => {
                self.lock_subscribers().insert(id, tx);
                let backend = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(tx) = backend.lock_subscribers().remove(&id) {
                        let _ = tx.send(ScanCompleted { success });
                    }
                });
            }
            SignalMode::Never => {
                self.lock_subscribers().insert(id, tx);
            }
        }

        Ok(ScanSubscription { id, completed: rx })
    }

    fn unsubscribe_scan_completed(&self, id: SubscriptionId) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        self.lock_subscribers().remove(&id);
    }
}

/// Mock permission subsystem
#[derive(Debug, Clone)]
pub struct MockPermissions {
    granted: Arc<AtomicBool>,
    checked: Arc<std::sync::Mutex<Vec<PermissionFamily>>>,
}

impl MockPermissions {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(granted)),
            checked: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    /// Permissions asked for so far
    pub fn checked(&self) -> Vec<PermissionFamily> {
        self.checked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl PermissionProvider for MockPermissions {
    async fn is_granted(&self, permission: PermissionFamily) -> bool {
        self.checked
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(permission);
        self.granted.load(Ordering::SeqCst)
    }
}
