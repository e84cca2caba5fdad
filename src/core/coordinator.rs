//! Scan request coordination
//!
//! One request runs one cycle: permission check, scan trigger, wait for the
//! completion signal (bounded by a timeout), result fetch, normalization and
//! delivery. Only one cycle may be in flight; further requests are answered
//! with [`ScanError::Busy`].

use futures::FutureExt;
use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::{
    backend::{PermissionProvider, WifiBackend},
    core::{
        capabilities::Capabilities,
        error::{ScanError, ScanResult},
        normalizer::ScanResultNormalizer,
        types::{
            NormalizedScanRecord, RequestTicket, ScanCompletion, ScanPhase, ScanSubscription,
            SubscriptionId,
        },
    },
};

/// Default bound on the wait for a scan completion signal
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(8);

/// Outcome of one scan request
pub type ScanResponse = ScanResult<Vec<NormalizedScanRecord>>;

/// Caller's handle for the response to one request
///
/// Delivery consumes the handle, so a response can be sent at most once.
#[derive(Debug)]
pub struct Responder {
    tx: oneshot::Sender<ScanResponse>,
}

impl Responder {
    /// Create a handle and the receiver the response arrives on
    pub fn channel() -> (Self, oneshot::Receiver<ScanResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    fn deliver(self, response: ScanResponse) {
        if self.tx.send(response).is_err() {
            debug!("Caller went away before the response was delivered");
        }
    }
}

/// Request occupying the in-flight slot
#[derive(Debug)]
struct PendingRequest {
    ticket: RequestTicket,
    responder: Responder,
    accepted_at: Instant,
}

#[derive(Debug)]
struct CycleSlot {
    phase: ScanPhase,
    pending: Option<PendingRequest>,
}

impl CycleSlot {
    fn new() -> Self {
        Self {
            phase: ScanPhase::Idle,
            pending: None,
        }
    }

    /// Take the slot for a new request
    ///
    /// Hands the responder back if a cycle is already running.
    fn claim(&mut self, responder: Responder) -> Result<RequestTicket, Responder> {
        match self.phase {
            ScanPhase::Idle => {
                let ticket = RequestTicket::new();
                self.phase = ScanPhase::PermissionChecking;
                self.pending = Some(PendingRequest {
                    ticket,
                    responder,
                    accepted_at: Instant::now(),
                });
                Ok(ticket)
            }
            _ => Err(responder),
        }
    }

    /// Empty the slot, returning the request still awaiting its response
    fn release(&mut self) -> Option<PendingRequest> {
        self.phase = ScanPhase::Idle;
        self.pending.take()
    }
}

/// Exclusive right to run the current cycle
///
/// Dropping it without delivering answers the caller with an error and
/// frees the slot, whatever the reason for the early exit.
struct InFlight<'a> {
    slot: &'a Mutex<CycleSlot>,
    ticket: RequestTicket,
}

impl InFlight<'_> {
    fn advance(&self, phase: ScanPhase) {
        lock(self.slot).phase = phase;
        debug!(ticket = %self.ticket, ?phase, "Scan cycle phase");
    }

    fn deliver(self, response: ScanResponse) {
        let pending = {
            let mut slot = lock(self.slot);
            slot.phase = ScanPhase::Delivering;
            slot.release()
        };

        if let Some(pending) = pending {
            match &response {
                Ok(records) => info!(
                    ticket = %pending.ticket,
                    records = records.len(),
                    elapsed_ms = pending.accepted_at.elapsed().as_millis() as u64,
                    "Scan request completed"
                ),
                Err(e) => warn!(
                    ticket = %pending.ticket,
                    kind = e.kind(),
                    "Scan request failed: {}",
                    e
                ),
            }
            pending.responder.deliver(response);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let pending = lock(self.slot).release();
        if let Some(pending) = pending {
            error!(ticket = %pending.ticket, "Scan cycle aborted before delivery");
            pending
                .responder
                .deliver(Err(ScanError::Native("Scan cycle aborted".into())));
        }
    }
}

/// Scoped scan completion subscription
///
/// Released on drop, exactly once.
struct SubscriptionGuard<'a, B: WifiBackend> {
    backend: &'a B,
    id: SubscriptionId,
}

impl<B: WifiBackend> Drop for SubscriptionGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.unsubscribe_scan_completed(self.id);
    }
}

fn lock(slot: &Mutex<CycleSlot>) -> MutexGuard<'_, CycleSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Coordinates scan requests against a Wi-Fi backend
pub struct ScanCoordinator<B: WifiBackend, P: PermissionProvider> {
    backend: Arc<B>,
    permissions: Arc<P>,
    normalizer: ScanResultNormalizer,
    scan_timeout: Duration,
    slot: Mutex<CycleSlot>,
}

impl<B: WifiBackend, P: PermissionProvider> ScanCoordinator<B, P> {
    /// Create a coordinator; capabilities are resolved from the backend's platform
    pub fn new(backend: Arc<B>, permissions: Arc<P>, scan_timeout: Duration) -> Self {
        let capabilities = Capabilities::resolve(backend.platform_version());
        info!(?capabilities, ?scan_timeout, "Scan coordinator ready");

        Self {
            backend,
            permissions,
            normalizer: ScanResultNormalizer::new(capabilities),
            scan_timeout,
            slot: Mutex::new(CycleSlot::new()),
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.normalizer.capabilities()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ScanPhase {
        lock(&self.slot).phase
    }

    /// Run one request and wait for its response
    pub async fn scan_standards(&self) -> ScanResponse {
        let (responder, response) = Responder::channel();
        self.request_scan_standards(responder).await;
        response
            .await
            .unwrap_or_else(|_| Err(ScanError::Native("Response channel closed".into())))
    }

    /// Run one request, answering through `responder` exactly once
    pub async fn request_scan_standards(&self, responder: Responder) {
        let ticket = match lock(&self.slot).claim(responder) {
            Ok(ticket) => ticket,
            Err(responder) => {
                warn!("Rejecting scan request: another request is in flight");
                responder.deliver(Err(ScanError::Busy));
                return;
            }
        };

        let cycle = InFlight {
            slot: &self.slot,
            ticket,
        };
        debug!(%ticket, "Scan request accepted");

        let response = AssertUnwindSafe(self.run_cycle(&cycle))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ScanError::Native(format!(
                    "Scan cycle panicked: {}",
                    panic_message(panic)
                )))
            });

        cycle.deliver(response);
    }

    async fn run_cycle(&self, cycle: &InFlight<'_>) -> ScanResponse {
        let permission = self.capabilities().permission;
        if !self.permissions.is_granted(permission).await {
            return Err(ScanError::PermissionDenied(permission));
        }

        cycle.advance(ScanPhase::Scanning);
        let completion = self.await_fresh_results().await;
        if completion.is_degraded() {
            warn!(?completion, "Reporting cached scan results");
        } else {
            debug!(?completion, "Scan completed");
        }

        cycle.advance(ScanPhase::Fetching);
        let raw = self.backend.scan_results().await?.unwrap_or_default();

        Ok(self.normalizer.normalize_all(&raw))
    }

    /// Trigger a scan and wait for it to finish, bounded by the timeout
    async fn await_fresh_results(&self) -> ScanCompletion {
        match self.backend.trigger_scan().await {
            Ok(true) => {}
            Ok(false) => return ScanCompletion::TriggerRejected,
            Err(e) => return ScanCompletion::TriggerFailed(e.to_string()),
        }

        let ScanSubscription { id, completed } = match self.backend.subscribe_scan_completed().await
        {
            Ok(subscription) => subscription,
            Err(e) => return ScanCompletion::SubscriptionFailed(e.to_string()),
        };
        let _subscription = SubscriptionGuard {
            backend: &*self.backend,
            id,
        };

        match tokio::time::timeout(self.scan_timeout, completed).await {
            Ok(Ok(event)) => ScanCompletion::Signalled {
                success: event.success,
            },
            Ok(Err(_)) => ScanCompletion::SignalLost,
            Err(_) => ScanCompletion::TimedOut,
        }
    }
}
