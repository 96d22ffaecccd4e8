//! Poll controller.
//!
//! Owns the refresh cadence and all mutable fetch state. Cycles are
//! strictly sequential: one `tokio::select!` loop alternates between the
//! interval ticker and a manual-refresh channel, and a fetch is always
//! awaited to completion before the next cycle can start. A manual
//! refresh requested while a cycle is in flight queues behind it (channel
//! capacity 1); further requests while one is queued are dropped.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use tallybar_core::UsageSnapshot;
use tallybar_fetch::{CredentialSource, FetchError, UsageSource};

use crate::sink::{DisplaySink, SnapshotView};

// ============================================================================
// Poll State
// ============================================================================

/// Mutable state owned by the poll controller.
///
/// Single writer: only the controller's own loop touches this.
#[derive(Debug, Default)]
pub struct PollState {
    /// Most recent snapshot, replaced wholesale every cycle.
    pub last_snapshot: Option<UsageSnapshot>,
    /// True iff the most recent completed fetch ended in error. Used only
    /// to suppress repeated failure notifications.
    pub last_fetch_failed: bool,
}

// ============================================================================
// Refresh Handle
// ============================================================================

/// Requests an immediate fetch, e.g. from a signal handler.
#[derive(Debug, Clone)]
pub struct RefreshHandle(mpsc::Sender<()>);

impl RefreshHandle {
    /// Queues a manual refresh. Returns false if one is already queued.
    pub fn request(&self) -> bool {
        self.0.try_send(()).is_ok()
    }
}

// ============================================================================
// Poller
// ============================================================================

/// The poll controller.
///
/// Generic over its three collaborators so the state machine is testable
/// without a network, a credentials file, or a terminal.
pub struct Poller<S, C, D> {
    source: S,
    credentials: C,
    sink: D,
    interval: Duration,
    state: PollState,
    refresh_rx: mpsc::Receiver<()>,
}

impl<S, C, D> Poller<S, C, D>
where
    S: UsageSource,
    C: CredentialSource,
    D: DisplaySink,
{
    /// Creates a poller and the handle used to trigger manual refreshes.
    pub fn new(source: S, credentials: C, sink: D, interval: Duration) -> (Self, RefreshHandle) {
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let poller = Self {
            source,
            credentials,
            sink,
            interval,
            state: PollState::default(),
            refresh_rx,
        };
        (poller, RefreshHandle(refresh_tx))
    }

    /// Runs the poll loop forever.
    ///
    /// The first tick fires immediately, so startup gets a fetch without
    /// waiting a full interval.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Poll loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.run_cycle().await;
                }
                Some(()) = self.refresh_rx.recv() => {
                    info!("Manual refresh requested");
                    let _ = self.run_cycle().await;
                    // Re-arm the timer from this fetch's completion.
                    ticker.reset();
                }
            }
        }
    }

    /// Runs exactly one fetch cycle and forwards the outcome to the sink.
    ///
    /// # Errors
    ///
    /// Returns the cycle's `FetchError`, already forwarded to the sink;
    /// callers running continuously ignore it and retry next cycle.
    pub async fn run_cycle(&mut self) -> Result<(), FetchError> {
        match self.fetch_once().await {
            Ok(snapshot) => {
                let view = SnapshotView::build(snapshot.clone(), Utc::now());
                debug!(severity = view.severity.label(), "Fetch cycle succeeded");

                self.state.last_snapshot = Some(snapshot);
                self.state.last_fetch_failed = false;
                self.sink.show_snapshot(&view);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Fetch cycle failed");

                // Alert once per failure streak; a success re-arms it.
                let alert = !self.state.last_fetch_failed;
                self.state.last_snapshot = None;
                self.state.last_fetch_failed = true;
                self.sink.show_error(&err.to_string(), alert);
                Err(err)
            }
        }
    }

    /// One fetch: fresh credentials, one network call, tier merged in.
    async fn fetch_once(&self) -> Result<UsageSnapshot, FetchError> {
        // The token is rotated externally; never reuse last cycle's.
        let creds = self.credentials.load()?;
        let snapshot = self.source.fetch_usage(&creds.access_token).await?;
        Ok(snapshot.with_tier(creds.subscription_tier))
    }

    /// Current poll state.
    pub fn state(&self) -> &PollState {
        &self.state
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tallybar_core::Severity;
    use tallybar_fetch::Credentials;

    struct StubSource {
        responses: Mutex<VecDeque<Result<UsageSnapshot, FetchError>>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(responses: Vec<Result<UsageSnapshot, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl UsageSource for &StubSource {
        async fn fetch_usage(&self, _token: &str) -> Result<UsageSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::Timeout))
        }
    }

    struct StubCredentials(Result<Credentials, FetchError>);

    impl CredentialSource for StubCredentials {
        fn load(&self) -> Result<Credentials, FetchError> {
            self.0.clone()
        }
    }

    fn creds_ok() -> StubCredentials {
        StubCredentials(Ok(Credentials {
            access_token: "sk-ant-oat01-test".to_string(),
            subscription_tier: Some("pro".to_string()),
        }))
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Snapshot(Severity),
        Error { message: String, alert: bool },
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<Event>>>);

    impl RecordingSink {
        fn events(&self) -> Vec<Event> {
            std::mem::take(&mut self.0.lock().unwrap())
        }
    }

    impl DisplaySink for RecordingSink {
        fn show_snapshot(&mut self, view: &SnapshotView) {
            self.0.lock().unwrap().push(Event::Snapshot(view.severity));
        }

        fn show_error(&mut self, message: &str, alert: bool) {
            self.0.lock().unwrap().push(Event::Error {
                message: message.to_string(),
                alert,
            });
        }
    }

    fn snapshot_with(five: f64, seven: f64) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new();
        snapshot.five_hour.utilization = Some(five);
        snapshot.seven_day.utilization = Some(seven);
        snapshot
    }

    #[tokio::test]
    async fn test_success_updates_state_and_sink() {
        let source = StubSource::new(vec![Ok(snapshot_with(30.0, 85.0))]);
        let sink = RecordingSink::default();
        let (mut poller, _handle) =
            Poller::new(&source, creds_ok(), sink.clone(), Duration::from_secs(60));

        poller.run_cycle().await.unwrap();

        assert!(!poller.state().last_fetch_failed);
        let stored = poller.state().last_snapshot.as_ref().unwrap();
        // Tier from the credential source is merged into the snapshot.
        assert_eq!(stored.subscription_tier.as_deref(), Some("pro"));
        assert_eq!(sink.events(), vec![Event::Snapshot(Severity::Warning)]);
    }

    #[tokio::test]
    async fn test_consecutive_failures_alert_once() {
        let source = StubSource::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::DnsFailure),
        ]);
        let sink = RecordingSink::default();
        let (mut poller, _handle) =
            Poller::new(&source, creds_ok(), sink.clone(), Duration::from_secs(60));

        poller.run_cycle().await.unwrap_err();
        poller.run_cycle().await.unwrap_err();

        // Different error classes in the same streak still alert only once.
        assert_eq!(
            sink.events(),
            vec![
                Event::Error {
                    message: "Request timed out".to_string(),
                    alert: true
                },
                Event::Error {
                    message: "DNS resolution failed".to_string(),
                    alert: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_success_rearms_alerting() {
        let source = StubSource::new(vec![
            Err(FetchError::Timeout),
            Ok(snapshot_with(10.0, 5.0)),
            Err(FetchError::Timeout),
        ]);
        let sink = RecordingSink::default();
        let (mut poller, _handle) =
            Poller::new(&source, creds_ok(), sink.clone(), Duration::from_secs(60));

        poller.run_cycle().await.unwrap_err();
        poller.run_cycle().await.unwrap();
        poller.run_cycle().await.unwrap_err();

        let events = sink.events();
        assert!(matches!(events[0], Event::Error { alert: true, .. }));
        assert!(matches!(events[1], Event::Snapshot(Severity::Normal)));
        assert!(matches!(events[2], Event::Error { alert: true, .. }));
    }

    #[tokio::test]
    async fn test_failure_replaces_snapshot() {
        let source = StubSource::new(vec![
            Ok(snapshot_with(10.0, 5.0)),
            Err(FetchError::HttpStatus(500)),
        ]);
        let sink = RecordingSink::default();
        let (mut poller, _handle) =
            Poller::new(&source, creds_ok(), sink.clone(), Duration::from_secs(60));

        poller.run_cycle().await.unwrap();
        assert!(poller.state().last_snapshot.is_some());

        poller.run_cycle().await.unwrap_err();
        assert!(poller.state().last_snapshot.is_none());
        assert!(poller.state().last_fetch_failed);
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let source = StubSource::new(vec![Ok(snapshot_with(10.0, 5.0))]);
        let sink = RecordingSink::default();
        let credentials = StubCredentials(Err(FetchError::MissingToken));
        let (mut poller, _handle) =
            Poller::new(&source, credentials, sink.clone(), Duration::from_secs(60));

        let err = poller.run_cycle().await.unwrap_err();
        assert_eq!(err, FetchError::MissingToken);

        // No network call was made.
        assert_eq!(source.calls(), 0);
        assert_eq!(
            sink.events(),
            vec![Event::Error {
                message: "No access token found".to_string(),
                alert: true
            }]
        );
    }

    #[tokio::test]
    async fn test_refresh_handle_queues_at_most_one() {
        let source = StubSource::new(vec![]);
        let sink = RecordingSink::default();
        let (_poller, handle) =
            Poller::new(&source, creds_ok(), sink, Duration::from_secs(60));

        assert!(handle.request());
        // Second request while one is queued is dropped.
        assert!(!handle.request());
    }
}
