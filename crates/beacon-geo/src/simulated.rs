//! Simulated location provider for development and tests.
//!
//! Positions are driven externally via [`SimulatedProvider::set_position`]
//! (or the daemon's walk task) and fan out to every open stream. The
//! subscription options' interval/distance filtering is not simulated.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use beacon_core::error::AppError;
use beacon_core::result::AppResult;
use beacon_core::traits::location::{
    FixStream, LocationProvider, PermissionGrant, RawFix, SubscriptionOptions,
};

/// Driven location provider.
#[derive(Debug)]
pub struct SimulatedProvider {
    /// Most recent fix, served to one-shot requests.
    current: Mutex<Option<RawFix>>,
    /// Fan-out channel feeding open streams.
    tx: broadcast::Sender<RawFix>,
    /// When set, foreground permission is denied.
    deny_foreground: AtomicBool,
    /// When set, background permission is denied.
    deny_background: AtomicBool,
    /// When set, one-shot requests fail.
    fail_one_shot: AtomicBool,
    /// Number of streams opened over the provider's lifetime.
    streams_opened: AtomicU64,
}

impl SimulatedProvider {
    /// Create a provider with no fix yet.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            current: Mutex::new(None),
            tx,
            deny_foreground: AtomicBool::new(false),
            deny_background: AtomicBool::new(false),
            fail_one_shot: AtomicBool::new(false),
            streams_opened: AtomicU64::new(0),
        }
    }

    /// Create a provider with an initial position.
    pub fn with_position(latitude: f64, longitude: f64) -> Self {
        let provider = Self::new();
        provider.set_position(latitude, longitude);
        provider
    }

    /// Move the simulated device, timestamping the fix with the current
    /// wall clock.
    pub fn set_position(&self, latitude: f64, longitude: f64) {
        self.set_fix(RawFix {
            latitude,
            longitude,
            accuracy_m: Some(5.0),
            heading_deg: None,
            speed_mps: None,
            timestamp_ms: Utc::now().timestamp_millis(),
        });
    }

    /// Deliver a fully specified fix (tests control the timestamp).
    pub fn set_fix(&self, fix: RawFix) {
        *self.current.lock().unwrap() = Some(fix.clone());
        // No receiver just means no open stream yet.
        let _ = self.tx.send(fix);
    }

    /// Deny foreground permission on subsequent requests.
    pub fn set_deny_foreground(&self, deny: bool) {
        self.deny_foreground.store(deny, Ordering::SeqCst);
    }

    /// Deny background permission on subsequent requests.
    pub fn set_deny_background(&self, deny: bool) {
        self.deny_background.store(deny, Ordering::SeqCst);
    }

    /// Make one-shot requests fail.
    pub fn set_fail_one_shot(&self, fail: bool) {
        self.fail_one_shot.store(fail, Ordering::SeqCst);
    }

    /// Number of streams opened over the provider's lifetime.
    pub fn streams_opened(&self) -> u64 {
        self.streams_opened.load(Ordering::SeqCst)
    }

    /// Spawn a task that drifts the position around `origin` on a fixed
    /// cadence. Used by the daemon; abort the handle to stop.
    pub fn start_walk(
        provider: &std::sync::Arc<Self>,
        origin: (f64, f64),
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let provider = std::sync::Arc::clone(provider);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            let mut tick = 0u64;
            loop {
                timer.tick().await;
                let t = tick as f64;
                let latitude = origin.0 + 0.0005 * (t * 0.13).sin();
                let longitude = origin.1 + 0.0005 * (t * 0.07).cos();
                provider.set_position(latitude, longitude);
                tick += 1;
            }
        })
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for SimulatedProvider {
    fn provider_type(&self) -> &str {
        "simulated"
    }

    async fn request_permission(&self, background: bool) -> AppResult<PermissionGrant> {
        Ok(PermissionGrant {
            foreground: !self.deny_foreground.load(Ordering::SeqCst),
            background: background && !self.deny_background.load(Ordering::SeqCst),
        })
    }

    async fn current_fix(&self, _timeout: Duration, _max_age: Duration) -> AppResult<RawFix> {
        if self.fail_one_shot.load(Ordering::SeqCst) {
            return Err(AppError::provider_unavailable("injected one-shot failure"));
        }
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::provider_unavailable("no fix available yet"))
    }

    async fn open_stream(&self, options: SubscriptionOptions) -> AppResult<FixStream> {
        debug!(accuracy = options.accuracy.as_str(), "Opening simulated fix stream");
        self.streams_opened.fetch_add(1, Ordering::SeqCst);

        let rx = self.tx.subscribe();
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(fix) => return Some((fix, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Simulated fix stream lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn options() -> SubscriptionOptions {
        SubscriptionOptions {
            accuracy: beacon_core::traits::location::AccuracyProfile::Balanced,
            min_interval: Duration::from_millis(100),
            min_distance_m: 0.0,
        }
    }

    #[tokio::test]
    async fn test_stream_delivers_positions() {
        let provider = SimulatedProvider::new();
        let mut stream = provider.open_stream(options()).await.unwrap();
        provider.set_position(1.0, 2.0);
        let fix = stream.next().await.unwrap();
        assert_eq!(fix.latitude, 1.0);
        assert_eq!(fix.longitude, 2.0);
    }

    #[tokio::test]
    async fn test_one_shot_requires_a_fix() {
        let provider = SimulatedProvider::new();
        let err = provider
            .current_fix(Duration::from_secs(1), Duration::from_secs(30))
            .await
            .unwrap_err();
        assert_eq!(err.kind, beacon_core::error::ErrorKind::ProviderUnavailable);

        provider.set_position(3.0, 4.0);
        let fix = provider
            .current_fix(Duration::from_secs(1), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(fix.latitude, 3.0);
    }

    #[tokio::test]
    async fn test_permission_denial_is_expressed_in_grant() {
        let provider = SimulatedProvider::new();
        provider.set_deny_background(true);
        let grant = provider.request_permission(true).await.unwrap();
        assert!(grant.foreground);
        assert!(!grant.background);
    }
}
