//! Geo sampler — wraps the device location provider and owns the single
//! active subscription.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use beacon_core::config::geo::GeoConfig;
use beacon_core::error::AppError;
use beacon_core::result::AppResult;
use beacon_core::traits::location::{
    AccuracyProfile, LocationProvider, PermissionGrant, RawFix, SubscriptionOptions,
};
use beacon_entity::location::LocationSample;

/// Handle to the active location subscription.
///
/// Cloneable; `cancel` is idempotent and safe to call from any task.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    token: CancellationToken,
}

impl SubscriptionHandle {
    /// Stop the subscription. No further samples are delivered.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the subscription is still delivering samples.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// Convert a raw provider fix into the canonical sample type.
fn canonical(fix: RawFix) -> LocationSample {
    LocationSample {
        latitude: fix.latitude,
        longitude: fix.longitude,
        accuracy_m: fix.accuracy_m,
        heading_deg: fix.heading_deg,
        speed_mps: fix.speed_mps,
        timestamp_ms: fix.timestamp_ms,
    }
}

/// Wrapper over the device location provider.
///
/// At most one subscription is active per process; subscribing while
/// already subscribed returns the existing handle.
#[derive(Debug)]
pub struct GeoSampler {
    /// The underlying device provider.
    provider: Arc<dyn LocationProvider>,
    /// Sampling configuration.
    config: GeoConfig,
    /// Last successful sample; graceful-degradation fallback for one-shots.
    last_sample: Arc<Mutex<Option<LocationSample>>>,
    /// The single active subscription slot.
    active: tokio::sync::Mutex<Option<SubscriptionHandle>>,
    /// Permission grant once obtained.
    permission: Mutex<Option<PermissionGrant>>,
}

impl GeoSampler {
    /// Create a new sampler over a provider.
    pub fn new(provider: Arc<dyn LocationProvider>, config: GeoConfig) -> Self {
        Self {
            provider,
            config,
            last_sample: Arc::new(Mutex::new(None)),
            active: tokio::sync::Mutex::new(None),
            permission: Mutex::new(None),
        }
    }

    /// Request location permission from the provider.
    ///
    /// Must succeed (or be explicitly tolerated by the caller) before any
    /// sampling call. Background denial degrades to foreground-only
    /// sampling and is not an error.
    pub async fn initialize(&self) -> AppResult<()> {
        self.ensure_permission().await.map(|_| ())
    }

    /// Request permission lazily, caching a successful foreground grant.
    async fn ensure_permission(&self) -> AppResult<PermissionGrant> {
        if let Some(grant) = *self.permission.lock().unwrap() {
            if grant.foreground {
                return Ok(grant);
            }
        }

        let grant = self
            .provider
            .request_permission(self.config.request_background)
            .await?;
        *self.permission.lock().unwrap() = Some(grant);

        if !grant.foreground {
            return Err(AppError::permission_denied(
                "foreground location permission not granted",
            ));
        }
        if self.config.request_background && !grant.background {
            debug!("background location permission denied; foreground-only sampling");
        }
        Ok(grant)
    }

    /// One-shot location request.
    ///
    /// On provider failure the last cached sample is served instead;
    /// only when no sample was ever obtained does the call fail with
    /// a provider-unavailable error.
    pub async fn current_location(&self) -> AppResult<LocationSample> {
        self.ensure_permission().await?;

        let timeout = Duration::from_millis(self.config.one_shot_timeout_ms);
        let max_age = Duration::from_millis(self.config.max_sample_age_ms);

        match self.provider.current_fix(timeout, max_age).await {
            Ok(fix) => {
                let sample = canonical(fix);
                *self.last_sample.lock().unwrap() = Some(sample);
                Ok(sample)
            }
            Err(e) => {
                let fallback = *self.last_sample.lock().unwrap();
                match fallback {
                    Some(sample) => {
                        debug!(error = %e, "One-shot fix failed; serving last known sample");
                        Ok(sample)
                    }
                    None => Err(AppError::provider_unavailable(format!(
                        "no location sample available: {}",
                        e.message
                    ))),
                }
            }
        }
    }

    /// Start the continuous sample stream, delivering each canonical
    /// sample to `on_sample` until the returned handle is cancelled.
    ///
    /// Calling `subscribe` while a subscription is active is a no-op
    /// that returns the existing handle. The slot lock is held across
    /// the permission request and stream open, so a concurrent cancel
    /// observes either no subscription or a fully started one.
    pub async fn subscribe<F>(&self, on_sample: F) -> AppResult<SubscriptionHandle>
    where
        F: Fn(LocationSample) + Send + Sync + 'static,
    {
        let mut slot = self.active.lock().await;
        if let Some(handle) = slot.as_ref() {
            if handle.is_active() {
                debug!("subscribe called while already subscribed; returning existing handle");
                return Ok(handle.clone());
            }
        }

        self.ensure_permission().await?;

        let options = SubscriptionOptions {
            accuracy: AccuracyProfile::from_str_or_default(&self.config.accuracy),
            min_interval: Duration::from_millis(self.config.min_interval_ms),
            min_distance_m: self.config.min_distance_m,
        };
        let mut stream = self.provider.open_stream(options).await?;

        let token = CancellationToken::new();
        let handle = SubscriptionHandle {
            token: token.clone(),
        };
        let last_sample = Arc::clone(&self.last_sample);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    next = stream.next() => match next {
                        Some(fix) => {
                            let sample = canonical(fix);
                            *last_sample.lock().unwrap() = Some(sample);
                            on_sample(sample);
                        }
                        None => {
                            debug!("provider fix stream ended");
                            break;
                        }
                    },
                }
            }
        });

        info!("location subscription started");
        *slot = Some(handle.clone());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedProvider;

    fn sampler_over(provider: &Arc<SimulatedProvider>) -> GeoSampler {
        GeoSampler::new(
            Arc::clone(provider) as Arc<dyn LocationProvider>,
            GeoConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let provider = Arc::new(SimulatedProvider::new());
        let sampler = sampler_over(&provider);

        let h1 = sampler.subscribe(|_| {}).await.unwrap();
        let h2 = sampler.subscribe(|_| {}).await.unwrap();
        assert_eq!(provider.streams_opened(), 1);
        assert!(h1.is_active() && h2.is_active());
    }

    #[tokio::test]
    async fn test_cancel_allows_resubscribe() {
        let provider = Arc::new(SimulatedProvider::new());
        let sampler = sampler_over(&provider);

        let handle = sampler.subscribe(|_| {}).await.unwrap();
        handle.cancel();
        handle.cancel(); // repeated cancel is safe
        let _ = sampler.subscribe(|_| {}).await.unwrap();
        assert_eq!(provider.streams_opened(), 2);
    }

    #[tokio::test]
    async fn test_one_shot_falls_back_to_last_sample() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.set_position(10.0, 20.0);
        let sampler = sampler_over(&provider);

        let first = sampler.current_location().await.unwrap();
        assert_eq!(first.latitude, 10.0);

        provider.set_fail_one_shot(true);
        let degraded = sampler.current_location().await.unwrap();
        assert_eq!(degraded.latitude, 10.0);
    }

    #[tokio::test]
    async fn test_one_shot_without_any_fix_errors() {
        let provider = Arc::new(SimulatedProvider::new());
        let sampler = sampler_over(&provider);

        let err = sampler.current_location().await.unwrap_err();
        assert_eq!(err.kind, beacon_core::error::ErrorKind::ProviderUnavailable);
    }

    #[tokio::test]
    async fn test_permission_gate() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.set_deny_foreground(true);
        let sampler = sampler_over(&provider);

        assert!(sampler.initialize().await.is_err());
        assert!(sampler.subscribe(|_| {}).await.is_err());
    }
}
