//! Emergency alert dispatch.
//!
//! Independent of the sharing session: an alert can be raised whether
//! or not ambient sharing is active. The location comes from a one-shot
//! request, never the subscription.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use beacon_core::error::{AppError, ErrorKind};
use beacon_core::result::AppResult;
use beacon_core::types::{AlertId, UserId};
use beacon_entity::alert::{AlertKind, EmergencyAlert};
use beacon_geo::{GeoSampler, ReverseGeocoder};
use beacon_store::{RosterManager, RosterStore};

/// Composes and persists emergency alerts.
#[derive(Debug)]
pub struct AlertDispatcher {
    /// The alerting user.
    user_id: UserId,
    /// One-shot location source.
    geo: Arc<GeoSampler>,
    /// Alert persistence.
    store: RosterManager,
    /// Optional address resolution; failure is never fatal.
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
}

impl AlertDispatcher {
    /// Create a new dispatcher.
    pub fn new(
        user_id: UserId,
        geo: Arc<GeoSampler>,
        store: RosterManager,
        geocoder: Option<Arc<dyn ReverseGeocoder>>,
    ) -> Self {
        Self {
            user_id,
            geo,
            store,
            geocoder,
        }
    }

    /// Compose an alert at the current location and write it to the
    /// per-user alert collection. Fails when no location can be
    /// obtained at all.
    pub async fn send(&self, kind: AlertKind, message: &str) -> AppResult<AlertId> {
        let location = self.geo.current_location().await.map_err(|e| {
            AppError::new(
                ErrorKind::ProviderUnavailable,
                format!("cannot dispatch alert without a location: {}", e.message),
            )
        })?;

        let address = match &self.geocoder {
            Some(geocoder) => match geocoder.reverse(location.latitude, location.longitude).await {
                Ok(address) => address,
                Err(e) => {
                    debug!(error = %e, "Reverse geocode failed; alert goes out without address");
                    None
                }
            },
            None => None,
        };

        let alert = EmergencyAlert {
            kind,
            location,
            message: message.to_string(),
            timestamp_ms: Utc::now().timestamp_millis(),
            user_id: self.user_id.clone(),
            address,
        };

        let id = self.store.append_alert(&self.user_id, &alert).await?;
        info!(%id, kind = %alert.kind, "Emergency alert dispatched");
        Ok(id)
    }
}
