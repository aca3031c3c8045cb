//! Roster store manager that dispatches to the configured backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use beacon_core::config::store::StoreConfig;
use beacon_core::error::AppError;
use beacon_core::result::AppResult;
use beacon_core::types::{AlertId, MemberId, UserId};
use beacon_entity::alert::EmergencyAlert;
use beacon_entity::location::LocationSample;
use beacon_entity::member::FamilyMember;

use crate::roster::RosterStore;

/// Roster store manager that wraps the configured backend.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct RosterManager {
    /// The inner roster store backend.
    inner: Arc<dyn RosterStore>,
}

impl RosterManager {
    /// Create a new roster manager from configuration.
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn RosterStore> = match config.backend.as_str() {
            "http" => {
                info!(base_url = %config.http.base_url, "Initializing HTTP roster store");
                Arc::new(crate::http::HttpRosterStore::new(&config.http)?)
            }
            "memory" => {
                info!("Initializing in-memory roster store");
                Arc::new(crate::memory::MemoryRosterStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store backend: '{other}'. Supported: http, memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a roster manager from an existing store (for testing).
    pub fn from_store(store: Arc<dyn RosterStore>) -> Self {
        Self { inner: store }
    }
}

#[async_trait]
impl RosterStore for RosterManager {
    async fn read_sharing(&self, user: &UserId) -> AppResult<Option<bool>> {
        self.inner.read_sharing(user).await
    }

    async fn write_sharing(&self, user: &UserId, sharing: bool) -> AppResult<()> {
        self.inner.write_sharing(user, sharing).await
    }

    async fn write_live_location(&self, user: &UserId, sample: &LocationSample) -> AppResult<()> {
        self.inner.write_live_location(user, sample).await
    }

    async fn create_member(&self, user: &UserId, member: &FamilyMember) -> AppResult<MemberId> {
        self.inner.create_member(user, member).await
    }

    async fn delete_member(&self, user: &UserId, id: &MemberId) -> AppResult<()> {
        self.inner.delete_member(user, id).await
    }

    async fn list_members(&self, user: &UserId) -> AppResult<Vec<FamilyMember>> {
        self.inner.list_members(user).await
    }

    async fn set_member_sharing(
        &self,
        user: &UserId,
        id: &MemberId,
        enabled: bool,
    ) -> AppResult<()> {
        self.inner.set_member_sharing(user, id, enabled).await
    }

    async fn append_alert(&self, user: &UserId, alert: &EmergencyAlert) -> AppResult<AlertId> {
        self.inner.append_alert(user, alert).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
