//! HTTP roster store client.
//!
//! Talks to the platform's document API. PATCH requests are merge
//! writes: only the fields present in the body are replaced, so
//! concurrent writers converge last-write-wins per field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use beacon_core::config::store::HttpStoreConfig;
use beacon_core::error::AppError;
use beacon_core::result::AppResult;
use beacon_core::types::{AlertId, MemberId, UserId};
use beacon_entity::alert::EmergencyAlert;
use beacon_entity::location::LocationSample;
use beacon_entity::member::FamilyMember;

use crate::roster::RosterStore;

use super::dto::{CreatedResponse, UserDoc};
use super::paths;

/// HTTP document-store backend.
#[derive(Debug, Clone)]
pub struct HttpRosterStore {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Base URL of the document API.
    base_url: String,
}

impl HttpRosterStore {
    /// Create a new client from configuration.
    pub fn new(config: &HttpStoreConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn read_err(what: &str, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::timeout(format!("{what} timed out: {err}"))
        } else {
            AppError::remote_read(format!("{what} failed: {err}"))
        }
    }

    fn write_err(what: &str, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::timeout(format!("{what} timed out: {err}"))
        } else {
            AppError::remote_write(format!("{what} failed: {err}"))
        }
    }
}

#[async_trait]
impl RosterStore for HttpRosterStore {
    async fn read_sharing(&self, user: &UserId) -> AppResult<Option<bool>> {
        let url = paths::user_doc(&self.base_url, user);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::read_err("user document read", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc: UserDoc = response
            .error_for_status()
            .map_err(|e| Self::read_err("user document read", e))?
            .json()
            .await
            .map_err(|e| Self::read_err("user document decode", e))?;

        Ok(doc.preferences.location_sharing)
    }

    async fn write_sharing(&self, user: &UserId, sharing: bool) -> AppResult<()> {
        let url = paths::user_doc(&self.base_url, user);
        let body = serde_json::json!({ "preferences": { "locationSharing": sharing } });
        self.http
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::write_err("sharing flag write", e))?
            .error_for_status()
            .map_err(|e| Self::write_err("sharing flag write", e))?;

        debug!(%user, sharing, "Persisted sharing flag");
        Ok(())
    }

    async fn write_live_location(&self, user: &UserId, sample: &LocationSample) -> AppResult<()> {
        let url = paths::user_doc(&self.base_url, user);
        let body = serde_json::json!({ "liveLocation": sample });
        self.http
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::write_err("live location write", e))?
            .error_for_status()
            .map_err(|e| Self::write_err("live location write", e))?;

        Ok(())
    }

    async fn create_member(&self, user: &UserId, member: &FamilyMember) -> AppResult<MemberId> {
        let url = paths::family_collection(&self.base_url, user);
        let created: CreatedResponse = self
            .http
            .post(&url)
            .json(member)
            .send()
            .await
            .map_err(|e| Self::write_err("member create", e))?
            .error_for_status()
            .map_err(|e| Self::write_err("member create", e))?
            .json()
            .await
            .map_err(|e| Self::write_err("member create decode", e))?;

        Ok(MemberId::new(created.id))
    }

    async fn delete_member(&self, user: &UserId, id: &MemberId) -> AppResult<()> {
        let url = paths::family_doc(&self.base_url, user, id);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| Self::write_err("member delete", e))?;

        // Deleting an already-gone entry is not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        response
            .error_for_status()
            .map_err(|e| Self::write_err("member delete", e))?;
        Ok(())
    }

    async fn list_members(&self, user: &UserId) -> AppResult<Vec<FamilyMember>> {
        let url = format!(
            "{}?orderBy=createdAt",
            paths::family_collection(&self.base_url, user)
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::read_err("roster list", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        response
            .error_for_status()
            .map_err(|e| Self::read_err("roster list", e))?
            .json()
            .await
            .map_err(|e| Self::read_err("roster list decode", e))
    }

    async fn set_member_sharing(
        &self,
        user: &UserId,
        id: &MemberId,
        enabled: bool,
    ) -> AppResult<()> {
        let url = paths::family_doc(&self.base_url, user, id);
        let body = serde_json::json!({ "isLocationShared": enabled });
        self.http
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::write_err("member sharing write", e))?
            .error_for_status()
            .map_err(|e| Self::write_err("member sharing write", e))?;

        Ok(())
    }

    async fn append_alert(&self, user: &UserId, alert: &EmergencyAlert) -> AppResult<AlertId> {
        let url = paths::alerts_collection(&self.base_url, user);
        let created: CreatedResponse = self
            .http
            .post(&url)
            .json(alert)
            .send()
            .await
            .map_err(|e| Self::write_err("alert append", e))?
            .error_for_status()
            .map_err(|e| Self::write_err("alert append", e))?
            .json()
            .await
            .map_err(|e| Self::write_err("alert append decode", e))?;

        Ok(AlertId::new(created.id))
    }

    async fn health_check(&self) -> AppResult<bool> {
        let url = paths::health(&self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!(error = %e, "Roster store health check failed");
                Ok(false)
            }
        }
    }
}
