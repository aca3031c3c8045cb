//! In-memory roster store.
//!
//! Backs tests and development. Failure injection toggles let the
//! degraded-mode engine paths (local-only fallback, cache fallback)
//! run without a network.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use beacon_core::error::AppError;
use beacon_core::result::AppResult;
use beacon_core::types::{AlertId, MemberId, UserId};
use beacon_entity::alert::EmergencyAlert;
use beacon_entity::location::LocationSample;
use beacon_entity::member::FamilyMember;

use crate::roster::RosterStore;

/// One user's documents.
#[derive(Debug, Default)]
struct UserDoc {
    sharing: Option<bool>,
    live_location: Option<LocationSample>,
    members: Vec<StoredMember>,
    alerts: Vec<StoredAlert>,
}

/// A roster entry with its creation sequence number.
#[derive(Debug)]
struct StoredMember {
    seq: u64,
    member: FamilyMember,
}

/// An alert with its store-assigned id and creation time.
#[derive(Debug)]
struct StoredAlert {
    id: AlertId,
    alert: EmergencyAlert,
    created_at: DateTime<Utc>,
}

/// In-memory roster store backend.
#[derive(Debug, Default)]
pub struct MemoryRosterStore {
    /// User ID → documents.
    docs: DashMap<UserId, UserDoc>,
    /// Monotonic creation counter, stands in for server creation time.
    seq: AtomicU64,
    /// When set, every write fails with a remote-write error.
    fail_writes: AtomicBool,
    /// When set, every read fails with a remote-read error.
    fail_reads: AtomicBool,
}

impl MemoryRosterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (simulates an unreachable store).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// All alerts appended for a user, in creation order.
    pub fn alerts_for(&self, user: &UserId) -> Vec<EmergencyAlert> {
        self.docs
            .get(user)
            .map(|doc| doc.alerts.iter().map(|a| a.alert.clone()).collect())
            .unwrap_or_default()
    }

    /// The user's persisted live location, if any.
    pub fn live_location_for(&self, user: &UserId) -> Option<LocationSample> {
        self.docs.get(user).and_then(|doc| doc.live_location)
    }

    /// The creation time the store assigned to an alert.
    pub fn alert_created_at(&self, user: &UserId, id: &AlertId) -> Option<DateTime<Utc>> {
        self.docs
            .get(user)
            .and_then(|doc| doc.alerts.iter().find(|a| &a.id == id).map(|a| a.created_at))
    }

    fn check_write(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AppError::remote_write("injected write failure"))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(AppError::remote_read("injected read failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn read_sharing(&self, user: &UserId) -> AppResult<Option<bool>> {
        self.check_read()?;
        Ok(self.docs.get(user).and_then(|doc| doc.sharing))
    }

    async fn write_sharing(&self, user: &UserId, sharing: bool) -> AppResult<()> {
        self.check_write()?;
        self.docs.entry(user.clone()).or_default().sharing = Some(sharing);
        Ok(())
    }

    async fn write_live_location(&self, user: &UserId, sample: &LocationSample) -> AppResult<()> {
        self.check_write()?;
        self.docs.entry(user.clone()).or_default().live_location = Some(*sample);
        Ok(())
    }

    async fn create_member(&self, user: &UserId, member: &FamilyMember) -> AppResult<MemberId> {
        self.check_write()?;
        let id = MemberId::generate();
        let mut stored = member.clone();
        stored.id = id.clone();
        self.docs.entry(user.clone()).or_default().members.push(StoredMember {
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            member: stored,
        });
        Ok(id)
    }

    async fn delete_member(&self, user: &UserId, id: &MemberId) -> AppResult<()> {
        self.check_write()?;
        if let Some(mut doc) = self.docs.get_mut(user) {
            doc.members.retain(|m| &m.member.id != id);
        }
        Ok(())
    }

    async fn list_members(&self, user: &UserId) -> AppResult<Vec<FamilyMember>> {
        self.check_read()?;
        let Some(doc) = self.docs.get(user) else {
            return Ok(Vec::new());
        };
        let mut entries: Vec<(u64, FamilyMember)> = doc
            .members
            .iter()
            .map(|m| (m.seq, m.member.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, m)| m).collect())
    }

    async fn set_member_sharing(
        &self,
        user: &UserId,
        id: &MemberId,
        enabled: bool,
    ) -> AppResult<()> {
        self.check_write()?;
        if let Some(mut doc) = self.docs.get_mut(user) {
            if let Some(entry) = doc.members.iter_mut().find(|m| &m.member.id == id) {
                entry.member.is_location_shared = enabled;
            }
        }
        Ok(())
    }

    async fn append_alert(&self, user: &UserId, alert: &EmergencyAlert) -> AppResult<AlertId> {
        self.check_write()?;
        let id = AlertId::generate();
        self.docs.entry(user.clone()).or_default().alerts.push(StoredAlert {
            id: id.clone(),
            alert: alert.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(!self.fail_reads.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1")
    }

    fn member(name: &str) -> FamilyMember {
        FamilyMember {
            id: MemberId::new("ignored"),
            name: name.to_string(),
            phone: "5550000000".to_string(),
            relation: "friend".to_string(),
            avatar: String::new(),
            is_location_shared: false,
            last_location_update: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_id() {
        let store = MemoryRosterStore::new();
        let id = store.create_member(&user(), &member("Ann")).await.unwrap();
        assert_ne!(id.as_str(), "ignored");
        let listed = store.list_members(&user()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
    }

    #[tokio::test]
    async fn test_list_preserves_creation_order() {
        let store = MemoryRosterStore::new();
        for name in ["Ann", "Bo", "Cy"] {
            store.create_member(&user(), &member(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .list_members(&user())
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Bo", "Cy"]);
    }

    #[tokio::test]
    async fn test_set_member_sharing_touches_only_flag() {
        let store = MemoryRosterStore::new();
        let id = store.create_member(&user(), &member("Ann")).await.unwrap();
        store.set_member_sharing(&user(), &id, true).await.unwrap();
        let listed = store.list_members(&user()).await.unwrap();
        assert!(listed[0].is_location_shared);
        assert_eq!(listed[0].name, "Ann");
    }

    #[tokio::test]
    async fn test_delete_unknown_is_ok() {
        let store = MemoryRosterStore::new();
        store
            .delete_member(&user(), &MemberId::new("nope"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryRosterStore::new();
        store.set_fail_writes(true);
        let err = store
            .create_member(&user(), &member("Ann"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, beacon_core::error::ErrorKind::RemoteWrite);

        store.set_fail_writes(false);
        store.set_fail_reads(true);
        assert!(store.list_members(&user()).await.is_err());
    }

    #[tokio::test]
    async fn test_sharing_flag_roundtrip() {
        let store = MemoryRosterStore::new();
        assert_eq!(store.read_sharing(&user()).await.unwrap(), None);
        store.write_sharing(&user(), true).await.unwrap();
        assert_eq!(store.read_sharing(&user()).await.unwrap(), Some(true));
    }
}
