//! Roster store trait for pluggable remote persistence backends.

use async_trait::async_trait;

use beacon_core::result::AppResult;
use beacon_core::types::{AlertId, MemberId, UserId};
use beacon_entity::alert::EmergencyAlert;
use beacon_entity::location::LocationSample;
use beacon_entity::member::FamilyMember;

/// Trait for the remote roster store.
///
/// All writes are field-merge writes at the granularity the method
/// names: concurrent writers converge last-write-wins per field. Reads
/// are not transactional with writes.
#[async_trait]
pub trait RosterStore: Send + Sync + std::fmt::Debug + 'static {
    /// Read the persisted sharing flag from the user document.
    /// Returns `None` when the document or field does not exist.
    async fn read_sharing(&self, user: &UserId) -> AppResult<Option<bool>>;

    /// Merge-write the sharing flag into the user document.
    async fn write_sharing(&self, user: &UserId, sharing: bool) -> AppResult<()>;

    /// Merge-write the user's own live location into the user document.
    /// Self-location never goes into the roster sub-collection.
    async fn write_live_location(&self, user: &UserId, sample: &LocationSample) -> AppResult<()>;

    /// Create a roster entry. The `id` field of `member` is ignored; the
    /// store assigns and returns the definitive identifier.
    async fn create_member(&self, user: &UserId, member: &FamilyMember) -> AppResult<MemberId>;

    /// Delete a roster entry. Deleting an unknown id is not an error.
    async fn delete_member(&self, user: &UserId, id: &MemberId) -> AppResult<()>;

    /// List roster entries ordered by creation time.
    async fn list_members(&self, user: &UserId) -> AppResult<Vec<FamilyMember>>;

    /// Merge-write only the `isLocationShared` field of one roster entry.
    async fn set_member_sharing(
        &self,
        user: &UserId,
        id: &MemberId,
        enabled: bool,
    ) -> AppResult<()>;

    /// Append an alert to the per-user alert sub-collection. The store
    /// assigns the alert id and the `createdAt` creation time.
    async fn append_alert(&self, user: &UserId, alert: &EmergencyAlert) -> AppResult<AlertId>;

    /// Check that the store backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
