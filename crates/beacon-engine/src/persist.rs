//! Ordered, fire-and-forget persistence writer.
//!
//! Every remote-store and cache write the engine triggers goes through
//! one queue drained by a single task, so writes are attempted in the
//! order their triggering events occurred (a `sharing:false` can never
//! land before an earlier `sharing:true`). Failures are logged and
//! never retried or rolled back; in-memory state stays the source of
//! truth for the UI.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use beacon_cache::keys;
use beacon_cache::CacheManager;
use beacon_core::traits::cache::CacheProvider;
use beacon_core::types::{MemberId, UserId};
use beacon_entity::location::LocationSample;
use beacon_entity::member::FamilyMember;
use beacon_entity::presence::SelfLocationRecord;
use beacon_store::{RosterManager, RosterStore};

/// A queued write.
#[derive(Debug)]
pub enum PersistOp {
    /// Persist the sharing session flag (remote + cache).
    SharingFlag(bool),
    /// Persist the user's own location (remote self-record + cache).
    SelfLocation(LocationSample),
    /// Mirror the in-memory roster snapshot to the cache.
    RosterSnapshot(HashMap<MemberId, FamilyMember>),
    /// Persist one member's sharing flag (remote).
    MemberSharing {
        /// The roster entry to update.
        id: MemberId,
        /// The new flag value.
        enabled: bool,
    },
}

/// Cloneable enqueue side of the writer.
#[derive(Debug, Clone)]
pub struct PersistQueue {
    tx: mpsc::UnboundedSender<PersistOp>,
}

impl PersistQueue {
    /// Queue a write. Never blocks; after shutdown the op is dropped.
    pub fn enqueue(&self, op: PersistOp) {
        if self.tx.send(op).is_err() {
            debug!("Persistence writer closed; dropping write");
        }
    }
}

/// Owns the writer task.
#[derive(Debug)]
pub struct PersistWriter {
    queue: PersistQueue,
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PersistWriter {
    /// Spawn the writer task. Must be called within a Tokio runtime.
    pub fn spawn(user_id: UserId, store: RosterManager, cache: CacheManager) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistOp>();
        let token = CancellationToken::new();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            // Fix time of the newest self-location already written; an
            // older queued sample must not overwrite a newer one.
            let mut last_location_ts = i64::MIN;
            loop {
                tokio::select! {
                    op = rx.recv() => match op {
                        Some(op) => apply(&user_id, &store, &cache, op, &mut last_location_ts).await,
                        None => break,
                    },
                    _ = task_token.cancelled() => {
                        while let Ok(op) = rx.try_recv() {
                            apply(&user_id, &store, &cache, op, &mut last_location_ts).await;
                        }
                        break;
                    }
                }
            }
        });

        Self {
            queue: PersistQueue { tx },
            token,
            task: Mutex::new(Some(task)),
        }
    }

    /// Cloneable enqueue handle for callbacks.
    pub fn queue(&self) -> PersistQueue {
        self.queue.clone()
    }

    /// Queue a write.
    pub fn enqueue(&self, op: PersistOp) {
        self.queue.enqueue(op);
    }

    /// Drain queued writes and stop the task. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        self.token.cancel();
        let task = self.task.lock().unwrap().take();
        if let Some(task) = task {
            if tokio::time::timeout(Duration::from_secs(5), task).await.is_err() {
                warn!("Persistence writer did not drain in time");
            }
        }
    }
}

/// Apply one write. Failures are logged, never propagated.
async fn apply(
    user_id: &UserId,
    store: &RosterManager,
    cache: &CacheManager,
    op: PersistOp,
    last_location_ts: &mut i64,
) {
    match op {
        PersistOp::SharingFlag(sharing) => {
            if let Err(e) = store.write_sharing(user_id, sharing).await {
                warn!(error = %e, sharing, "Remote sharing-flag write failed (not retried)");
            }
            let value = if sharing { "true" } else { "false" };
            if let Err(e) = cache.set(keys::is_location_sharing(), value).await {
                warn!(error = %e, sharing, "Cache sharing-flag write failed");
            }
        }
        PersistOp::SelfLocation(sample) => {
            if sample.timestamp_ms < *last_location_ts {
                debug!(
                    sample_ts = sample.timestamp_ms,
                    newest_ts = *last_location_ts,
                    "Skipping stale self-location write"
                );
                return;
            }
            *last_location_ts = sample.timestamp_ms;

            if let Err(e) = store.write_live_location(user_id, &sample).await {
                warn!(error = %e, "Remote self-location write failed (not retried)");
            }
            let record = SelfLocationRecord::new(user_id.clone(), sample);
            let key = keys::user_location(user_id);
            if let Err(e) = cache.set_json(&key, &record).await {
                warn!(error = %e, "Cache self-location write failed");
            }
        }
        PersistOp::RosterSnapshot(snapshot) => {
            if let Err(e) = cache.set_json(keys::family_members(), &snapshot).await {
                warn!(error = %e, "Cache roster snapshot write failed");
            }
        }
        PersistOp::MemberSharing { id, enabled } => {
            if let Err(e) = store.set_member_sharing(user_id, &id, enabled).await {
                warn!(error = %e, %id, "Remote member-sharing write failed (not retried)");
            }
        }
    }
}
