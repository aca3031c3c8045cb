//! Sync engine — the sharing session lifecycle, roster operations, and
//! write-through persistence.
//!
//! One engine instance exists per process. All persistence triggered by
//! lifecycle events and samples is fire-and-forget through the ordered
//! writer; roster reads are read-through with cache fallback. No public
//! method leaves the sharing session in an inconsistent state on error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};

use beacon_cache::keys;
use beacon_cache::CacheManager;
use beacon_core::result::AppResult;
use beacon_core::traits::cache::CacheProvider;
use beacon_core::types::{MemberId, UserId};
use beacon_entity::alert::AlertKind;
use beacon_entity::location::LocationSample;
use beacon_entity::member::{normalize_phone, FamilyMember, MemberDraft};
use beacon_geo::{distance, GeoSampler, ReverseGeocoder, SubscriptionHandle};
use beacon_store::{RosterManager, RosterStore};

use crate::alert::AlertDispatcher;
use crate::hub::{ListenerGuard, ListenerHub};
use crate::persist::{PersistOp, PersistWriter};

/// The sharing session. Invariant: a subscription handle is present and
/// active if and only if sharing is on.
#[derive(Debug, Default)]
struct SessionState {
    handle: Option<SubscriptionHandle>,
}

/// The presence synchronization engine.
///
/// Constructed once at process start; `initialize`/`cleanup` bracket its
/// lifecycle explicitly.
#[derive(Debug)]
pub struct SyncEngine {
    /// The current user (authenticated id or cached pseudo-identity).
    user_id: UserId,
    /// Device location sampling.
    geo: Arc<GeoSampler>,
    /// Remote roster store.
    store: RosterManager,
    /// Local presence cache.
    cache: CacheManager,
    /// Listener fan-out.
    hub: Arc<ListenerHub>,
    /// Sharing session state, locked across start/stop transitions.
    session: tokio::sync::Mutex<SessionState>,
    /// Synchronous mirror of the session state for `get_sharing_status`.
    sharing_flag: AtomicBool,
    /// In-memory self-location, updated on every sample and one-shot.
    current_location: Arc<Mutex<Option<LocationSample>>>,
    /// Last-loaded roster snapshot.
    members: Arc<RwLock<HashMap<MemberId, FamilyMember>>>,
    /// Ordered fire-and-forget persistence.
    writer: PersistWriter,
    /// Emergency alert dispatch.
    alerts: AlertDispatcher,
}

impl SyncEngine {
    /// Create a new engine.
    ///
    /// When `user_id` is `None` the engine falls back to a pseudo-identity
    /// persisted in the local cache, minting one on first use.
    pub async fn new(
        user_id: Option<UserId>,
        geo: Arc<GeoSampler>,
        store: RosterManager,
        cache: CacheManager,
        geocoder: Option<Arc<dyn ReverseGeocoder>>,
    ) -> AppResult<Self> {
        let user_id = match user_id {
            Some(id) => id,
            None => resolve_pseudo_identity(&cache).await?,
        };

        let writer = PersistWriter::spawn(user_id.clone(), store.clone(), cache.clone());
        let alerts = AlertDispatcher::new(
            user_id.clone(),
            Arc::clone(&geo),
            store.clone(),
            geocoder,
        );

        Ok(Self {
            user_id,
            geo,
            store,
            cache,
            hub: Arc::new(ListenerHub::new()),
            session: tokio::sync::Mutex::new(SessionState::default()),
            sharing_flag: AtomicBool::new(false),
            current_location: Arc::new(Mutex::new(None)),
            members: Arc::new(RwLock::new(HashMap::new())),
            writer,
            alerts,
        })
    }

    /// The id of the user this engine operates for.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Bring the engine up: request permission, restore a persisted
    /// sharing session, and load the roster.
    ///
    /// Permission denial degrades (sampling calls will fail later)
    /// rather than failing initialization.
    pub async fn initialize(&self) -> AppResult<()> {
        if let Err(e) = self.geo.initialize().await {
            warn!(error = %e, "Location permission not granted; sampling degraded");
        }

        let restore = match self.store.read_sharing(&self.user_id).await {
            Ok(Some(flag)) => Some(flag),
            Ok(None) => self.cached_sharing_flag().await,
            Err(e) => {
                warn!(error = %e, "Sharing flag read failed; falling back to cache");
                self.cached_sharing_flag().await
            }
        };
        if restore == Some(true) {
            if let Err(e) = self.start_location_sharing().await {
                warn!(error = %e, "Could not resume location sharing");
            }
        }

        self.reload_members().await;
        info!(user = %self.user_id, "Sync engine initialized");
        Ok(())
    }

    async fn cached_sharing_flag(&self) -> Option<bool> {
        match self.cache.get(keys::is_location_sharing()).await {
            Ok(value) => value.map(|v| v == "true"),
            Err(e) => {
                warn!(error = %e, "Cache sharing-flag read failed");
                None
            }
        }
    }

    /// Enter the Active sharing state.
    ///
    /// Idempotent: when already sharing this is a no-op returning
    /// success. The session lock is held across the whole transition
    /// (including the provider permission request), so a concurrent
    /// `stop_location_sharing` always observes a consistent session.
    pub async fn start_location_sharing(&self) -> AppResult<()> {
        let mut session = self.session.lock().await;
        if session.handle.as_ref().is_some_and(|h| h.is_active()) {
            debug!("start_location_sharing while already active; no-op");
            return Ok(());
        }

        let hub = Arc::clone(&self.hub);
        let current = Arc::clone(&self.current_location);
        let queue = self.writer.queue();
        let handle = self
            .geo
            .subscribe(move |sample| {
                *current.lock().unwrap() = Some(sample);
                hub.emit_location(&sample);
                queue.enqueue(PersistOp::SelfLocation(sample));
            })
            .await?;

        session.handle = Some(handle);
        self.sharing_flag.store(true, Ordering::SeqCst);
        self.writer.enqueue(PersistOp::SharingFlag(true));
        self.hub.emit_sharing(true);
        info!("Location sharing started");
        Ok(())
    }

    /// Leave the Active sharing state.
    ///
    /// Idempotent and safe from any state; repeated calls are no-ops.
    pub async fn stop_location_sharing(&self) {
        let mut session = self.session.lock().await;
        let Some(handle) = session.handle.take() else {
            debug!("stop_location_sharing while idle; no-op");
            return;
        };

        handle.cancel();
        self.sharing_flag.store(false, Ordering::SeqCst);
        self.writer.enqueue(PersistOp::SharingFlag(false));
        self.hub.emit_sharing(false);
        info!("Location sharing stopped");
    }

    /// Whether the sharing session is active right now.
    pub fn get_sharing_status(&self) -> bool {
        self.sharing_flag.load(Ordering::SeqCst)
    }

    /// One-shot location request (graceful degradation to the last
    /// known sample is handled by the sampler).
    pub async fn get_current_location(&self) -> AppResult<LocationSample> {
        let sample = self.geo.current_location().await?;
        *self.current_location.lock().unwrap() = Some(sample);
        Ok(sample)
    }

    /// Create a roster entry.
    ///
    /// `name`/`phone` non-emptiness is the caller's contract; the engine
    /// normalizes the phone to digits and assigns sharing defaults. When
    /// the remote store is unreachable the entry keeps its locally
    /// generated id and exists only on this device until connectivity
    /// returns; no reconciliation pass merges it later.
    pub async fn add_family_member(&self, draft: MemberDraft) -> AppResult<FamilyMember> {
        let mut member = FamilyMember {
            id: MemberId::generate(),
            name: draft.name,
            phone: normalize_phone(&draft.phone),
            relation: draft.relation,
            avatar: draft.avatar,
            is_location_shared: false,
            last_location_update: None,
            location: None,
        };

        match self.store.create_member(&self.user_id, &member).await {
            Ok(id) => member.id = id,
            Err(e) => {
                warn!(error = %e, "Remote member create failed; keeping local-only entry");
            }
        }

        self.members
            .write()
            .unwrap()
            .insert(member.id.clone(), member.clone());
        self.snapshot_roster_to_cache();
        info!(member = %member.id, "Roster entry added");
        Ok(member)
    }

    /// Remove a roster entry.
    ///
    /// The in-memory entry is removed unconditionally even when the
    /// remote delete fails, which keeps the UI responsive but can let
    /// the entry resurface on the next full reload.
    pub async fn remove_family_member(&self, id: &MemberId) {
        if let Err(e) = self.store.delete_member(&self.user_id, id).await {
            warn!(error = %e, %id, "Remote delete failed; entry may resurface on next reload");
        }
        self.members.write().unwrap().remove(id);
        self.snapshot_roster_to_cache();
        info!(member = %id, "Roster entry removed");
    }

    /// Flip one member's `isLocationShared` flag, locally and remotely.
    /// Unknown ids are ignored.
    pub fn toggle_member_location_sharing(&self, id: &MemberId, enabled: bool) {
        {
            let mut members = self.members.write().unwrap();
            let Some(member) = members.get_mut(id) else {
                debug!(%id, "Toggle for unknown member ignored");
                return;
            };
            member.is_location_shared = enabled;
        }
        self.writer.enqueue(PersistOp::MemberSharing {
            id: id.clone(),
            enabled,
        });
        self.snapshot_roster_to_cache();
    }

    /// Read-through roster load: always reloads from the remote store
    /// (cache fallback when unreachable, empty roster as last resort)
    /// before returning. This is the method the presentation layer polls.
    ///
    /// Members not currently sharing are returned with their stored
    /// location cleared.
    pub async fn get_family_members_locations(&self) -> HashMap<MemberId, FamilyMember> {
        self.reload_members()
            .await
            .into_iter()
            .map(|(id, member)| (id, member.gated()))
            .collect()
    }

    /// The last-loaded roster snapshot, without touching any store.
    /// Gating applies as in [`Self::get_family_members_locations`].
    pub fn get_family_members(&self) -> HashMap<MemberId, FamilyMember> {
        self.members
            .read()
            .unwrap()
            .iter()
            .map(|(id, member)| (id.clone(), member.clone().gated()))
            .collect()
    }

    /// Members currently sharing a location within `radius_km` of the
    /// engine's own last known position.
    pub fn members_within_km(&self, radius_km: f64) -> Vec<FamilyMember> {
        let Some(center) = *self.current_location.lock().unwrap() else {
            return Vec::new();
        };
        self.members
            .read()
            .unwrap()
            .values()
            .filter(|member| {
                member
                    .effective_location()
                    .is_some_and(|loc| distance::between(&center, loc) <= radius_km)
            })
            .map(|member| member.clone().gated())
            .collect()
    }

    /// Compose and persist an emergency alert at the current location.
    /// Works regardless of the sharing session state.
    pub async fn send_emergency_alert(&self, kind: AlertKind, message: &str) -> AppResult<()> {
        self.alerts.send(kind, message).await.map(|_| ())
    }

    /// Register a location listener.
    pub fn add_location_listener(
        &self,
        cb: impl Fn(&LocationSample) + Send + Sync + 'static,
    ) -> ListenerGuard {
        ListenerHub::on_location(&self.hub, cb)
    }

    /// Register a sharing-state listener.
    pub fn add_share_status_listener(
        &self,
        cb: impl Fn(bool) + Send + Sync + 'static,
    ) -> ListenerGuard {
        ListenerHub::on_sharing(&self.hub, cb)
    }

    /// Tear the engine down: cancel the subscription and drain pending
    /// writes.
    ///
    /// Unlike [`Self::stop_location_sharing`] this does not flip the
    /// persisted sharing preference, so a restarted process resumes the
    /// session it was shut down with.
    pub async fn cleanup(&self) {
        {
            let mut session = self.session.lock().await;
            if let Some(handle) = session.handle.take() {
                handle.cancel();
            }
            self.sharing_flag.store(false, Ordering::SeqCst);
        }
        self.writer.shutdown().await;
        info!("Sync engine shut down");
    }

    /// Reload the roster from the remote store, falling back to the
    /// cached snapshot, then to an empty roster. Updates the in-memory
    /// snapshot and (on a successful remote read) the cache mirror.
    async fn reload_members(&self) -> HashMap<MemberId, FamilyMember> {
        let loaded = match self.store.list_members(&self.user_id).await {
            Ok(list) => {
                let map: HashMap<MemberId, FamilyMember> = list
                    .into_iter()
                    .map(|member| (member.id.clone(), member))
                    .collect();
                self.writer.enqueue(PersistOp::RosterSnapshot(map.clone()));
                map
            }
            Err(e) => {
                warn!(error = %e, "Roster read failed; falling back to cache");
                match self
                    .cache
                    .get_json::<HashMap<MemberId, FamilyMember>>(keys::family_members())
                    .await
                {
                    Ok(Some(map)) => map,
                    Ok(None) => HashMap::new(),
                    Err(e) => {
                        warn!(error = %e, "Cache roster read failed; returning empty roster");
                        HashMap::new()
                    }
                }
            }
        };

        *self.members.write().unwrap() = loaded.clone();
        loaded
    }

    /// Queue a cache write of the current in-memory roster.
    fn snapshot_roster_to_cache(&self) {
        let snapshot = self.members.read().unwrap().clone();
        self.writer.enqueue(PersistOp::RosterSnapshot(snapshot));
    }
}

/// Load the cached pseudo-identity, minting and persisting one when the
/// cache holds none.
async fn resolve_pseudo_identity(cache: &CacheManager) -> AppResult<UserId> {
    if let Some(existing) = cache.get(keys::user_id()).await? {
        return Ok(UserId::new(existing));
    }
    let minted = UserId::generate();
    cache.set(keys::user_id(), minted.as_str()).await?;
    info!(user = %minted, "Minted fallback pseudo-identity");
    Ok(minted)
}
