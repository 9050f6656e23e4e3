//! The active group session.
//!
//! `SessionContext` is constructed once at start-up and handed to everything
//! that needs to know which group the user is acting as: the navigation
//! guard, the data views, the join form. It owns the credential registry and
//! publishes every state change through a `watch` channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, GroupGateway};
use crate::auth::{CredentialStore, SavedCredential};
use crate::config::{Config, RestorePolicy, DEFAULT_MATCHES_PAGE_SIZE};
use crate::models::Group;

use super::state::{Collection, PageInfo, SessionState};

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub restore_policy: RestorePolicy,
    pub matches_page_size: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            restore_policy: RestorePolicy::default(),
            matches_page_size: DEFAULT_MATCHES_PAGE_SIZE,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            restore_policy: config.restore_policy,
            matches_page_size: config.matches_page_size,
        }
    }
}

/// A restoration attempt other callers can join.
type PendingRestore = Shared<BoxFuture<'static, bool>>;

struct Inner {
    gateway: Arc<dyn GroupGateway>,
    credentials: Mutex<CredentialStore>,
    state: watch::Sender<SessionState>,
    options: SessionOptions,
    /// In-flight restorations keyed by saved group id.
    restoring: Mutex<HashMap<String, PendingRestore>>,
}

/// Handle to the session service. Clones share the same session.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    pub fn new(
        gateway: Arc<dyn GroupGateway>,
        credentials: CredentialStore,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                gateway,
                credentials: Mutex::new(credentials),
                state,
                options,
                restoring: Mutex::new(HashMap::new()),
            }),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Snapshot of the current session
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Saved credentials, most recently accessed first
    pub fn saved_groups(&self) -> Vec<SavedCredential> {
        self.credentials().list().to_vec()
    }

    fn credentials(&self) -> MutexGuard<'_, CredentialStore> {
        self.inner.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn restoring(&self) -> MutexGuard<'_, HashMap<String, PendingRestore>> {
        self.inner.restoring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, group: &Group, password: &str) {
        if let Err(e) = self.credentials().add(&group.id, &group.name, password) {
            warn!(group_id = %group.id, error = %e, "Failed to persist saved group");
        }
    }

    fn set_error(&self, message: String) {
        self.inner.state.send_modify(|s| s.error = Some(message));
    }

    fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    /// Make `group` active with the given authority.
    fn activate(&self, group: Group, password: String, authenticated: bool) {
        self.inner.state.send_modify(|s| apply_group(s, group, password, authenticated));
    }

    /// Like `activate`, but only if the session has not been cleared or
    /// switched since `generation` was read.
    fn activate_since(
        &self,
        generation: u64,
        group: Group,
        password: String,
        authenticated: bool,
    ) -> bool {
        self.inner.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            apply_group(s, group, password, authenticated);
            true
        })
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Make `group` active and authenticated, and save its password.
    ///
    /// Used when the password is already known to be valid, e.g. right after
    /// the group was created.
    pub fn set_group(&self, group: Group, password: &str) {
        info!(group_id = %group.id, name = %group.name, "Group set");
        self.remember(&group, password);
        self.activate(group, password.to_string(), true);
    }

    /// Verify `password` for the loaded group.
    ///
    /// On success the password is cached, the session is marked authenticated
    /// and the credential is saved. On rejection nothing changes.
    pub async fn authenticate(&self, password: &str) -> bool {
        let Some(group) = self.state().current_group else {
            warn!("Authenticate called with no group loaded");
            return false;
        };

        match self.inner.gateway.authenticate(&group.id, password).await {
            Ok(true) => {
                info!(group_id = %group.id, "Group password accepted");
                self.remember(&group, password);
                self.inner.state.send_modify(|s| {
                    if s.group_id() == Some(group.id.as_str()) {
                        s.password = password.to_string();
                        s.is_authenticated = true;
                        s.error = None;
                    }
                });
                true
            }
            Ok(false) => {
                info!(group_id = %group.id, "Group password rejected");
                false
            }
            Err(e) => {
                warn!(group_id = %group.id, error = %e, "Password verification failed");
                self.set_error(format!("Could not verify password: {}", e));
                false
            }
        }
    }

    /// Load a group's public metadata by name and pick up its saved password.
    ///
    /// Returns false when the group cannot be resolved; the session is then
    /// left as it was apart from `error`.
    pub async fn load_group(&self, name: &str) -> bool {
        matches!(self.resolve_group(name).await, Resolution::Loaded)
    }

    async fn resolve_group(&self, name: &str) -> Resolution {
        let generation = self.generation();
        let group = match self.inner.gateway.get_by_name(name).await {
            Ok(group) => group,
            Err(e) => {
                if e.is_not_found() {
                    info!(name, "Group not found");
                } else {
                    warn!(name, error = %e, "Failed to load group");
                }
                self.set_error(format!("Could not load group {}: {}", name, e));
                return Resolution::Failed;
            }
        };

        let saved = self.credentials().lookup(&group.id);
        let password = match saved {
            Some(password) => self.confirm_saved(&group, password).await,
            None => None,
        };

        let group_id = group.id.clone();
        let authenticated = password.is_some();
        if !self.activate_since(generation, group, password.unwrap_or_default(), authenticated) {
            debug!(group_id = %group_id, "Session changed while loading group, discarding");
            return Resolution::Superseded;
        }
        debug!(group_id = %group_id, authenticated, "Group loaded");
        Resolution::Loaded
    }

    /// Apply the restore policy to a password found in the registry.
    async fn confirm_saved(&self, group: &Group, password: String) -> Option<String> {
        if self.inner.options.restore_policy == RestorePolicy::TrustCached {
            return Some(password);
        }
        match self.inner.gateway.authenticate(&group.id, &password).await {
            Ok(true) => Some(password),
            Ok(false) => {
                info!(group_id = %group.id, "Saved password no longer accepted");
                None
            }
            Err(e) => {
                warn!(group_id = %group.id, error = %e, "Could not verify saved password");
                None
            }
        }
    }

    /// Re-establish the session for the most recently accessed saved group.
    ///
    /// Returns false without touching the network when nothing is saved.
    /// Concurrent calls for the same saved group share one attempt. A failed
    /// attempt resets the session.
    pub async fn restore_from_storage(&self) -> bool {
        let Some(entry) = self.credentials().most_recent().cloned() else {
            debug!("No saved groups to restore");
            return false;
        };

        let pending = {
            let mut restoring = self.restoring();
            match restoring.get(&entry.id) {
                Some(pending) => {
                    debug!(group_id = %entry.id, "Joining in-flight restoration");
                    pending.clone()
                }
                None => {
                    let ctx = self.clone();
                    let name = entry.name.clone();
                    let pending = async move { ctx.restore_entry(&name).await }.boxed().shared();
                    restoring.insert(entry.id.clone(), pending.clone());
                    pending
                }
            }
        };

        let restored = pending.clone().await;

        let mut restoring = self.restoring();
        if restoring.get(&entry.id).is_some_and(|p| p.ptr_eq(&pending)) {
            restoring.remove(&entry.id);
        }
        restored
    }

    async fn restore_entry(&self, name: &str) -> bool {
        match self.resolve_group(name).await {
            Resolution::Loaded => {
                info!(name, "Session restored from saved group");
                true
            }
            Resolution::Failed => {
                warn!(name, "Restoration failed, clearing session");
                self.inner.state.send_modify(SessionState::reset);
                false
            }
            // Whoever changed the session owns it now.
            Resolution::Superseded => false,
        }
    }

    /// Leave the active group: forget its saved password and empty the session.
    pub fn clear_group(&self) {
        if let Some(group) = self.state().current_group {
            info!(group_id = %group.id, "Leaving group");
            if let Err(e) = self.credentials().remove(&group.id) {
                warn!(group_id = %group.id, error = %e, "Failed to persist saved group removal");
            }
        }
        self.inner.state.send_modify(SessionState::reset);
    }

    // =========================================================================
    // Data fetches
    // =========================================================================

    pub async fn load_players(&self) {
        let Some(fetch) = self.begin_fetch(Collection::Players) else {
            return;
        };
        let result = self.inner.gateway.get_players(&fetch.group_id, &fetch.password).await;
        self.finish_fetch(fetch, result, |s, players| s.players = Arc::from(players));
    }

    pub async fn load_matches(&self, page: u32, page_size: u32) {
        let Some(fetch) = self.begin_fetch(Collection::Matches) else {
            return;
        };
        let result = self
            .inner
            .gateway
            .get_matches(&fetch.group_id, &fetch.password, page, page_size)
            .await;
        self.finish_fetch(fetch, result, |s, page| {
            s.match_page = Some(PageInfo::from(&page));
            s.matches = Arc::from(page.matches);
        });
    }

    /// A page of matches at the configured page size
    pub async fn load_matches_page(&self, page: u32) {
        self.load_matches(page, self.inner.options.matches_page_size).await
    }

    /// First page of matches at the configured page size
    pub async fn load_matches_default(&self) {
        self.load_matches_page(1).await
    }

    pub async fn load_statistics(&self) {
        let Some(fetch) = self.begin_fetch(Collection::Statistics) else {
            return;
        };
        let result = self.inner.gateway.get_statistics(&fetch.group_id, &fetch.password).await;
        self.finish_fetch(fetch, result, |s, stats| s.statistics = Some(Arc::from(stats)));
    }

    /// Mark `collection` loading and capture what the request is scoped to.
    fn begin_fetch(&self, collection: Collection) -> Option<Fetch> {
        let mut fetch = None;
        self.inner.state.send_if_modified(|s| {
            let Some(group) = s.current_group.as_ref() else {
                return false;
            };
            fetch = Some(Fetch {
                collection,
                group_id: group.id.clone(),
                password: s.password.clone(),
                generation: s.generation,
                seq: s.requests.issue(collection),
            });
            s.loading.set(collection, true);
            s.error = None;
            true
        });
        if fetch.is_none() {
            debug!(collection = collection.label(), "No active group, skipping fetch");
        }
        fetch
    }

    /// Apply a fetch result. Results for a session that has since been
    /// cleared or switched to another group are dropped, as are results
    /// overtaken by a newer request for the same collection. The loading
    /// flag stays set until the newest request settles.
    fn finish_fetch<T>(
        &self,
        fetch: Fetch,
        result: Result<T, ApiError>,
        apply: impl FnOnce(&mut SessionState, T),
    ) {
        let label = fetch.collection.label();
        self.inner.state.send_if_modified(|s| {
            if s.generation != fetch.generation {
                debug!(collection = label, "Discarding fetch for a previous session");
                return false;
            }
            if !s.requests.is_latest(fetch.collection, fetch.seq) {
                debug!(collection = label, seq = fetch.seq, "Discarding superseded fetch");
                return false;
            }
            s.loading.set(fetch.collection, false);
            match result {
                Ok(value) => {
                    debug!(collection = label, group_id = %fetch.group_id, "Fetch complete");
                    apply(s, value);
                }
                Err(e) => {
                    warn!(
                        collection = label,
                        group_id = %fetch.group_id,
                        error = %e,
                        "Fetch failed"
                    );
                    s.error = Some(format!("Failed to load {}: {}", label, e));
                }
            }
            true
        });
    }
}

fn apply_group(s: &mut SessionState, group: Group, password: String, authenticated: bool) {
    if s.group_id() != Some(group.id.as_str()) {
        s.clear_collections();
    }
    s.current_group = Some(group);
    s.password = password;
    s.is_authenticated = authenticated;
    s.error = None;
}

/// How a group lookup ended.
enum Resolution {
    Loaded,
    Failed,
    /// The session was cleared or switched while the lookup was in flight.
    Superseded,
}

struct Fetch {
    collection: Collection,
    group_id: String,
    password: String,
    generation: u64,
    seq: u64,
}
