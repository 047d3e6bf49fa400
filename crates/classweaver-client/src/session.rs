//! Client-side authentication session.
//!
//! `SessionService` owns the single process-wide [`SessionState`], persists
//! the current user under a fixed storage key, and restores it on first
//! touch. The backend is reached through the [`AuthBackend`] trait so the
//! state machine can be exercised against a scripted backend in tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use classweaver_core::error::Result;
use classweaver_core::storage::SessionStorage;
use classweaver_core::user::{SessionState, SignInRequest, SignUpRequest, UserProfile};

use crate::http::{ApiClient, AUTH_STORAGE_KEY};

/// The auth endpoints the session service depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Ensures the CSRF cookie exists before authenticated calls.
    async fn prime_csrf_token(&self);
    /// "Who am I" lookup for the active session cookie.
    async fn fetch_current_user(&self) -> Result<UserProfile>;
    async fn login(&self, request: &SignInRequest) -> Result<UserProfile>;
    async fn register(&self, request: &SignUpRequest) -> Result<UserProfile>;
    async fn logout(&self) -> Result<()>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn prime_csrf_token(&self) {
        ApiClient::prime_csrf_token(self).await;
    }

    async fn fetch_current_user(&self) -> Result<UserProfile> {
        ApiClient::fetch_current_user(self).await
    }

    async fn login(&self, request: &SignInRequest) -> Result<UserProfile> {
        ApiClient::login(self, request).await
    }

    async fn register(&self, request: &SignUpRequest) -> Result<UserProfile> {
        ApiClient::register(self, request).await
    }

    async fn logout(&self) -> Result<()> {
        ApiClient::logout(self).await
    }
}

/// Owner of the authentication state for one client session.
///
/// Constructed once at application start; consumers share it by reference.
/// All state transitions go through the operations below, which keeps the
/// `initialized` flag monotonic and the persisted snapshot in sync with the
/// in-memory user.
pub struct SessionService {
    backend: Arc<dyn AuthBackend>,
    storage: Arc<dyn SessionStorage>,
    state: Mutex<SessionState>,
    // Serializes load_current_user so concurrent route guards share one
    // underlying network call.
    load_guard: tokio::sync::Mutex<()>,
    // Bumped after every completed who-am-I check. A caller that waited on
    // the guard compares generations to tell "a load finished while I
    // waited" from "nothing was in flight", independent of `force`.
    load_generation: AtomicU64,
}

impl SessionService {
    pub fn new(backend: Arc<dyn AuthBackend>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            backend,
            storage,
            state: Mutex::new(SessionState::new()),
            load_guard: tokio::sync::Mutex::new(()),
            load_generation: AtomicU64::new(0),
        }
    }

    /// Builds a service over an [`ApiClient`], sharing its storage.
    pub fn for_client(client: ApiClient) -> Self {
        let storage = client.storage();
        Self::new(Arc::new(client), storage)
    }

    /// Returns a snapshot of the current session state.
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// Returns the currently held user, if any.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.lock_state().current_user.clone()
    }

    /// Returns true when a user is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.lock_state().is_authenticated()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }

    fn persist_user(&self, user: Option<&UserProfile>) {
        match user {
            Some(user) => match serde_json::to_string(user) {
                Ok(serialized) => self.storage.set_item(AUTH_STORAGE_KEY, &serialized),
                Err(err) => warn!(%err, "failed to serialize user snapshot"),
            },
            None => self.storage.remove_item(AUTH_STORAGE_KEY),
        }
    }

    /// Restores the persisted snapshot into empty in-memory state.
    ///
    /// A snapshot that fails to parse or lacks a valid identity is treated
    /// as "no session" and removed.
    fn restore_user(&self) {
        let mut state = self.lock_state();
        if state.current_user.is_some() {
            return;
        }
        let Some(raw) = self.storage.get_item(AUTH_STORAGE_KEY) else {
            return;
        };
        match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) if user.has_valid_identity() => {
                debug!(user_id = user.id, "restored session from storage");
                state.current_user = Some(user);
                state.initialized = true;
            }
            _ => {
                drop(state);
                warn!("discarding unparsable session snapshot");
                self.storage.remove_item(AUTH_STORAGE_KEY);
            }
        }
    }

    /// Ensures the current-user check has run, returning the held user.
    ///
    /// De-duplicates concurrent and redundant invocations: a caller that
    /// arrives while a load is in flight waits for it and observes its
    /// outcome instead of issuing a second request, and once the session is
    /// initialized no further network call happens unless `force` is set.
    /// All terminal paths leave `initialized` true.
    pub async fn load_current_user(&self, force: bool) -> Option<UserProfile> {
        self.restore_user();
        {
            let state = self.lock_state();
            if state.initialized && !force {
                return state.current_user.clone();
            }
        }

        let generation = self.load_generation.load(Ordering::Acquire);
        let _guard = self.load_guard.lock().await;
        {
            // A load that was in flight when this caller arrived has
            // finished by the time the guard is acquired; its outcome is
            // shared even for forced refreshes.
            let mut state = self.lock_state();
            let completed_while_waiting =
                self.load_generation.load(Ordering::Acquire) != generation;
            if completed_while_waiting || (state.initialized && !force) {
                return state.current_user.clone();
            }
            state.loading = true;
            state.last_error = None;
        }

        self.backend.prime_csrf_token().await;
        let result = self.backend.fetch_current_user().await;

        let current = {
            let mut state = self.lock_state();
            match result {
                Ok(user) => {
                    state.current_user = Some(user);
                }
                Err(err) => {
                    if err.is_unauthorized() || state.current_user.is_none() {
                        state.current_user = None;
                    }
                    // A transient failure while a user is held keeps the
                    // held user.
                }
            }
            state.loading = false;
            state.initialized = true;
            state.current_user.clone()
        };
        self.load_generation.fetch_add(1, Ordering::AcqRel);
        self.persist_user(current.as_ref());
        current
    }

    /// Signs in with explicit credentials.
    ///
    /// On failure the user is cleared, a display message is recorded in the
    /// state, and the error is re-raised for the caller to present.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<UserProfile> {
        {
            let mut state = self.lock_state();
            state.loading = true;
            state.last_error = None;
        }
        let result = self.backend.login(request).await;
        self.finish_auth_attempt(result)
    }

    /// Registers a new account and signs it in.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<UserProfile> {
        {
            let mut state = self.lock_state();
            state.loading = true;
            state.last_error = None;
        }
        let result = self.backend.register(request).await;
        self.finish_auth_attempt(result)
    }

    fn finish_auth_attempt(&self, result: Result<UserProfile>) -> Result<UserProfile> {
        match result {
            Ok(user) => {
                {
                    let mut state = self.lock_state();
                    state.current_user = Some(user.clone());
                    state.initialized = true;
                    state.loading = false;
                }
                self.persist_user(Some(&user));
                Ok(user)
            }
            Err(err) => {
                let mut state = self.lock_state();
                state.last_error = Some(err.to_string());
                state.current_user = None;
                state.initialized = true;
                state.loading = false;
                Err(err)
            }
        }
    }

    /// Signs out.
    ///
    /// The network logout is best-effort: local state is always cleared and
    /// un-persisted, even when the call fails, so a local session can never
    /// outlive a user-initiated sign-out.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.backend.logout().await;
        {
            let mut state = self.lock_state();
            state.current_user = None;
        }
        self.persist_user(None);
        if let Err(err) = &result {
            warn!(%err, "network logout failed, local session cleared anyway");
        }
        result
    }
}
