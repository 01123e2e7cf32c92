//! Session registry.
//!
//! The registry owns every live [`Session`], keyed both by handle and by
//! client endpoint. Unregister, eviction and shutdown all funnel into one
//! teardown path, so a session's open edits are cancelled, its closed
//! signal fires and the edit server hears about it exactly once.

use crate::config::Config;
use crate::events::{ClosedSignal, CloseReason, EditServerEvent, EventSender};
use crate::session::{CloseOutcome, Session};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use textsync_edit_core::{FieldSynchronizer, TextContent};
use textsync_edit_types::{
    FieldEndpointId, TextEditServerError, TextFieldHandle, TextFieldOptions,
};
use tokio::sync::Mutex;

/// Operational counters for the registry and its sessions.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    /// Sessions registered.
    pub registrations_total: AtomicU64,
    /// Sessions closed by an explicit unregister.
    pub unregistrations_total: AtomicU64,
    /// Sessions evicted, by idle sweep or registration pressure.
    pub evictions_total: AtomicU64,
    /// Transactions committed, standalone or into a composition.
    pub commits_total: AtomicU64,
    /// Transactions and compositions cancelled by the client.
    pub cancels_total: AtomicU64,
    /// Calls rejected for presenting a stale revision.
    pub stale_revisions_total: AtomicU64,
}

/// A successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The new session.
    pub session: Arc<Session>,
    /// Resolves when the session is torn down.
    pub closed: ClosedSignal,
}

impl Registration {
    /// The new session's handle.
    pub fn handle(&self) -> TextFieldHandle {
        self.session.handle()
    }
}

/// Registry of live text-field sessions.
pub struct SessionRegistry {
    config: Config,
    sessions: DashMap<TextFieldHandle, Arc<Session>>,
    endpoints: DashMap<FieldEndpointId, TextFieldHandle>,
    next_handle: AtomicU64,
    /// Serializes the capacity check with the insert.
    admission: Mutex<()>,
    events: EventSender,
    metrics: Arc<RegistryMetrics>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("sessions_count", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Create a registry that reports to `events`.
    pub fn new(config: Config, events: EventSender) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            endpoints: DashMap::new(),
            next_handle: AtomicU64::new(1),
            admission: Mutex::new(()),
            events,
            metrics: Arc::new(RegistryMetrics::default()),
        }
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Look up a live session.
    pub fn session(&self, handle: TextFieldHandle) -> Option<Arc<Session>> {
        self.sessions.get(&handle).map(|s| Arc::clone(s.value()))
    }

    /// Look up the live session for a client endpoint.
    pub fn session_for(&self, endpoint: &FieldEndpointId) -> Option<Arc<Session>> {
        let handle = *self.endpoints.get(endpoint)?;
        self.session(handle)
    }

    /// Register a focused text field.
    ///
    /// The session starts at revision 0 with focus unset. At capacity, the
    /// least recently active unfocused session is evicted to make room.
    ///
    /// # Errors
    ///
    /// `AlreadyRegistered` if `endpoint` has a live session,
    /// `ResourceExhausted` if the registry is full of focused sessions.
    pub async fn register(
        &self,
        endpoint: FieldEndpointId,
        content: Box<dyn TextContent>,
        options: TextFieldOptions,
    ) -> Result<Registration, TextEditServerError> {
        let _admission = self.admission.lock().await;

        if self.endpoints.contains_key(&endpoint) {
            tracing::debug!("Rejected duplicate registration for endpoint {}", endpoint);
            return Err(TextEditServerError::AlreadyRegistered);
        }

        let limit = self.config.limits.max_sessions;
        while self.sessions.len() >= limit {
            let Some(victim) = self.least_recently_active_unfocused() else {
                tracing::warn!("Registry full ({} sessions), none evictable", limit);
                return Err(TextEditServerError::ResourceExhausted { limit });
            };
            tracing::warn!("Registry full ({} sessions), evicting {}", limit, victim);
            // A victim that gained focus or closed meanwhile is skipped; the loop re-checks.
            let _ = self.teardown(victim, CloseReason::Evicted).await;
        }

        let handle = TextFieldHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let field = FieldSynchronizer::new(content, self.config.limits.edit_limits());
        let (session, closed) = Session::new(
            handle,
            endpoint,
            field,
            options.clone(),
            self.events.clone(),
            Arc::clone(&self.metrics),
        );
        let session = Arc::new(session);

        self.sessions.insert(handle, Arc::clone(&session));
        self.endpoints.insert(endpoint, handle);
        self.metrics
            .registrations_total
            .fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            "Registered text field {} for endpoint {} (total: {})",
            handle,
            endpoint,
            self.sessions.len()
        );
        self.emit(EditServerEvent::Registered { handle, options });

        Ok(Registration { session, closed })
    }

    /// Client-initiated disconnect.
    pub async fn unregister(&self, handle: TextFieldHandle) -> Result<(), TextEditServerError> {
        self.teardown(handle, CloseReason::Unregistered)
            .await
            .map(|_| ())
    }

    /// Evict one session.
    ///
    /// Returns `Ok(false)` and leaves the session alone if it has focus.
    pub async fn evict(&self, handle: TextFieldHandle) -> Result<bool, TextEditServerError> {
        self.teardown(handle, CloseReason::Evicted).await
    }

    /// Evict every unfocused session idle for at least `idle_for`.
    ///
    /// Returns the number of sessions evicted.
    pub async fn evict_idle(&self, idle_for: Duration) -> usize {
        let candidates: Vec<TextFieldHandle> = self
            .sessions
            .iter()
            .filter(|entry| {
                let session = entry.value();
                !session.is_focused() && session.idle_for() >= idle_for
            })
            .map(|entry| *entry.key())
            .collect();

        let mut evicted = 0;
        for handle in candidates {
            if let Ok(true) = self.teardown(handle, CloseReason::Evicted).await {
                evicted += 1;
            }
        }
        evicted
    }

    /// Tear down every session.
    pub async fn shutdown(&self) {
        let handles: Vec<TextFieldHandle> = self.sessions.iter().map(|e| *e.key()).collect();
        tracing::info!("Shutting down registry ({} sessions)", handles.len());
        for handle in handles {
            let _ = self.teardown(handle, CloseReason::Shutdown).await;
        }
    }

    /// The one disconnect path.
    ///
    /// Returns `Ok(false)` if an eviction found the session focused.
    async fn teardown(
        &self,
        handle: TextFieldHandle,
        reason: CloseReason,
    ) -> Result<bool, TextEditServerError> {
        let session = self
            .session(handle)
            .ok_or(TextEditServerError::NotRegistered)?;

        let outcome = session
            .close(reason, || {
                self.sessions
                    .remove_if(&handle, |_, live| Arc::ptr_eq(live, &session));
                self.endpoints
                    .remove_if(&session.endpoint(), |_, live| *live == handle);
            })
            .await;
        match outcome {
            CloseOutcome::Closed => {}
            CloseOutcome::AlreadyClosed => return Err(TextEditServerError::NotRegistered),
            CloseOutcome::Focused => {
                tracing::debug!("Not evicting focused session {}", handle);
                return Ok(false);
            }
        }

        match reason {
            CloseReason::Unregistered => {
                self.metrics
                    .unregistrations_total
                    .fetch_add(1, Ordering::Relaxed);
                tracing::info!("Unregistered text field {}", handle);
            }
            CloseReason::Evicted => {
                self.metrics.evictions_total.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Evicted text field {}", handle);
            }
            CloseReason::Shutdown => {
                tracing::info!("Closed text field {} on shutdown", handle);
            }
        }
        Ok(true)
    }

    fn least_recently_active_unfocused(&self) -> Option<TextFieldHandle> {
        self.sessions
            .iter()
            .filter(|entry| !entry.value().is_focused())
            .max_by_key(|entry| entry.value().idle_for())
            .map(|entry| *entry.key())
    }

    fn emit(&self, event: EditServerEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Edit server event channel closed; dropping registry event");
        }
    }
}
