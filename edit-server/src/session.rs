//! Per-field session.
//!
//! A Session binds one registered text field to the edit server. Its
//! [`FieldSynchronizer`] sits behind a single async mutex, which is the
//! serialization point for every transaction and composition call on the
//! field. Teardown swaps the synchronizer out for `None`, so calls racing
//! with (or arriving after) teardown see [`TextFieldError::Closed`].

use crate::error::{state_update_error, ServerError};
use crate::events::{ClosedSignal, CloseReason, EditServerEvent, EventSender};
use crate::registry::RegistryMetrics;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use textsync_edit_core::FieldSynchronizer;
use textsync_edit_types::{
    CompositionUpdate, FieldEndpointId, Range, Request, Response, RevisionId, Selection,
    TextEditServerError, TextFieldError, TextFieldHandle, TextFieldOptions, TextFieldState,
    TransactionId,
};
use tokio::sync::{watch, Mutex, RwLock};

/// Result of a teardown attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseOutcome {
    /// The session was open and is now closed.
    Closed,
    /// Someone else closed it first.
    AlreadyClosed,
    /// Eviction refused because the field has focus.
    Focused,
}

/// A live registration of one text field.
pub struct Session {
    handle: TextFieldHandle,
    endpoint: FieldEndpointId,
    field: Mutex<Option<FieldSynchronizer>>,
    options: RwLock<TextFieldOptions>,
    focused: AtomicBool,
    /// Reference point for `last_active_ms`.
    epoch: Instant,
    last_active_ms: AtomicU64,
    closed: watch::Sender<Option<CloseReason>>,
    events: EventSender,
    metrics: Arc<RegistryMetrics>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.handle)
            .field("endpoint", &self.endpoint)
            .field("focused", &self.is_focused())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        handle: TextFieldHandle,
        endpoint: FieldEndpointId,
        field: FieldSynchronizer,
        options: TextFieldOptions,
        events: EventSender,
        metrics: Arc<RegistryMetrics>,
    ) -> (Self, ClosedSignal) {
        let (closed, closed_rx) = watch::channel(None);
        let mut field = field;
        field.apply_options(&options);
        let session = Self {
            handle,
            endpoint,
            field: Mutex::new(Some(field)),
            options: RwLock::new(options),
            focused: AtomicBool::new(false),
            epoch: Instant::now(),
            last_active_ms: AtomicU64::new(0),
            closed,
            events,
            metrics,
        };
        (session, ClosedSignal::new(closed_rx))
    }

    /// The session's handle.
    pub fn handle(&self) -> TextFieldHandle {
        self.handle
    }

    /// The client endpoint this session was registered for.
    pub fn endpoint(&self) -> FieldEndpointId {
        self.endpoint
    }

    /// Whether the field currently has focus.
    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::Acquire)
    }

    /// Whether the session has been torn down.
    pub fn is_closed(&self) -> bool {
        self.closed.borrow().is_some()
    }

    /// Current options.
    pub async fn options(&self) -> TextFieldOptions {
        self.options.read().await.clone()
    }

    /// Time since the last call on this session.
    pub fn idle_for(&self) -> Duration {
        let now = self.epoch.elapsed().as_millis() as u64;
        Duration::from_millis(now.saturating_sub(self.last_active_ms.load(Ordering::Acquire)))
    }

    fn touch(&self) {
        let now = self.epoch.elapsed().as_millis() as u64;
        self.last_active_ms.store(now, Ordering::Release);
    }

    fn emit(&self, event: EditServerEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Edit server event channel closed; dropping event for {}", self.handle);
        }
    }

    async fn with_field<T>(
        &self,
        op: impl FnOnce(&mut FieldSynchronizer) -> Result<T, TextFieldError>,
    ) -> Result<T, TextFieldError> {
        let mut guard = self.field.lock().await;
        let field = guard.as_mut().ok_or(TextFieldError::Closed)?;
        self.touch();
        let result = op(field);
        if let Err(TextFieldError::StaleRevision { presented, current }) = &result {
            self.metrics
                .stale_revisions_total
                .fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Stale revision on {}: presented {}, current {}",
                self.handle,
                presented,
                current
            );
        }
        result
    }

    /// Current compact state.
    pub async fn state(&self) -> Result<TextFieldState, TextFieldError> {
        self.with_field(|f| f.state()).await
    }

    /// Read one bounded chunk of content starting at `range.start`.
    pub async fn get_text(&self, range: Range) -> Result<(Range, String), TextFieldError> {
        self.with_field(|f| f.get_text(range)).await
    }

    /// Read the whole content chunk by chunk.
    ///
    /// Each chunk is a separate call, so an edit landing between chunks
    /// can tear the result; compare revisions before and after if that
    /// matters.
    pub async fn read_all(&self) -> Result<String, TextFieldError> {
        let len = self.state().await?.contents_range.end;
        let mut out = String::new();
        let mut start = 0;
        while start < len {
            let (read, text) = self.get_text(Range { start, end: len }).await?;
            if read.is_empty() {
                return Err(TextFieldError::Internal(format!(
                    "read made no progress at {start} of {len}"
                )));
            }
            out.push_str(&text);
            start = read.end;
        }
        Ok(out)
    }

    /// Open a transaction.
    pub async fn begin_transaction(
        &self,
        revision_id: RevisionId,
    ) -> Result<TransactionId, TextFieldError> {
        let id = self.with_field(|f| f.begin_transaction(revision_id)).await?;
        tracing::debug!("Began transaction {} on {} at revision {}", id, self.handle, revision_id);
        Ok(id)
    }

    /// Buffer a selection change.
    pub async fn set_selection(
        &self,
        transaction_id: TransactionId,
        selection: Selection,
    ) -> Result<(), TextFieldError> {
        self.with_field(|f| f.set_selection(transaction_id, selection))
            .await
    }

    /// Buffer a text replacement.
    pub async fn set_text(
        &self,
        transaction_id: TransactionId,
        old_range: Range,
        new_text: &str,
    ) -> Result<(), TextFieldError> {
        self.with_field(|f| f.set_text(transaction_id, old_range, new_text))
            .await
    }

    /// Commit the Active transaction.
    pub async fn commit_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<TextFieldState, TextFieldError> {
        let state = self
            .with_field(|f| f.commit_transaction(transaction_id))
            .await?;
        self.metrics.commits_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Committed transaction {} on {} -> revision {}",
            transaction_id,
            self.handle,
            state.revision_id
        );
        Ok(state)
    }

    /// Cancel the Active transaction.
    pub async fn cancel_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<TextFieldState, TextFieldError> {
        let state = self
            .with_field(|f| f.cancel_transaction(transaction_id))
            .await?;
        self.metrics.cancels_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Cancelled transaction {} on {} -> revision {}",
            transaction_id,
            self.handle,
            state.revision_id
        );
        Ok(state)
    }

    /// Open a composition.
    pub async fn begin_composition(&self, revision_id: RevisionId) -> Result<(), TextFieldError> {
        self.with_field(|f| f.begin_composition(revision_id)).await?;
        tracing::debug!("Began composition on {} at revision {}", self.handle, revision_id);
        Ok(())
    }

    /// Commit the Active transaction into the open composition.
    pub async fn commit_in_composition(
        &self,
        transaction_id: TransactionId,
        update: CompositionUpdate,
    ) -> Result<TextFieldState, TextFieldError> {
        let state = self
            .with_field(|f| f.commit_in_composition(transaction_id, update))
            .await?;
        self.metrics.commits_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Committed transaction {} into composition on {} -> revision {}",
            transaction_id,
            self.handle,
            state.revision_id
        );
        Ok(state)
    }

    /// Accept the open composition.
    pub async fn complete_composition(&self) -> Result<TextFieldState, TextFieldError> {
        let state = self.with_field(|f| f.complete_composition()).await?;
        tracing::debug!(
            "Completed composition on {} -> revision {}",
            self.handle,
            state.revision_id
        );
        Ok(state)
    }

    /// Revert and close the open composition.
    pub async fn cancel_composition(&self) -> Result<TextFieldState, TextFieldError> {
        let state = self.with_field(|f| f.cancel_composition()).await?;
        self.metrics.cancels_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Cancelled composition on {} -> revision {}",
            self.handle,
            state.revision_id
        );
        Ok(state)
    }

    /// The field gained focus.
    pub async fn notify_focus_gained(&self) -> Result<(), TextEditServerError> {
        self.with_field(|f| {
            let state = f.state()?;
            self.focused.store(true, Ordering::Release);
            self.emit(EditServerEvent::FocusGained {
                handle: self.handle,
                state,
            });
            Ok(())
        })
        .await
        .map_err(state_update_error)
    }

    /// The field lost focus. Unfocused sessions become eviction candidates.
    pub async fn notify_focus_lost(&self) -> Result<(), TextEditServerError> {
        self.with_field(|_| {
            self.focused.store(false, Ordering::Release);
            self.emit(EditServerEvent::FocusLost {
                handle: self.handle,
            });
            Ok(())
        })
        .await
        .map_err(state_update_error)
    }

    /// The client changed the field out-of-band.
    ///
    /// `state.revision_id` must move the ledger forward. An Active
    /// transaction keeps going under the revision it was opened with.
    pub async fn notify_state_changed(
        &self,
        state: TextFieldState,
    ) -> Result<(), TextEditServerError> {
        let state = self
            .with_field(|f| {
                f.observe_external(&state)?;
                f.state()
            })
            .await
            .map_err(state_update_error)?;
        self.emit(EditServerEvent::StateChanged {
            handle: self.handle,
            state,
        });
        Ok(())
    }

    /// Replace the field's options.
    pub async fn update_options(
        &self,
        options: TextFieldOptions,
    ) -> Result<(), TextEditServerError> {
        self.with_field(|f| {
            f.apply_options(&options);
            Ok(())
        })
        .await
        .map_err(state_update_error)?;
        *self.options.write().await = options.clone();
        self.emit(EditServerEvent::OptionsChanged {
            handle: self.handle,
            options,
        });
        Ok(())
    }

    /// Dispatch a protocol request.
    pub async fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::GetText { range } => match self.get_text(range).await {
                Ok((range, text)) => Response::Text { range, text },
                Err(error) => Response::Error { error },
            },
            Request::GetState => self.state().await.into(),
            Request::BeginTransaction { revision_id } => {
                match self.begin_transaction(revision_id).await {
                    Ok(transaction_id) => Response::TransactionBegun { transaction_id },
                    Err(error) => Response::Error { error },
                }
            }
            Request::SetSelection {
                transaction_id,
                selection,
            } => ack(self.set_selection(transaction_id, selection).await),
            Request::SetText {
                transaction_id,
                old_range,
                new_text,
            } => ack(self.set_text(transaction_id, old_range, &new_text).await),
            Request::CommitTransaction { transaction_id } => {
                self.commit_transaction(transaction_id).await.into()
            }
            Request::CancelTransaction { transaction_id } => {
                self.cancel_transaction(transaction_id).await.into()
            }
            Request::BeginComposition { revision_id } => {
                ack(self.begin_composition(revision_id).await)
            }
            Request::CommitTransactionInComposition {
                transaction_id,
                composition_update,
            } => self
                .commit_in_composition(transaction_id, composition_update)
                .await
                .into(),
            Request::CompleteComposition => self.complete_composition().await.into(),
            Request::CancelComposition => self.cancel_composition().await.into(),
        }
    }

    /// Decode a MessagePack request, dispatch it, and encode the response.
    pub async fn handle_frame(&self, bytes: &[u8]) -> Result<Vec<u8>, ServerError> {
        let request = Request::from_bytes(bytes)?;
        let response = self.handle_request(request).await;
        Ok(response.to_bytes()?)
    }

    /// Tear the session down, implicitly cancelling whatever is open.
    ///
    /// Focus only changes under the field lock, so an eviction refused
    /// here cannot race a concurrent `notify_focus_gained`. `unlink` runs
    /// under the lock before the closed signal fires.
    pub(crate) async fn close(&self, reason: CloseReason, unlink: impl FnOnce()) -> CloseOutcome {
        let mut guard = self.field.lock().await;
        if guard.is_some() && reason == CloseReason::Evicted && self.is_focused() {
            return CloseOutcome::Focused;
        }
        let Some(mut field) = guard.take() else {
            return CloseOutcome::AlreadyClosed;
        };
        match field.abort() {
            Ok(true) => tracing::info!("Cancelled open edits on {} during teardown", self.handle),
            Ok(false) => {}
            Err(e) => tracing::warn!("Teardown of {} could not revert edits: {}", self.handle, e),
        }
        unlink();
        self.focused.store(false, Ordering::Release);
        self.closed.send_replace(Some(reason));
        drop(guard);

        self.emit(EditServerEvent::SessionClosed {
            handle: self.handle,
            reason,
        });
        CloseOutcome::Closed
    }
}

fn ack(result: Result<(), TextFieldError>) -> Response {
    match result {
        Ok(()) => Response::Ack,
        Err(error) => Response::Error { error },
    }
}
