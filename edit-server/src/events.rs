//! Notifications pushed to the edit server.
//!
//! The registry and its sessions never call into the edit server directly;
//! they push [`EditServerEvent`]s onto an unbounded channel the edit server
//! drains at its own pace.

use textsync_edit_types::{TextFieldHandle, TextFieldOptions, TextFieldState};
use tokio::sync::{mpsc, watch};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client disconnected.
    Unregistered,
    /// The registry reclaimed an unfocused session.
    Evicted,
    /// The registry shut down.
    Shutdown,
}

/// Something the edit server should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditServerEvent {
    /// A text field was registered.
    Registered {
        /// The new session.
        handle: TextFieldHandle,
        /// Options at registration.
        options: TextFieldOptions,
    },
    /// A field gained focus.
    FocusGained {
        /// The session.
        handle: TextFieldHandle,
        /// State at the moment focus arrived.
        state: TextFieldState,
    },
    /// A field lost focus.
    FocusLost {
        /// The session.
        handle: TextFieldHandle,
    },
    /// A field's options were replaced.
    OptionsChanged {
        /// The session.
        handle: TextFieldHandle,
        /// The new options.
        options: TextFieldOptions,
    },
    /// The client reported an out-of-band change.
    StateChanged {
        /// The session.
        handle: TextFieldHandle,
        /// State after the change.
        state: TextFieldState,
    },
    /// A session ended; its handle and transaction ids are dead.
    SessionClosed {
        /// The session.
        handle: TextFieldHandle,
        /// Why it ended.
        reason: CloseReason,
    },
}

/// Sending half of the edit-server event channel.
pub type EventSender = mpsc::UnboundedSender<EditServerEvent>;

/// Receiving half of the edit-server event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<EditServerEvent>;

/// Create an edit-server event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Client-side view of a session's connection.
///
/// Resolves once the session is torn down, whichever side initiated it.
/// The client's only correct response is to re-register.
#[derive(Debug, Clone)]
pub struct ClosedSignal {
    rx: watch::Receiver<Option<CloseReason>>,
}

impl ClosedSignal {
    pub(crate) fn new(rx: watch::Receiver<Option<CloseReason>>) -> Self {
        Self { rx }
    }

    /// The close reason, if the session has already closed.
    pub fn reason(&self) -> Option<CloseReason> {
        *self.rx.borrow()
    }

    /// Whether the session has closed.
    pub fn is_closed(&self) -> bool {
        self.reason().is_some()
    }

    /// Wait for the session to close.
    pub async fn closed(&mut self) -> CloseReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                // Sender dropped without a teardown
                return self.reason().unwrap_or(CloseReason::Shutdown);
            }
        }
    }
}
