//! # textsync-edit-server
//!
//! Session layer for textsync: lets an edit server (typically an IME)
//! read and edit a client's text field without racing the client.
//!
//! Each registered field gets a [`Session`](session::Session) holding the
//! field's synchronizer behind one async mutex. Sessions live in a
//! [`SessionRegistry`](registry::SessionRegistry) which evicts idle,
//! unfocused fields and reports lifecycle changes to the edit server over
//! an event channel.
//!
//! ## Architecture
//!
//! ```text
//!  client (text field)                 edit server (IME)
//!        │ register / notify_*                ▲ EditServerEvent
//!        ▼                                    │
//!  ┌───────────────────────────────────────────────┐
//!  │ SessionRegistry ── DashMap<handle, Session>   │
//!  │   Session ── Mutex<FieldSynchronizer>         │◄── Request / Response
//!  │   eviction task (tokio interval)              │    (MessagePack)
//!  └───────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod events;
pub mod eviction;
pub mod registry;
pub mod session;
pub mod telemetry;

pub use config::Config;
pub use error::{Result, ServerError};
pub use events::{
    event_channel, ClosedSignal, CloseReason, EditServerEvent, EventReceiver, EventSender,
};
pub use registry::{Registration, RegistryMetrics, SessionRegistry};
pub use session::Session;
