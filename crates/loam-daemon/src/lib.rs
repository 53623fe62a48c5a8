//! The Loam IDE daemon.
//!
//! A long-lived sidecar that answers language-service queries over a framed
//! binary pipe while the repository mutates on disk. One cooperative task
//! drives everything: the request pump, the change-backlog processor and the
//! telemetry flush all run as turns of the same loop, so no query ever
//! observes a half-applied invalidation.

pub mod backlog;
pub mod config;
pub mod error;
pub mod init;
pub mod protocol;
pub mod server;
pub mod state;
pub mod stubs;
pub mod telemetry;
pub mod wire;

pub use config::DaemonConfig;
pub use error::DaemonError;
pub use protocol::{ClientMessage, DocLoc, Notification, Request, ResponsePayload, ServerMessage};
pub use server::Daemon;
