//! Session management core module.
//!
//! This module provides the session model shared with capability listeners,
//! the collection they write to, and the monitor that dispatches finished
//! sessions to the telemetry sinks.

/// Submodule for the shared session collection.
pub mod collection;
/// Submodule for session data structures.
pub mod session;
/// Submodule for the dispatch loop.
pub mod session_monitor;

pub use collection::SessionCollection;
pub use session::{ConnectionState, LoginAttempt, Session};
pub use session_monitor::SessionMonitor;
