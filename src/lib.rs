pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod network;
pub mod reporting;
pub mod session_management;
pub mod sinks;

pub use configuration::{Config, ConfigGate};
pub use controller::Controller;
pub use reporting::Reporter;
pub use session_management::{Session, SessionCollection, SessionMonitor};
pub use sinks::{Sink, SinkRegistry};
