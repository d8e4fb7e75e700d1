pub mod config;
pub mod gate;
pub mod types;

pub use config::Config;
pub use gate::ConfigGate;
pub use types::{EnabledSink, EnabledSinkSet, MonitorSettings, SinkSettings};
