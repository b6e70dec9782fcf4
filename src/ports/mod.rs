//! Ports: traits the domain depends on, implemented by adapters.

pub mod config_port;
pub mod data_port;

pub use config_port::ConfigPort;
pub use data_port::DataPort;
