pub mod comms;
pub mod config;
pub mod errors;
pub mod monitor;
pub mod registry;
pub mod rotation;
pub mod token;
pub mod utils;

// Crate version exposed for runtime queries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
