// === PUBLIC CONTRACT ===
// Only the contract module should be public for other crates to consume
pub mod contract;

pub use contract::{client, error, model};

// === INTERNAL MODULES ===
// Exposed for wiring in the CLI and for integration tests.
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;

pub use config::AlbumsConfig;
