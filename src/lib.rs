// Library exports for hosts and integration tests
//
// # Mutex Usage Policy
//
// casement uses `parking_lot::Mutex`/`RwLock` for all window state. Critical
// sections are short and a guard is never held across an `.await`; state
// needed after a suspension point is cloned out first. Cross-task signalling
// uses tokio channels (`oneshot`, `broadcast`) and `CancellationToken`.

/// Crate version, for hosts that report it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod cli;
pub mod error;
pub mod native;
pub mod platform;
pub mod race;
pub mod services;
pub mod window;

pub use casement_config as config;
pub use error::WindowError;
