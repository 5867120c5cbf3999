//! Configuration system for the casement window lifecycle core.
//!
//! This crate provides the data that flows into a window and the settings that
//! shape how windows behave:
//!
//! - [`WindowConfiguration`]: everything a window's content process needs to
//!   load: workspace identity, CLI-derived flags, user environment, zoom,
//!   policy data, performance marks and the active profile
//! - [`ParsedArgs`]: the CLI flags that influence window behaviour
//! - [`ShellConfig`]: application-level settings persisted as YAML
//! - [`ConfigError`]: typed errors for config I/O and validation

pub mod args;
pub mod error;
pub mod shell_config;
pub mod window_config;

pub use args::ParsedArgs;
pub use error::ConfigError;
pub use shell_config::{SamplingConfig, ShellConfig, TimeoutConfig, WindowSettings};
pub use window_config::{
    CLI_LAUNCH_ENV, FileToOpen, FilesToWait, PerformanceMark, ProfileId, ProfileRef,
    TelemetrySnapshot, WindowConfiguration, WindowId, WorkspaceIdentity, is_launched_from_cli,
};
