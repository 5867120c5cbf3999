//! Window lifecycle core.
//!
//! | Module | Responsibility |
//! |---|---|
//! | [`handle_owner`] | Owns the native handle, routes raw OS events, focus modes |
//! | [`fullscreen`] | Reconciles asynchronous fullscreen transitions |
//! | [`state_store`] | Serializes and validates window geometry |
//! | [`crash_recovery`] | Decides how to react to content-process failures |
//! | [`sampler`] | Call-stack sampling while unresponsive |
//! | [`lifecycle`] | Load/reload sequencing and readiness |

pub mod badge;
pub mod crash_recovery;
pub mod events;
pub mod fullscreen;
pub mod handle_owner;
pub mod lifecycle;
pub mod ready;
pub mod sampler;
pub mod state_store;

pub use badge::{AttentionBadgeRegistry, BadgeIndicator, BadgeToken};
pub use crash_recovery::{
    CrashRecoveryPolicy, ErrorDetails, ErrorEvent, ErrorKind, RecoveryAction, RecoveryContext,
    RecoveryHost,
};
pub use events::{RawPayload, RawWindowEvent, WindowEvent};
pub use fullscreen::FullscreenArbiter;
pub use handle_owner::{FocusMode, OwnerOptions, WindowHandleOwner};
pub use lifecycle::{
    CreateOptions, LifecycleController, LifecycleEvent, LoadOptions, LoadReason, ShellEnvironment,
};
pub use ready::ReadyState;
pub use sampler::{SampleFrequencyMap, SampleReport, SamplerSettings, UnresponsiveSampler};
pub use state_store::{RestoredWindowState, WindowMode, WindowState, WindowStateStore};
