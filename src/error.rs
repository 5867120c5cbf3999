//! Typed error types for the window lifecycle core.
//!
//! Most failures in this crate are handled locally (logged and replaced with
//! a safe default); these variants cover what callers at the crate boundary
//! may still want to match on, plus the synthetic report forwarded to the
//! unexpected-error handler when an unresponsive window keeps hitting the
//! same call stack.

use casement_config::WindowId;
use thiserror::Error;

/// Top-level error type for window handling.
#[derive(Debug, Error)]
pub enum WindowError {
    /// `set_win` was called on an owner that already has a handle.
    #[error("window {0} already has a native handle bound")]
    AlreadyBound(WindowId),

    /// The owner was disposed and no longer has a native handle.
    #[error("window {0} has been disposed")]
    Disposed(WindowId),

    /// The native window or its content was destroyed.
    #[error("window {0} has been destroyed")]
    Destroyed(WindowId),

    /// A one-way IPC message could not be delivered.
    #[error("IPC send on channel '{channel}' failed: {message}")]
    Ipc {
        /// Channel the message was addressed to.
        channel: String,
        /// Backend-specific failure description.
        message: String,
    },

    /// The platform backend could not create a native window.
    #[error("native window creation failed: {0}")]
    Creation(String),

    /// The display layout could not be queried.
    #[error("display query failed: {0}")]
    Display(String),

    /// A call stack dominated the samples of an unresponsive episode.
    #[error("window {window_id} unresponsive (content pid {pid:?}):\n{stack}")]
    UnresponsiveSample {
        /// The recurring call stack.
        stack: String,
        /// Window the samples were taken from.
        window_id: WindowId,
        /// Content process id, when the backend exposes it.
        pid: Option<u32>,
    },
}
