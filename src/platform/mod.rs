//! Platform abstraction layer.
//!
//! Window behaviour differs per OS in a handful of well-known places. Rather
//! than scattering `#[cfg(target_os = ...)]` blocks, components carry a
//! [`Platform`] value and ask it about capabilities. This keeps every branch
//! reachable from tests on any host OS.
//!
//! # Contents
//!
//! | Item | Description |
//! |---|---|
//! | [`Platform`] | The OS a window runs on, with capability queries |
//! | [`request_attention`] | Flash or bounce window chrome for `FocusMode::Notify` |
//! | [`clear_attention`] | Undo [`request_attention`] |

mod attention;

pub use attention::{clear_attention, request_attention};

/// Operating system family a window runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// The OS confirms fullscreen transitions only after the animation ends,
    /// and reports non-fullscreen until then.
    pub fn has_delayed_fullscreen_confirmation(self) -> bool {
        self == Platform::MacOs
    }

    /// A borderless "simple" fullscreen mode exists next to the native one.
    pub fn supports_simple_fullscreen(self) -> bool {
        self == Platform::MacOs
    }

    /// Native caption buttons can be drawn over custom title bar content.
    pub fn supports_window_controls_overlay(self) -> bool {
        matches!(self, Platform::Windows | Platform::Linux)
    }

    /// The OS asks before showing the system menu, so a custom one can be
    /// shown instead.
    pub fn supports_custom_system_context_menu(self) -> bool {
        self == Platform::Windows
    }

    /// Display hot-plug is reported per window.
    pub fn reports_display_added(self) -> bool {
        self == Platform::MacOs
    }

    /// The application can steal focus from other applications.
    pub fn can_steal_app_focus(self) -> bool {
        self == Platform::MacOs
    }

    /// Maximize is a real window mode. On macOS it is a zoom that should not
    /// be persisted as maximized.
    pub fn persists_maximized(self) -> bool {
        self != Platform::MacOs
    }

    /// Windows are not restored onto the right display on creation when
    /// several displays are attached, so bounds are re-applied afterwards.
    pub fn needs_bounds_reapplied_on_multi_display(self) -> bool {
        self == Platform::MacOs
    }
}
