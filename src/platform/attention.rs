//! Window-chrome attention cues for `FocusMode::Notify`.
//!
//! - **macOS**: bounce the dock icon once
//! - **Windows / Linux**: flash the taskbar entry until cleared

use super::Platform;
use crate::native::NativeWindow;

/// Ask the user to look at `win` without taking focus.
pub fn request_attention(platform: Platform, win: &dyn NativeWindow) {
    match platform {
        Platform::MacOs => win.request_user_attention(),
        Platform::Windows | Platform::Linux => win.flash_frame(true),
    }
}

/// Stop any ongoing attention cue on `win`.
pub fn clear_attention(platform: Platform, win: &dyn NativeWindow) {
    match platform {
        // A dock bounce ends by itself
        Platform::MacOs => {}
        Platform::Windows | Platform::Linux => win.flash_frame(false),
    }
}
