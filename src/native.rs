//! Seams to the platform windowing backend.
//!
//! The core never talks to an OS API directly. A host application implements
//! [`NativeWindow`] for its window type, [`NativeWindowFactory`] to create
//! them and [`DisplayProvider`] to enumerate monitors. Raw OS events are fed
//! back through `WindowHandleOwner::dispatch_raw`.

use crate::error::WindowError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Identifier the OS assigns to a display.
pub type DisplayId = i64;

/// A rectangle in screen coordinates (logical pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Area shared with `other`, zero when they do not overlap.
    pub fn intersection_area(&self, other: &Rectangle) -> u64 {
        let w = self.right().min(other.right()) - (self.x as i64).max(other.x as i64);
        let h = self.bottom().min(other.bottom()) - (self.y as i64).max(other.y as i64);
        if w <= 0 || h <= 0 {
            0
        } else {
            (w * h) as u64
        }
    }

    fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A monitor attached to the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub id: DisplayId,
    /// Full display bounds
    pub bounds: Rectangle,
    /// Bounds minus taskbars, docks and menu bars
    pub work_area: Rectangle,
}

impl Display {
    /// The usable area of this display.
    ///
    /// Prefers the work area to account for taskbars. Some X11 sessions
    /// report empty bounds, so non-positive sizes are rejected.
    pub fn usable_area(&self) -> Option<Rectangle> {
        if self.work_area.has_area() {
            Some(self.work_area)
        } else if self.bounds.has_area() {
            Some(self.bounds)
        } else {
            None
        }
    }
}

/// Pick the display a rectangle mostly sits on.
///
/// Returns the display with the largest overlap, falling back to the first
/// (primary) display when none overlaps.
pub fn display_matching<'a>(displays: &'a [Display], rect: &Rectangle) -> Option<&'a Display> {
    displays
        .iter()
        .map(|d| (d, d.bounds.intersection_area(rect)))
        .filter(|(_, area)| *area > 0)
        .max_by_key(|(_, area)| *area)
        .map(|(d, _)| d)
        .or_else(|| displays.first())
}

/// Enumerates the currently attached displays.
pub trait DisplayProvider: Send + Sync {
    fn all_displays(&self) -> Result<Vec<Display>, WindowError>;
}

/// Geometry of the native caption buttons drawn over a custom title bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitlebarOverlay {
    pub height: u32,
}

/// How a native window should be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeWindowOptions {
    pub title: String,
    /// Absent coordinates centre the window on the primary display
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    /// Whether the window is visible immediately after creation
    pub show: bool,
    pub custom_titlebar: bool,
    pub simple_full_screen: bool,
}

/// A live OS window plus the web-content surface it hosts.
///
/// Methods are best-effort: a backend for which an operation makes no sense
/// on the current OS simply does nothing.
#[async_trait]
pub trait NativeWindow: Send + Sync {
    fn is_destroyed(&self) -> bool;
    /// Whether the content surface inside the window is gone
    fn is_content_destroyed(&self) -> bool;
    fn destroy(&self);

    fn focus(&self);
    fn is_focused(&self) -> bool;
    fn show(&self);
    fn is_visible(&self) -> bool;
    fn is_minimized(&self) -> bool;
    fn restore(&self);
    fn maximize(&self);
    fn is_maximized(&self) -> bool;
    fn set_title(&self, title: &str);

    fn set_full_screen(&self, full_screen: bool);
    fn is_full_screen(&self) -> bool;
    fn set_simple_full_screen(&self, full_screen: bool);
    fn is_simple_full_screen(&self) -> bool;

    fn bounds(&self) -> Rectangle;
    /// Bounds the window returns to when un-maximized
    fn normal_bounds(&self) -> Rectangle;
    fn set_bounds(&self, bounds: Rectangle);

    /// Flash the taskbar entry until stopped
    fn flash_frame(&self, flash: bool);
    /// Bounce the dock icon once
    fn request_user_attention(&self);
    /// Activate the application even if another one is frontmost
    fn steal_app_focus(&self);

    fn set_titlebar_overlay(&self, overlay: TitlebarOverlay);

    /// Start navigating the content surface
    fn load_url(&self, url: &str);
    /// One-way message to the content process
    fn send(&self, channel: &str, args: &[Value]) -> Result<(), WindowError>;

    fn open_dev_tools(&self);
    fn is_dev_tools_opened(&self) -> bool;
    fn content_process_id(&self) -> Option<u32>;

    /// Interrupt the content process and capture its current call stack
    async fn collect_call_stack(&self) -> Option<String>;
}

/// Creates native windows.
#[async_trait]
pub trait NativeWindowFactory: Send + Sync {
    async fn create_window(
        &self,
        options: &NativeWindowOptions,
    ) -> Result<Arc<dyn NativeWindow>, WindowError>;
}
