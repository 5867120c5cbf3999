//! Window geometry persistence.
//!
//! A window's [`WindowState`] is captured when the host saves its session and
//! validated against the attached displays on the next start, so a window
//! never comes back on a display that has since been unplugged.

use super::handle_owner::WindowHandleOwner;
use crate::native::{Display, DisplayId, DisplayProvider, Rectangle, display_matching};
use crate::platform::Platform;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default window size.
pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 768;

/// Keep at least this much of the window on screen at the right and bottom.
const EDGE_MARGIN: i32 = 128;

/// Persisted window mode. Minimized is never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Normal,
    Maximized,
    Fullscreen,
}

/// Saved geometry of one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub mode: WindowMode,
    /// Absent coordinates centre the window on the primary display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    #[serde(default, rename = "display", skip_serializing_if = "Option::is_none")]
    pub display_id: Option<DisplayId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_level: Option<f64>,
}

impl WindowState {
    /// A centred window of default size.
    pub fn default_for(mode: WindowMode) -> Self {
        Self {
            mode,
            x: None,
            y: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            display_id: None,
            zoom_level: None,
        }
    }

    fn with_bounds(mode: WindowMode, bounds: Rectangle) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: bounds.width,
            height: bounds.height,
            ..Self::default_for(mode)
        }
    }
}

impl Default for WindowState {
    fn default() -> Self {
        Self::default_for(WindowMode::Normal)
    }
}

/// Outcome of [`WindowStateStore::restore_window_state`].
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredWindowState {
    pub state: WindowState,
    pub has_multiple_displays: bool,
}

/// Fit `state` onto the attached displays.
///
/// Returns `None` when the state cannot be shown on any of them.
pub fn validate_window_state(mut state: WindowState, displays: &[Display]) -> Option<WindowState> {
    let (Some(mut x), Some(mut y)) = (state.x, state.y) else {
        return None;
    };
    if state.width == 0 || state.height == 0 {
        return None;
    }

    if let [display] = displays {
        if let Some(area) = display.usable_area() {
            let (mut width, mut height) = (state.width as i32, state.height as i32);
            let (aw, ah) = (area.width as i32, area.height as i32);

            x = x.max(area.x);
            y = y.max(area.y);
            width = width.min(aw);
            height = height.min(ah);
            if x > area.x + aw - EDGE_MARGIN {
                x = area.x + aw - width;
            }
            if y > area.y + ah - EDGE_MARGIN {
                y = area.y + ah - height;
            }
            x = x.max(area.x);
            y = y.max(area.y);

            state.x = Some(x);
            state.y = Some(y);
            state.width = width as u32;
            state.height = height as u32;
        }
        return Some(state);
    }

    if state.mode == WindowMode::Fullscreen
        && let Some(id) = state.display_id
        && let Some(display) = displays.iter().find(|d| d.id == id)
    {
        return Some(WindowState {
            x: Some(display.bounds.x),
            y: Some(display.bounds.y),
            ..WindowState::default_for(WindowMode::Fullscreen)
        });
    }

    let rect = Rectangle::new(x, y, state.width, state.height);
    let area = display_matching(displays, &rect)?.usable_area()?;
    let visible = rect.right() > area.x as i64
        && rect.bottom() > area.y as i64
        && (x as i64) < area.right()
        && (y as i64) < area.bottom();
    visible.then_some(state)
}

/// Captures and restores the geometry of one window.
pub struct WindowStateStore {
    displays: Arc<dyn DisplayProvider>,
    platform: Platform,
    restored: Mutex<Option<WindowState>>,
    zoom_level: Mutex<Option<f64>>,
}

impl WindowStateStore {
    pub fn new(displays: Arc<dyn DisplayProvider>, platform: Platform) -> Self {
        Self {
            displays,
            platform,
            restored: Mutex::new(None),
            zoom_level: Mutex::new(None),
        }
    }

    /// Validate a saved state against the attached displays.
    ///
    /// A missing or invalid state becomes the default state.
    pub fn restore_window_state(&self, saved: Option<WindowState>) -> RestoredWindowState {
        let (state, has_multiple_displays) = match self.displays.all_displays() {
            Ok(displays) => {
                let state = match saved {
                    Some(saved) => match validate_window_state(saved.clone(), &displays) {
                        Some(valid) => valid,
                        None => {
                            log::warn!("discarding window state {:?}: not visible on any display", saved);
                            WindowState::default()
                        }
                    },
                    None => WindowState::default(),
                };
                (state, displays.len() > 1)
            }
            Err(e) => {
                log::error!("failed to enumerate displays, window state not validated: {}", e);
                (saved.unwrap_or_default(), false)
            }
        };

        *self.restored.lock() = Some(state.clone());
        *self.zoom_level.lock() = state.zoom_level;
        RestoredWindowState {
            state,
            has_multiple_displays,
        }
    }

    /// The state applied at creation, after validation.
    pub fn restored_state(&self) -> Option<WindowState> {
        self.restored.lock().clone()
    }

    pub fn set_zoom_level(&self, zoom_level: Option<f64>) {
        *self.zoom_level.lock() = zoom_level;
    }

    pub fn zoom_level(&self) -> Option<f64> {
        *self.zoom_level.lock()
    }

    /// Capture the current geometry of `owner`'s window.
    pub fn serialize_window_state(&self, owner: &WindowHandleOwner) -> WindowState {
        let Some(win) = owner.win() else {
            return WindowState::default();
        };
        let zoom_level = self.zoom_level();

        if owner.is_full_screen() {
            let display_id = self
                .displays
                .all_displays()
                .ok()
                .and_then(|displays| display_matching(&displays, &win.bounds()).map(|d| d.id));
            let restored = self.restored_state().unwrap_or_default();
            return WindowState {
                mode: WindowMode::Fullscreen,
                display_id,
                zoom_level,
                ..restored
            };
        }

        let maximized = self.platform.persists_maximized() && win.is_maximized();
        let state = if maximized {
            WindowState::with_bounds(WindowMode::Maximized, win.normal_bounds())
        } else if win.is_minimized() {
            WindowState::with_bounds(WindowMode::Normal, win.normal_bounds())
        } else {
            WindowState::with_bounds(WindowMode::Normal, win.bounds())
        };
        WindowState { zoom_level, ..state }
    }
}
