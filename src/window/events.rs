//! Typed window events and the table that produces them from raw OS events.
//!
//! The backend reports OS events by name ([`RawWindowEvent`]). Each name has
//! one entry in [`EVENT_ROUTES`]: a gate deciding whether the route exists on
//! this platform, and a constructor turning the raw payload into a
//! [`WindowEvent`]. A constructor returning `None` means the OS handles the
//! event itself.

use crate::native::NativeWindow;
use crate::platform::Platform;

/// Events a window emits to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Maximize,
    Unmaximize,
    Close,
    Focus,
    EnterFullScreen,
    LeaveFullScreen,
    AlwaysOnTopChanged(bool),
    /// Right click on the title bar; offset relative to the window origin
    SystemContextMenu { x: i32, y: i32 },
    DisplayAdded,
}

/// Data carried by a raw OS event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawPayload {
    #[default]
    None,
    Flag(bool),
    /// Screen coordinates
    Point { x: i32, y: i32 },
}

/// An OS event as reported by the windowing backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWindowEvent {
    pub name: String,
    pub payload: RawPayload,
}

impl RawWindowEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: RawPayload::None,
        }
    }

    pub fn with_payload(name: impl Into<String>, payload: RawPayload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Width of the application icon at the left of the title bar.
pub const APP_ICON_WIDTH: i32 = 30;

/// Minimum height of the title bar area that opens the custom system menu.
pub const MIN_TITLEBAR_HEIGHT: i32 = 35;

/// What a route sees when constructing its event.
pub struct RouteContext<'a> {
    pub win: &'a dyn NativeWindow,
}

/// One raw-event name and how it becomes a typed event.
pub struct EventRoute {
    pub name: &'static str,
    /// Whether the route exists for a platform and title bar style
    pub gate: fn(Platform, bool) -> bool,
    pub build: fn(&RouteContext<'_>, RawPayload) -> Option<WindowEvent>,
}

fn always(_: Platform, _: bool) -> bool {
    true
}

fn custom_system_menu(platform: Platform, custom_titlebar: bool) -> bool {
    platform.supports_custom_system_context_menu() && custom_titlebar
}

fn display_hotplug(platform: Platform, _: bool) -> bool {
    platform.reports_display_added()
}

/// Offer a custom system menu for clicks on the title bar, except over the
/// application icon which keeps the OS menu.
fn system_context_menu(ctx: &RouteContext<'_>, payload: RawPayload) -> Option<WindowEvent> {
    let RawPayload::Point { x, y } = payload else {
        return None;
    };
    let bounds = ctx.win.bounds();
    let cx = x - bounds.x;
    let cy = y - bounds.y;
    let titlebar_height = MIN_TITLEBAR_HEIGHT.max((bounds.height as f64 * 0.15) as i32);

    if cx > APP_ICON_WIDTH && cy >= 0 && cy <= titlebar_height {
        Some(WindowEvent::SystemContextMenu { x: cx, y: cy })
    } else {
        None
    }
}

/// Raw event routes, registered once per window when the handle is bound.
pub static EVENT_ROUTES: &[EventRoute] = &[
    EventRoute {
        name: "maximize",
        gate: always,
        build: |_, _| Some(WindowEvent::Maximize),
    },
    EventRoute {
        name: "unmaximize",
        gate: always,
        build: |_, _| Some(WindowEvent::Unmaximize),
    },
    EventRoute {
        name: "close",
        gate: always,
        build: |_, _| Some(WindowEvent::Close),
    },
    EventRoute {
        name: "focus",
        gate: always,
        build: |_, _| Some(WindowEvent::Focus),
    },
    EventRoute {
        name: "enter-full-screen",
        gate: always,
        build: |_, _| Some(WindowEvent::EnterFullScreen),
    },
    EventRoute {
        name: "leave-full-screen",
        gate: always,
        build: |_, _| Some(WindowEvent::LeaveFullScreen),
    },
    EventRoute {
        name: "always-on-top-changed",
        gate: always,
        build: |_, payload| match payload {
            RawPayload::Flag(on_top) => Some(WindowEvent::AlwaysOnTopChanged(on_top)),
            _ => None,
        },
    },
    EventRoute {
        name: "system-context-menu",
        gate: custom_system_menu,
        build: system_context_menu,
    },
    EventRoute {
        name: "display-added",
        gate: display_hotplug,
        build: |_, _| Some(WindowEvent::DisplayAdded),
    },
];

/// Routes that exist for a platform and title bar style.
pub fn routes_for(platform: Platform, custom_titlebar: bool) -> Vec<&'static EventRoute> {
    EVENT_ROUTES
        .iter()
        .filter(|route| (route.gate)(platform, custom_titlebar))
        .collect()
}
