//! Ownership of the native window handle.
//!
//! [`WindowHandleOwner`] is the only holder of the strong handle reference.
//! Everybody else goes through [`WindowHandleOwner::win`], which returns
//! `None` once the owner has been disposed, so a late timer or event never
//! touches a dead window.

use super::badge::{AttentionBadgeRegistry, BadgeToken};
use super::events::{EventRoute, RawWindowEvent, RouteContext, WindowEvent, routes_for};
use super::fullscreen::FullscreenArbiter;
use crate::error::WindowError;
use crate::native::{NativeWindow, Rectangle, TitlebarOverlay};
use crate::platform::{self, Platform};
use casement_config::{ShellConfig, WindowId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Default height of the native caption-button overlay.
pub const DEFAULT_OVERLAY_HEIGHT: u32 = 35;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How a window should take focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    /// Focus the window (restoring it if minimized)
    Transfer,
    /// Leave focus where it is and ask for attention
    Notify,
    /// Take focus from other applications where the OS allows it
    Force,
}

/// Per-window settings derived from [`ShellConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerOptions {
    pub custom_titlebar: bool,
    pub native_full_screen: bool,
    pub fullscreen_timeout: Duration,
}

impl OwnerOptions {
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            custom_titlebar: config.window.custom_titlebar,
            native_full_screen: config.window.native_full_screen,
            fullscreen_timeout: Duration::from_millis(config.timeouts.fullscreen_transition_ms),
        }
    }
}

impl Default for OwnerOptions {
    fn default() -> Self {
        Self::from_config(&ShellConfig::default())
    }
}

pub struct WindowHandleOwner {
    window_id: WindowId,
    platform: Platform,
    custom_titlebar: bool,
    win: RwLock<Option<Arc<dyn NativeWindow>>>,
    disposed: AtomicBool,
    routes: OnceLock<Vec<&'static EventRoute>>,
    events: broadcast::Sender<WindowEvent>,
    badges: Arc<AttentionBadgeRegistry>,
    badge_token: Mutex<Option<BadgeToken>>,
    overlay_height: AtomicU32,
    last_focus_time: Mutex<Option<Instant>>,
    pub(crate) fullscreen: FullscreenArbiter,
}

impl WindowHandleOwner {
    pub fn new(
        window_id: WindowId,
        platform: Platform,
        options: OwnerOptions,
        badges: Arc<AttentionBadgeRegistry>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            window_id,
            platform,
            custom_titlebar: options.custom_titlebar,
            win: RwLock::new(None),
            disposed: AtomicBool::new(false),
            routes: OnceLock::new(),
            events,
            badges,
            badge_token: Mutex::new(None),
            overlay_height: AtomicU32::new(DEFAULT_OVERLAY_HEIGHT),
            last_focus_time: Mutex::new(None),
            fullscreen: FullscreenArbiter::new(
                platform,
                options.native_full_screen,
                options.fullscreen_timeout,
            ),
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Bind the native handle. A handle can be bound exactly once.
    pub fn set_win(&self, win: Arc<dyn NativeWindow>) -> Result<(), WindowError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(WindowError::Disposed(self.window_id));
        }
        {
            let mut slot = self.win.write();
            if slot.is_some() {
                return Err(WindowError::AlreadyBound(self.window_id));
            }
            *slot = Some(win.clone());
        }

        self.apply_window_controls(win.as_ref());
        let routes = self
            .routes
            .get_or_init(|| routes_for(self.platform, self.custom_titlebar));
        debug_info!(
            "WINDOW",
            "window {} bound with {} event routes",
            self.window_id,
            routes.len()
        );
        Ok(())
    }

    /// The native handle, or `None` once disposed.
    pub fn win(&self) -> Option<Arc<dyn NativeWindow>> {
        self.win.read().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Names of the raw events this window reacts to.
    pub fn registered_events(&self) -> Vec<&'static str> {
        self.routes
            .get()
            .map(|routes| routes.iter().map(|r| r.name).collect())
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: WindowEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Translate a raw OS event. Returns whether a typed event fired, which
    /// for the system menu means the OS default menu must be suppressed.
    pub fn dispatch_raw(&self, raw: &RawWindowEvent) -> bool {
        let Some(win) = self.win() else {
            return false;
        };
        let Some(route) = self
            .routes
            .get()
            .and_then(|routes| routes.iter().find(|r| r.name == raw.name))
        else {
            debug_trace!("WINDOW", "window {} ignoring raw event {}", self.window_id, raw.name);
            return false;
        };

        let ctx = RouteContext { win: win.as_ref() };
        let Some(event) = (route.build)(&ctx, raw.payload) else {
            return false;
        };
        debug_log!("WINDOW", "window {} event {:?}", self.window_id, event);

        match event {
            WindowEvent::Focus => {
                *self.last_focus_time.lock() = Some(Instant::now());
                self.clear_notify_focus();
            }
            WindowEvent::EnterFullScreen | WindowEvent::LeaveFullScreen => {
                self.fullscreen.confirm_transition();
            }
            _ => {}
        }

        self.emit(event);
        if event == WindowEvent::Close {
            self.dispose();
        }
        true
    }

    /// When the window last received focus.
    pub fn last_focus_time(&self) -> Option<Instant> {
        *self.last_focus_time.lock()
    }

    pub fn focus(&self, mode: FocusMode) {
        let Some(win) = self.win() else {
            return;
        };
        match mode {
            FocusMode::Transfer => Self::transfer_focus(win.as_ref()),
            FocusMode::Notify => {
                {
                    let mut token = self.badge_token.lock();
                    if token.is_none() {
                        *token = Some(self.badges.acquire(self.window_id));
                    }
                }
                platform::request_attention(self.platform, win.as_ref());
            }
            FocusMode::Force => {
                if self.platform.can_steal_app_focus() {
                    win.steal_app_focus();
                }
                Self::transfer_focus(win.as_ref());
            }
        }
    }

    fn transfer_focus(win: &dyn NativeWindow) {
        if win.is_minimized() {
            win.restore();
        }
        win.focus();
    }

    /// Drop this window's attention request.
    pub fn clear_notify_focus(&self) {
        let token = self.badge_token.lock().take();
        if let Some(mut token) = token {
            token.release();
            if let Some(win) = self.win() {
                platform::clear_attention(self.platform, win.as_ref());
            }
        }
    }

    /// Update the caption-button overlay height and re-apply it.
    pub fn update_window_controls(&self, height: u32) {
        self.overlay_height.store(height, Ordering::SeqCst);
        if let Some(win) = self.win() {
            self.apply_window_controls(win.as_ref());
        }
    }

    fn apply_window_controls(&self, win: &dyn NativeWindow) {
        if self.platform.supports_window_controls_overlay() && self.custom_titlebar {
            win.set_titlebar_overlay(TitlebarOverlay {
                height: self.overlay_height.load(Ordering::SeqCst),
            });
        }
    }

    /// Current window bounds, if the handle is still alive.
    pub fn bounds(&self) -> Option<Rectangle> {
        self.win().map(|win| win.bounds())
    }

    pub fn set_full_screen(self: &Arc<Self>, full_screen: bool, from_restore: bool) {
        self.fullscreen.set_full_screen(self, full_screen, from_restore);
    }

    pub fn toggle_full_screen(self: &Arc<Self>) {
        self.fullscreen.toggle_full_screen(self);
    }

    pub fn is_full_screen(&self) -> bool {
        self.fullscreen.is_full_screen(self)
    }

    /// Release the handle. Every later operation is a no-op.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.clear_notify_focus();
        self.fullscreen.cancel();
        self.win.write().take();
        debug_info!("WINDOW", "window {} disposed", self.window_id);
    }

    /// Destroy the native window, then dispose.
    pub fn destroy(&self) {
        if let Some(win) = self.win()
            && !win.is_destroyed()
        {
            win.destroy();
        }
        self.dispose();
    }
}

impl std::fmt::Debug for WindowHandleOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHandleOwner")
            .field("window_id", &self.window_id)
            .field("platform", &self.platform)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
