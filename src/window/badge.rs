//! Process-wide attention badge shared by all windows.
//!
//! A window asking for attention with `FocusMode::Notify` acquires a
//! [`BadgeToken`]. The application badge stays visible while at least one
//! window holds a token and is cleared when the last one is released.

use casement_config::WindowId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, Weak};

/// Shows or hides the application-level badge (dock or taskbar).
pub trait BadgeIndicator: Send + Sync {
    fn set_badge(&self, visible: bool);
}

/// Counts windows currently requesting attention.
pub struct AttentionBadgeRegistry {
    indicator: Arc<dyn BadgeIndicator>,
    holders: Mutex<HashSet<WindowId>>,
}

impl AttentionBadgeRegistry {
    /// Create the registry at startup; windows share it by `Arc`.
    pub fn new(indicator: Arc<dyn BadgeIndicator>) -> Arc<Self> {
        Arc::new(Self {
            indicator,
            holders: Mutex::new(HashSet::new()),
        })
    }

    /// Mark `window_id` as requesting attention.
    ///
    /// A window holds at most one slot; acquiring again while holding one
    /// hands out a token that releases the same slot.
    pub fn acquire(self: &Arc<Self>, window_id: WindowId) -> BadgeToken {
        let became_visible = {
            let mut holders = self.holders.lock();
            let was_empty = holders.is_empty();
            holders.insert(window_id);
            was_empty
        };
        if became_visible {
            self.indicator.set_badge(true);
        }
        BadgeToken {
            registry: Arc::downgrade(self),
            window_id,
            released: false,
        }
    }

    /// Number of windows holding a token.
    pub fn count(&self) -> usize {
        self.holders.lock().len()
    }

    /// Drop every holder and hide the badge. Called once at exit.
    pub fn shutdown(&self) {
        let had_holders = {
            let mut holders = self.holders.lock();
            let had = !holders.is_empty();
            holders.clear();
            had
        };
        if had_holders {
            self.indicator.set_badge(false);
        }
    }

    fn release(&self, window_id: WindowId) {
        let became_empty = {
            let mut holders = self.holders.lock();
            holders.remove(&window_id) && holders.is_empty()
        };
        if became_empty {
            self.indicator.set_badge(false);
        }
    }
}

/// A window's claim on the attention badge. Released on drop.
pub struct BadgeToken {
    registry: Weak<AttentionBadgeRegistry>,
    window_id: WindowId,
    released: bool,
}

impl BadgeToken {
    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    /// Give the claim back. Releasing twice has no further effect.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(registry) = self.registry.upgrade() {
            registry.release(self.window_id);
        }
    }
}

impl Drop for BadgeToken {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for BadgeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeToken")
            .field("window_id", &self.window_id)
            .field("released", &self.released)
            .finish()
    }
}
