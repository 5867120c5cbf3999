//! Fullscreen arbitration.
//!
//! On macOS the OS confirms a fullscreen transition only after its
//! animation, sometimes not at all, and keeps reporting the old state in the
//! meantime. The arbiter answers [`is_full_screen`](FullscreenArbiter::is_full_screen)
//! from an optimistic transient flag until the latest transition is confirmed
//! or times out. Elsewhere transitions are synchronous and the OS is asked
//! directly.

use super::events::WindowEvent;
use super::handle_owner::WindowHandleOwner;
use crate::platform::Platform;
use crate::race::{LatestGuard, Raced, Ticket, race_timeout};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Default)]
struct TransitionState {
    /// Optimistic fullscreen state while a transition is outstanding
    transient: Option<bool>,
    /// Resolves the outstanding transition
    confirm: Option<oneshot::Sender<()>>,
}

pub struct FullscreenArbiter {
    platform: Platform,
    use_native: bool,
    timeout: Duration,
    guard: LatestGuard,
    state: Mutex<TransitionState>,
}

impl FullscreenArbiter {
    pub fn new(platform: Platform, use_native: bool, timeout: Duration) -> Self {
        Self {
            platform,
            // Simple fullscreen only exists on macOS
            use_native: use_native || !platform.supports_simple_fullscreen(),
            timeout,
            guard: LatestGuard::new(),
            state: Mutex::new(TransitionState::default()),
        }
    }

    pub fn set_full_screen(
        &self,
        owner: &Arc<WindowHandleOwner>,
        full_screen: bool,
        from_restore: bool,
    ) {
        let Some(win) = owner.win() else {
            return;
        };

        if !self.use_native {
            if win.is_full_screen() {
                win.set_full_screen(false);
            }
            win.set_simple_full_screen(full_screen);
            return;
        }

        if win.is_simple_full_screen() {
            win.set_simple_full_screen(false);
        }

        if !self.platform.has_delayed_fullscreen_confirmation() {
            win.set_full_screen(full_screen);
            return;
        }

        let ticket = self.guard.issue();
        let (tx, rx) = oneshot::channel();
        {
            // Replacing the sender resolves the previous transition
            let mut state = self.state.lock();
            state.transient = Some(full_screen);
            state.confirm = Some(tx);
        }

        let weak = Arc::downgrade(owner);
        let timeout = self.timeout;
        tokio::spawn(async move {
            let confirmed = matches!(race_timeout(rx, timeout).await, Raced::Settled(Ok(())));
            if let Some(owner) = weak.upgrade() {
                owner
                    .fullscreen
                    .finish_transition(&owner, ticket, confirmed, full_screen, from_restore);
            }
        });

        // The confirmation may arrive while this call is still running
        win.set_full_screen(full_screen);
    }

    fn finish_transition(
        &self,
        owner: &WindowHandleOwner,
        ticket: Ticket,
        confirmed: bool,
        full_screen: bool,
        from_restore: bool,
    ) {
        if !self.guard.complete(ticket) {
            return;
        }
        {
            let mut state = self.state.lock();
            state.transient = None;
            state.confirm = None;
        }

        if confirmed || !full_screen || !from_restore {
            return;
        }
        if let Some(win) = owner.win()
            && !win.is_full_screen()
        {
            log::warn!(
                "window {}: fullscreen restore was never confirmed, reporting leave",
                owner.window_id()
            );
            owner.emit(WindowEvent::LeaveFullScreen);
        }
    }

    /// The OS confirmed the outstanding transition.
    pub fn confirm_transition(&self) {
        let confirm = {
            let mut state = self.state.lock();
            let confirm = state.confirm.take();
            if confirm.is_some() {
                state.transient = None;
            }
            confirm
        };
        if let Some(tx) = confirm {
            debug_log!("FULLSCREEN", "transition confirmed");
            self.guard.invalidate();
            let _ = tx.send(());
        }
    }

    pub fn is_full_screen(&self, owner: &WindowHandleOwner) -> bool {
        if self.platform.has_delayed_fullscreen_confirmation()
            && let Some(transient) = self.state.lock().transient
        {
            return transient;
        }
        owner
            .win()
            .map(|win| win.is_full_screen() || win.is_simple_full_screen())
            .unwrap_or(false)
    }

    pub fn toggle_full_screen(&self, owner: &Arc<WindowHandleOwner>) {
        let full_screen = self.is_full_screen(owner);
        self.set_full_screen(owner, !full_screen, false);
    }

    /// Drop the outstanding transition without resolving it.
    pub(crate) fn cancel(&self) {
        self.guard.invalidate();
        let mut state = self.state.lock();
        state.transient = None;
        state.confirm = None;
    }

    #[cfg(test)]
    fn transient(&self) -> Option<bool> {
        self.state.lock().transient
    }
}
