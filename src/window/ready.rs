//! Readiness of the content inside a window.

use tokio::sync::oneshot;

/// Where the content of a window is in its load cycle.
///
/// Moves `None -> Navigating -> Ready`, and back to `Navigating` on reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// Nothing loaded yet
    #[default]
    None,
    /// A load is in flight
    Navigating,
    /// The content signalled it is ready
    Ready,
}

/// Callers waiting for the next transition to [`ReadyState::Ready`].
#[derive(Debug, Default)]
pub(crate) struct ReadyWaiters {
    pending: Vec<oneshot::Sender<()>>,
}

impl ReadyWaiters {
    pub fn push(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.pending.push(tx);
        rx
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Wake every waiter. A waiter that went away is skipped.
    pub fn resolve_all(&mut self) {
        for waiter in self.pending.drain(..) {
            let _ = waiter.send(());
        }
    }
}
