//! Racing futures against each other and against timers.
//!
//! Several window operations wait for something that may never happen: the
//! OS confirming a fullscreen transition, a hidden window becoming visible,
//! an unresponsive episode ending. Each of those is a race between the
//! substantive future and a timer, and often only the most recently started
//! race may act on its outcome. [`race`] and [`race_timeout`] cover the
//! first part, [`LatestGuard`] the second.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Outcome of [`race_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Raced<T> {
    /// The future settled first
    Settled(T),
    /// The timer fired first
    TimedOut,
}

impl<T> Raced<T> {
    pub fn settled(self) -> Option<T> {
        match self {
            Raced::Settled(value) => Some(value),
            Raced::TimedOut => None,
        }
    }
}

/// Resolve with the first future to settle; the rest are dropped.
///
/// Returns `None` for an empty set.
pub async fn race<T>(futures: Vec<BoxFuture<'_, T>>) -> Option<T> {
    if futures.is_empty() {
        return None;
    }
    let (value, _index, _losers) = futures::future::select_all(futures).await;
    Some(value)
}

/// Race `future` against a `timeout` timer.
pub async fn race_timeout<F>(future: F, timeout: Duration) -> Raced<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    let contenders = vec![
        future.map(Raced::Settled).boxed(),
        tokio::time::sleep(timeout).map(|_| Raced::TimedOut).boxed(),
    ];
    race(contenders).await.unwrap_or(Raced::TimedOut)
}

/// Identity of one issued operation, compared against [`LatestGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Tracks which of several overlapping operations is authoritative.
///
/// Every new operation calls [`issue`](Self::issue); when an older one
/// finishes it checks [`is_latest`](Self::is_latest) and drops its result
/// if it has been superseded.
#[derive(Debug, Default)]
pub struct LatestGuard {
    issued: AtomicU64,
    latest: AtomicU64,
}

impl LatestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new operation, superseding all earlier ones.
    pub fn issue(&self) -> Ticket {
        let id = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.store(id, Ordering::SeqCst);
        Ticket(id)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Retire `ticket` if it is still the latest. Returns whether it was.
    pub fn complete(&self, ticket: Ticket) -> bool {
        self.latest
            .compare_exchange(ticket.0, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Supersede every outstanding operation without starting a new one.
    pub fn invalidate(&self) {
        self.latest.store(0, Ordering::SeqCst);
    }
}
