//! The pairing queue.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Two connections matched into one game. `first` waited longest and
/// plays as Player 1.
#[derive(Debug, PartialEq, Eq)]
pub struct Pairing<C> {
    pub first: C,
    pub second: C,
}

impl<C> Pairing<C> {
    /// Returns the pair as a tuple, Player 1 first.
    pub fn into_tuple(self) -> (C, C) {
        (self.first, self.second)
    }
}

/// A FIFO of connections waiting for an opponent.
///
/// Pushing a connection and popping a pair happen under the same lock, so
/// concurrent callers never pair a connection twice and never leave two
/// connections waiting side by side.
#[derive(Debug)]
pub struct MatchQueue<C> {
    waiting: Mutex<VecDeque<C>>,
}

impl<C> Default for MatchQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> MatchQueue<C> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            waiting: Mutex::new(VecDeque::new()),
        }
    }

    /// Adds `conn` to the queue. If that makes two connections available,
    /// both are removed and returned; the caller starts their game.
    pub fn enqueue(&self, conn: C) -> Option<Pairing<C>> {
        let mut waiting = self.lock();
        waiting.push_back(conn);
        if waiting.len() < 2 {
            tracing::debug!(waiting = waiting.len(), "connection queued");
            return None;
        }
        let first = waiting.pop_front()?;
        let second = waiting.pop_front()?;
        tracing::debug!(waiting = waiting.len(), "pairing formed");
        Some(Pairing { first, second })
    }

    /// Number of connections currently waiting.
    pub fn waiting(&self) -> usize {
        self.lock().len()
    }

    /// A panic while the lock was held cannot leave the deque in a broken
    /// state, so a poisoned lock is used as is.
    fn lock(&self) -> MutexGuard<'_, VecDeque<C>> {
        self.waiting
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
