//! FIFO of complete output lines shared between the reader worker and the
//! controller.
//!
//! One producer (the reader) pushes; one consumer (the controller) pops or
//! drains. All operations take the same short-lived lock, so a drain is
//! atomic with respect to pushes: a line is either pushed before the drain
//! and discarded, or pushed after it and kept.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct QueueState {
    lines: VecDeque<String>,
    closed: bool,
}

/// Unbounded line queue with blocking pop and atomic drain.
#[derive(Debug, Default)]
pub struct LineQueue {
    state: Mutex<QueueState>,
    available: Notify,
}

impl LineQueue {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line and wake the consumer.
    ///
    /// Lines pushed after [`close`](Self::close) are dropped.
    pub fn push(&self, line: String) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.lines.push_back(line);
        }
        self.available.notify_one();
    }

    /// Pop the oldest line without waiting.
    pub fn try_pop(&self) -> Option<String> {
        self.lock().lines.pop_front()
    }

    /// Pop the oldest line, waiting for one to arrive.
    ///
    /// Returns `None` once the queue is closed and empty. Cancel safe.
    pub async fn pop(&self) -> Option<String> {
        loop {
            {
                let mut state = self.lock();
                if let Some(line) = state.lines.pop_front() {
                    return Some(line);
                }
                if state.closed {
                    return None;
                }
            }
            self.available.notified().await;
        }
    }

    /// Remove every queued line, returning how many were dropped.
    pub fn drain(&self) -> usize {
        let mut state = self.lock();
        let count = state.lines.len();
        state.lines.clear();
        count
    }

    /// Mark the producer as gone. Queued lines stay poppable.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_one();
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of queued lines.
    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    /// Check if no lines are queued.
    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }
}
