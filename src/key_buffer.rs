//! Pending keystrokes of a multi-key command and the timeout that abandons
//! them.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DEFAULT_SEQUENCE_TIMEOUT: Duration = Duration::from_millis(500);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time line.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

/// Identifies one armed timer. Only the most recently armed token can expire
/// the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug)]
pub struct KeyBuffer {
    keys: String,
    timeout: Duration,
    generation: u64,
    deadline: Option<Instant>,
}

impl KeyBuffer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            keys: String::new(),
            timeout,
            generation: 0,
            deadline: None,
        }
    }

    pub fn push(&mut self, ch: char) {
        self.keys.push(ch);
    }

    pub fn as_str(&self) -> &str {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Empties the buffer and cancels the pending timer.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.deadline = None;
    }

    /// Cancels any previous timer and arms a new one.
    pub fn arm(&mut self, now: Instant) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        self.deadline = Some(now + self.timeout);
        TimerToken(self.generation)
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Clears an overdue buffer. Returns whether anything was abandoned.
    pub fn expire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    /// Host timer callback. Stale or cancelled tokens are ignored.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.deadline.is_none() || token.0 != self.generation {
            return false;
        }
        self.clear();
        true
    }
}

impl Default for KeyBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEQUENCE_TIMEOUT)
    }
}
