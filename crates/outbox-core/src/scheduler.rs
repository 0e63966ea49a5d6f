//! Flush scheduler: `Idle → Scheduled → Draining → (Idle | Scheduled)`.
//!
//! The state lives under the queue's mutex, so the transitions below are the
//! only guard against a second timer or an overlapping drain. Each armed
//! timer carries a generation number; a timer that wakes up after being
//! cancelled or superseded finds a different generation and does nothing.

use std::time::Duration;
use tokio::task::JoinHandle;

use crate::replay::DrainSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No timer armed.
    Idle,
    /// One timer armed.
    Scheduled,
    /// A drain is running.
    Draining,
}

/// Exponential backoff between drains: doubles on a fruitless drain, resets
/// after any delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn escalate(&mut self) {
        self.current = self.current.saturating_mul(2).min(self.max);
    }
}

#[derive(Debug)]
pub struct FlushScheduler {
    state: SchedulerState,
    backoff: Backoff,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl FlushScheduler {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            backoff: Backoff::new(initial, max),
            generation: 0,
            timer: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Delay the next timer will use.
    pub fn interval(&self) -> Duration {
        self.backoff.current()
    }

    /// `Idle → Scheduled`. Returns the generation and delay of the timer the
    /// caller must start, or `None` if a timer or drain is already active.
    pub fn arm(&mut self) -> Option<(u64, Duration)> {
        if self.state != SchedulerState::Idle {
            return None;
        }
        self.state = SchedulerState::Scheduled;
        self.generation = self.generation.wrapping_add(1);
        Some((self.generation, self.backoff.current()))
    }

    /// Keep the handle of the timer started for `generation`.
    pub fn attach_timer(&mut self, generation: u64, handle: JoinHandle<()>) {
        if self.state == SchedulerState::Scheduled && self.generation == generation {
            self.timer = Some(handle);
        } else {
            handle.abort();
        }
    }

    /// Undo an `arm` whose timer could not be started.
    pub fn disarm(&mut self, generation: u64) {
        if self.state == SchedulerState::Scheduled && self.generation == generation {
            self.state = SchedulerState::Idle;
            self.timer = None;
        }
    }

    /// Timer fired: `Scheduled → Draining` if this timer is still current.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.state != SchedulerState::Scheduled || self.generation != generation {
            return false;
        }
        // Called from the timer task itself: detach, don't abort.
        self.timer = None;
        self.state = SchedulerState::Draining;
        true
    }

    /// Manual trigger: `Idle | Scheduled → Draining`, cancelling any pending
    /// timer. Returns `false` while a drain is already running.
    pub fn begin_manual(&mut self) -> bool {
        if self.state == SchedulerState::Draining {
            return false;
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = SchedulerState::Draining;
        true
    }

    /// `Draining → Idle`, applying backoff from the drain result. Returns
    /// whether entries remain, in which case the caller re-arms.
    pub fn finish_drain(&mut self, summary: &DrainSummary) -> bool {
        if summary.delivered > 0 {
            self.backoff.reset();
        } else if summary.remaining > 0 {
            self.backoff.escalate();
        }
        self.state = SchedulerState::Idle;
        summary.remaining > 0
    }

    /// `Draining → Idle` without a drain result (nothing was attempted).
    pub fn abandon_drain(&mut self) {
        if self.state == SchedulerState::Draining {
            self.state = SchedulerState::Idle;
        }
    }

    /// `Scheduled → Idle`, aborting the pending timer. A running drain is left
    /// to finish.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if self.state == SchedulerState::Scheduled {
            self.generation = self.generation.wrapping_add(1);
            self.state = SchedulerState::Idle;
        }
    }
}
