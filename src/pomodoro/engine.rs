//! Timer engine.
//!
//! A plain state machine over [`TimerState`]. It owns no clock: the caller
//! feeds it one `on_tick()` per elapsed second while it is running, and
//! applies the user actions. A tick that brings the countdown to zero
//! returns a [`Completion`] carrying the notification to issue.

use chrono::{DateTime, Local};

use super::mode::{LONG_BREAK_EVERY, Mode};
use crate::notify::NotificationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub remaining_seconds: u32,
    pub is_running: bool,
    pub current_mode: Mode,
    pub completed_work_cycles: u32,
}

impl TimerState {
    pub fn new(mode: Mode) -> Self {
        Self {
            remaining_seconds: mode.duration_secs(),
            is_running: false,
            current_mode: mode,
            completed_work_cycles: 0,
        }
    }

    /// Percentage of the current interval already elapsed, in `[0, 100]`.
    pub fn progress(&self) -> f64 {
        let total = self.current_mode.duration_secs() as f64;
        let elapsed = total - self.remaining_seconds as f64;
        (elapsed / total * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(Mode::Work)
    }
}

/// The end of an interval and the transition it caused.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub finished: Mode,
    pub next: Mode,
    pub completed_work_cycles: u32,
    pub notification: NotificationRequest,
    pub at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct TimerEngine {
    state: TimerState,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn start(&mut self) {
        if self.state.remaining_seconds > 0 {
            self.state.is_running = true;
        }
    }

    pub fn pause(&mut self) {
        self.state.is_running = false;
    }

    pub fn toggle(&mut self) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    pub fn reset(&mut self) {
        self.state.is_running = false;
        self.state.remaining_seconds = self.state.current_mode.duration_secs();
    }

    /// User override: always stops the countdown, never counts as a completion.
    pub fn switch_mode(&mut self, target: Mode) {
        self.state.current_mode = target;
        self.state.remaining_seconds = target.duration_secs();
        self.state.is_running = false;
        tracing::info!(
            "[{}] Switched to {} mode",
            Local::now().format("%H:%M:%S"),
            target
        );
    }

    /// Advance one second. Ignored unless running with time left.
    pub fn on_tick(&mut self) -> Option<Completion> {
        if !self.state.is_running || self.state.remaining_seconds == 0 {
            return None;
        }

        self.state.remaining_seconds -= 1;
        if self.state.remaining_seconds > 0 {
            return None;
        }

        self.state.is_running = false;
        Some(self.complete())
    }

    fn complete(&mut self) -> Completion {
        let finished = self.state.current_mode;
        let notification = NotificationRequest::for_completion(finished);

        let next = match finished {
            Mode::Work => {
                self.state.completed_work_cycles += 1;
                if (self.state.completed_work_cycles - 1) % LONG_BREAK_EVERY == LONG_BREAK_EVERY - 1
                {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Work,
        };

        self.state.current_mode = next;
        self.state.remaining_seconds = next.duration_secs();

        Completion {
            finished,
            next,
            completed_work_cycles: self.state.completed_work_cycles,
            notification,
            at: Local::now(),
        }
    }
}
