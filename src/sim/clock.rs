//! Round countdown clock
//!
//! Counts whole seconds down on a `Scheduler`. The clock owns at most one
//! pending tick; stopping cancels it, so a stopped clock never expires.

use serde::{Deserialize, Serialize};

use super::scheduler::{Scheduler, TimerId};
use crate::consts::TICK_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    Idle,
    Running,
    Expired,
}

/// Result of one clock tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    /// Seconds left after this tick
    pub remaining: u32,
    /// True exactly once per `start`, on the tick that reaches zero
    pub expired: bool,
}

#[derive(Debug, Clone)]
pub struct RoundClock {
    duration: u32,
    remaining: u32,
    state: ClockState,
    timer: Option<TimerId>,
}

impl RoundClock {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration: duration_secs,
            remaining: duration_secs,
            state: ClockState::Idle,
            timer: None,
        }
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.duration - self.remaining
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Idle/Expired -> Running. Arms a tick one second out; `task` is what the
    /// scheduler hands back when it fires. Starting an expired clock begins a
    /// fresh countdown.
    pub fn start<T: Copy>(&mut self, scheduler: &mut Scheduler<T>, task: T) {
        match self.state {
            ClockState::Running => return,
            ClockState::Expired => self.remaining = self.duration,
            ClockState::Idle => {}
        }
        if self.remaining == 0 {
            self.remaining = self.duration;
        }
        self.state = ClockState::Running;
        self.timer = Some(scheduler.schedule_in(TICK_MS, task));
    }

    /// Handle a fired tick. Returns None if `id` is not this clock's pending
    /// tick (stale or after stop).
    pub fn on_timer<T: Copy>(
        &mut self,
        scheduler: &mut Scheduler<T>,
        id: TimerId,
        task: T,
    ) -> Option<ClockTick> {
        if self.state != ClockState::Running || self.timer != Some(id) {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = ClockState::Expired;
            self.timer = None;
            return Some(ClockTick {
                remaining: 0,
                expired: true,
            });
        }
        self.timer = Some(scheduler.schedule_in(TICK_MS, task));
        Some(ClockTick {
            remaining: self.remaining,
            expired: false,
        })
    }

    /// Running -> Idle without expiring. Remaining time is kept.
    pub fn stop<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
        }
        if self.state == ClockState::Running {
            self.state = ClockState::Idle;
        }
    }

    /// Stop and rewind to the full duration
    pub fn reset<T>(&mut self, scheduler: &mut Scheduler<T>) {
        self.stop(scheduler);
        self.remaining = self.duration;
        self.state = ClockState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run the clock against its scheduler up to `until_ms`
    fn run(clock: &mut RoundClock, sched: &mut Scheduler<()>, until_ms: f64) -> Vec<ClockTick> {
        let mut ticks = Vec::new();
        while let Some(fired) = sched.pop_due(until_ms) {
            if let Some(tick) = clock.on_timer(sched, fired.id, ()) {
                ticks.push(tick);
            }
        }
        ticks
    }

    #[test]
    fn test_three_ticks_then_one_expiry() {
        let mut sched = Scheduler::new();
        let mut clock = RoundClock::new(3);
        clock.start(&mut sched, ());
        let ticks = run(&mut clock, &mut sched, 60_000.0);

        let remaining: Vec<u32> = ticks.iter().map(|t| t.remaining).collect();
        assert_eq!(remaining, vec![2, 1, 0]);
        assert_eq!(ticks.iter().filter(|t| t.expired).count(), 1);
        assert!(ticks[2].expired);
        assert_eq!(clock.state(), ClockState::Expired);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_stop_before_expiry_never_expires() {
        let mut sched = Scheduler::new();
        let mut clock = RoundClock::new(3);
        clock.start(&mut sched, ());
        let ticks = run(&mut clock, &mut sched, 1500.0);
        assert_eq!(ticks.len(), 1);

        clock.stop(&mut sched);
        assert_eq!(clock.state(), ClockState::Idle);
        let ticks = run(&mut clock, &mut sched, 60_000.0);
        assert!(ticks.is_empty());
        assert_eq!(clock.remaining(), 2);
    }

    #[test]
    fn test_resume_continues_countdown() {
        let mut sched = Scheduler::new();
        let mut clock = RoundClock::new(5);
        clock.start(&mut sched, ());
        run(&mut clock, &mut sched, 2000.0);
        assert_eq!(clock.remaining(), 3);

        clock.stop(&mut sched);
        sched.advance_to(10_000.0);
        clock.start(&mut sched, ());
        assert!(run(&mut clock, &mut sched, 10_999.0).is_empty());
        let ticks = run(&mut clock, &mut sched, 11_000.0);
        assert_eq!(ticks, vec![ClockTick { remaining: 2, expired: false }]);
    }

    #[test]
    fn test_start_twice_arms_one_tick() {
        let mut sched = Scheduler::new();
        let mut clock = RoundClock::new(10);
        clock.start(&mut sched, ());
        clock.start(&mut sched, ());
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn test_reset_and_restart_after_expiry() {
        let mut sched = Scheduler::new();
        let mut clock = RoundClock::new(2);
        clock.start(&mut sched, ());
        run(&mut clock, &mut sched, 5000.0);
        assert_eq!(clock.state(), ClockState::Expired);

        clock.start(&mut sched, ());
        assert_eq!(clock.remaining(), 2);
        let ticks = run(&mut clock, &mut sched, 10_000.0);
        assert_eq!(ticks.iter().filter(|t| t.expired).count(), 1);

        clock.reset(&mut sched);
        assert_eq!(clock.remaining(), 2);
        assert_eq!(clock.state(), ClockState::Idle);
        assert_eq!(clock.elapsed_secs(), 0);
    }
}
