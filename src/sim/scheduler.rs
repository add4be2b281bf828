//! Cooperative timer queue
//!
//! Single-threaded and driven by the caller: nothing fires until `pop_due` is
//! called with a time at or past an entry's due time. Every entry is tagged
//! with the epoch current at scheduling time; bumping the epoch turns all
//! queued work stale, and stale entries are dropped when they come due
//! instead of running.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Handle for a scheduled entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// An entry that came due
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub due_ms: f64,
    pub task: T,
}

#[derive(Debug)]
struct Entry<T> {
    due_ms: f64,
    id: u64,
    epoch: u64,
    task: T,
}

// Reversed so BinaryHeap pops the earliest (due, id) first
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .total_cmp(&self.due_ms)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

/// Virtual-time timer queue (milliseconds)
#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: f64,
    epoch: u64,
    next_id: u64,
    queue: BinaryHeap<Entry<T>>,
    cancelled: HashSet<u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            epoch: 0,
            next_id: 1,
            queue: BinaryHeap::new(),
            cancelled: HashSet::new(),
        }
    }

    /// Scheduler time: the due time of the last fired entry, or the latest
    /// time passed to `advance_to`/`pop_due`
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Move time forward (never backward)
    pub fn advance_to(&mut self, now_ms: f64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
    }

    /// Start a new epoch. Everything already queued becomes stale.
    pub fn bump_epoch(&mut self) -> u64 {
        self.epoch += 1;
        log::trace!("scheduler epoch -> {}", self.epoch);
        self.epoch
    }

    /// Schedule `task` to run `delay_ms` after the current scheduler time
    pub fn schedule_in(&mut self, delay_ms: f64, task: T) -> TimerId {
        let due_ms = self.now_ms + delay_ms.max(0.0);
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push(Entry {
            due_ms,
            id,
            epoch: self.epoch,
            task,
        });
        TimerId(id)
    }

    /// Cancel a pending entry. Unknown or already-fired ids are ignored.
    pub fn cancel(&mut self, id: TimerId) {
        if self.queue.iter().any(|e| e.id == id.0) {
            self.cancelled.insert(id.0);
        }
    }

    /// Whether `id` is queued, live, and not cancelled
    pub fn is_pending(&self, id: TimerId) -> bool {
        !self.cancelled.contains(&id.0)
            && self
                .queue
                .iter()
                .any(|e| e.id == id.0 && e.epoch == self.epoch)
    }

    /// Number of live (current-epoch, uncancelled) entries
    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|e| e.epoch == self.epoch && !self.cancelled.contains(&e.id))
            .count()
    }

    /// Pop the earliest live entry due at or before `now_ms`.
    ///
    /// Entries fire in (due time, scheduling order). Scheduler time moves to
    /// the fired entry's due time so rescheduling from inside a handler does
    /// not drift; once nothing is due, it moves to `now_ms`.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<Fired<T>> {
        while self.queue.peek().is_some_and(|e| e.due_ms <= now_ms) {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            if entry.epoch != self.epoch {
                log::trace!(
                    "dropping stale timer {} (epoch {} != {})",
                    entry.id,
                    entry.epoch,
                    self.epoch
                );
                continue;
            }
            self.advance_to(entry.due_ms);
            return Some(Fired {
                id: TimerId(entry.id),
                due_ms: entry.due_ms,
                task: entry.task,
            });
        }
        self.advance_to(now_ms);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, now: f64) -> Vec<&'static str> {
        std::iter::from_fn(|| s.pop_due(now).map(|f| f.task)).collect()
    }

    #[test]
    fn test_fires_in_due_then_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule_in(200.0, "c");
        s.schedule_in(100.0, "a");
        s.schedule_in(100.0, "b");
        assert_eq!(drain(&mut s, 50.0), Vec::<&str>::new());
        assert_eq!(drain(&mut s, 1000.0), vec!["a", "b", "c"]);
        assert_eq!(s.now(), 1000.0);
    }

    #[test]
    fn test_now_tracks_fired_due_time() {
        let mut s = Scheduler::new();
        s.schedule_in(1000.0, "tick");
        let fired = s.pop_due(5000.0).unwrap();
        assert_eq!(fired.due_ms, 1000.0);
        assert_eq!(s.now(), 1000.0);
        // Rescheduling from the handler is relative to the due time
        s.schedule_in(1000.0, "tick");
        assert_eq!(s.pop_due(5000.0).unwrap().due_ms, 2000.0);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let a = s.schedule_in(10.0, "a");
        s.schedule_in(20.0, "b");
        assert!(s.is_pending(a));
        s.cancel(a);
        assert!(!s.is_pending(a));
        assert_eq!(s.pending(), 1);
        assert_eq!(drain(&mut s, 100.0), vec!["b"]);
    }

    #[test]
    fn test_stale_epoch_is_dropped() {
        let mut s = Scheduler::new();
        s.schedule_in(10.0, "old");
        s.bump_epoch();
        s.schedule_in(20.0, "new");
        assert_eq!(s.pending(), 1);
        assert_eq!(drain(&mut s, 100.0), vec!["new"]);
    }

    #[test]
    fn test_time_never_moves_backward() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_to(500.0);
        s.advance_to(100.0);
        assert_eq!(s.now(), 500.0);
        assert!(s.pop_due(200.0).is_none());
        assert_eq!(s.now(), 500.0);
    }
}
