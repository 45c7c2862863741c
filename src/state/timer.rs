//! Timer Module - Single-shot cancelable tasks for the host event loop
//!
//! Scan timers never block. A task is queued with a deadline and runs when
//! the host loop calls `run_due` (or `advance`, on a manual clock) after that
//! deadline has passed.
//!
//! # Pattern
//!
//! - One `TimerQueue` per event loop thread, cloned into whatever schedules
//! - `TimerQueue::system()` follows the monotonic clock
//! - `TimerQueue::manual()` only moves when told to, for deterministic tests
//! - Due tasks run in deadline order, ties in scheduling order
//!
//! # Example
//!
//! ```ignore
//! use barcode_listener::state::{Scheduler, TimerQueue};
//! use std::time::Duration;
//!
//! let timers = TimerQueue::manual();
//! let id = timers.schedule_once(Duration::from_millis(50), Box::new(|| println!("done")));
//!
//! timers.advance(Duration::from_millis(49)); // nothing yet
//! timers.advance(Duration::from_millis(1));  // prints "done"
//! assert!(!timers.cancel(id));               // already fired
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::trace;

// =============================================================================
// SCHEDULER
// =============================================================================

/// Identifies one scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Schedule-once, cancelable task execution.
pub trait Scheduler {
    /// Run `task` once, `delay` from now.
    fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId;

    /// Drop a pending task. Returns false if it already ran or was cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

// =============================================================================
// TIMER QUEUE
// =============================================================================

enum Clock {
    /// Virtual time since creation.
    Manual(Duration),
    /// Real time since `origin`.
    System(Instant),
}

impl Clock {
    fn now(&self) -> Duration {
        match self {
            Clock::Manual(elapsed) => *elapsed,
            Clock::System(origin) => origin.elapsed(),
        }
    }
}

struct Task {
    id: TimerId,
    deadline: Duration,
    run: Box<dyn FnOnce()>,
}

struct QueueInner {
    clock: Clock,
    tasks: Vec<Task>,
    next_id: u64,
}

impl QueueInner {
    /// Remove and return the earliest task due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<Task> {
        let index = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.deadline <= limit)
            .min_by_key(|(_, task)| (task.deadline, task.id))
            .map(|(index, _)| index)?;
        Some(self.tasks.remove(index))
    }
}

/// Single-threaded timer queue. Clones share the same queue.
#[derive(Clone)]
pub struct TimerQueue {
    inner: Rc<RefCell<QueueInner>>,
}

impl TimerQueue {
    fn with_clock(clock: Clock) -> Self {
        Self {
            inner: Rc::new(RefCell::new(QueueInner {
                clock,
                tasks: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Queue driven by virtual time (see `advance`).
    pub fn manual() -> Self {
        Self::with_clock(Clock::Manual(Duration::ZERO))
    }

    /// Queue driven by the monotonic clock.
    pub fn system() -> Self {
        Self::with_clock(Clock::System(Instant::now()))
    }

    /// Time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.inner.borrow().clock.now()
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Time until the earliest pending task is due (zero if already overdue).
    pub fn next_deadline(&self) -> Option<Duration> {
        let inner = self.inner.borrow();
        let now = inner.clock.now();
        inner
            .tasks
            .iter()
            .map(|task| task.deadline.saturating_sub(now))
            .min()
    }

    /// Run every task that is due. Returns how many ran.
    pub fn run_due(&self) -> usize {
        let now = self.now();
        self.run_until(now)
    }

    /// Move a manual clock forward by `by`, running tasks as their deadlines
    /// pass, including tasks scheduled by those tasks inside the window.
    ///
    /// On a system clock time can't be moved; this only runs due tasks.
    pub fn advance(&self, by: Duration) -> usize {
        let manual = match self.inner.borrow().clock {
            Clock::Manual(elapsed) => Some(elapsed),
            Clock::System(_) => None,
        };
        let Some(elapsed) = manual else {
            return self.run_due();
        };
        let target = elapsed + by;

        let ran = self.run_until(target);
        if let Clock::Manual(elapsed) = &mut self.inner.borrow_mut().clock {
            *elapsed = (*elapsed).max(target);
        }
        ran
    }

    fn run_until(&self, limit: Duration) -> usize {
        let mut ran = 0;
        loop {
            // Borrow ends before the task runs, so tasks may schedule or cancel.
            let task = {
                let mut inner = self.inner.borrow_mut();
                let task = inner.pop_due(limit);
                if let (Some(task), Clock::Manual(elapsed)) = (&task, &mut inner.clock) {
                    *elapsed = (*elapsed).max(task.deadline);
                }
                task
            };
            let Some(task) = task else { break };

            trace!("timer {:?} fired at {:?}", task.id, task.deadline);
            (task.run)();
            ran += 1;
        }
        ran
    }

    /// Drop every pending task and rewind a manual clock (for testing).
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.tasks.clear();
        if let Clock::Manual(elapsed) = &mut inner.clock {
            *elapsed = Duration::ZERO;
        }
    }
}

impl Scheduler for TimerQueue {
    fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        let deadline = inner.clock.now() + delay;
        inner.tasks.push(Task {
            id,
            deadline,
            run: task,
        });
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.tasks.len();
        inner.tasks.retain(|task| task.id != id);
        inner.tasks.len() != before
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fires_after_deadline() {
        let timers = TimerQueue::manual();
        let fired = Rc::new(Cell::new(0));
        let fired_clone = fired.clone();

        timers.schedule_once(ms(50), Box::new(move || fired_clone.set(fired_clone.get() + 1)));
        assert_eq!(timers.pending(), 1);

        assert_eq!(timers.advance(ms(49)), 0);
        assert_eq!(fired.get(), 0);

        assert_eq!(timers.advance(ms(1)), 1);
        assert_eq!(fired.get(), 1);
        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.now(), ms(50));
    }

    #[test]
    fn test_cancel() {
        let timers = TimerQueue::manual();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();

        let id = timers.schedule_once(ms(10), Box::new(move || fired_clone.set(true)));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));

        timers.advance(ms(100));
        assert!(!fired.get());
    }

    #[test]
    fn test_deadline_order() {
        let timers = TimerQueue::manual();
        let order = Rc::new(RefCell::new(Vec::new()));

        for (label, delay) in [("late", 30), ("early", 10), ("tie", 10)] {
            let order = order.clone();
            timers.schedule_once(ms(delay), Box::new(move || order.borrow_mut().push(label)));
        }

        timers.advance(ms(30));
        assert_eq!(*order.borrow(), vec!["early", "tie", "late"]);
    }

    #[test]
    fn test_task_scheduled_inside_window_runs() {
        let timers = TimerQueue::manual();
        let fired = Rc::new(Cell::new(0));

        let inner_timers = timers.clone();
        let fired_clone = fired.clone();
        timers.schedule_once(
            ms(10),
            Box::new(move || {
                let fired_inner = fired_clone.clone();
                inner_timers.schedule_once(
                    ms(10),
                    Box::new(move || fired_inner.set(fired_inner.get() + 1)),
                );
            }),
        );

        assert_eq!(timers.advance(ms(25)), 2);
        assert_eq!(fired.get(), 1);
        assert_eq!(timers.now(), ms(25));
    }

    #[test]
    fn test_next_deadline() {
        let timers = TimerQueue::manual();
        assert_eq!(timers.next_deadline(), None);

        timers.schedule_once(ms(40), Box::new(|| {}));
        timers.schedule_once(ms(20), Box::new(|| {}));
        timers.advance(ms(5));
        assert_eq!(timers.next_deadline(), Some(ms(15)));
    }

    #[test]
    fn test_system_clock_runs_due() {
        let timers = TimerQueue::system();
        let fired = Rc::new(Cell::new(false));
        let fired_clone = fired.clone();

        timers.schedule_once(Duration::ZERO, Box::new(move || fired_clone.set(true)));
        assert_eq!(timers.run_due(), 1);
        assert!(fired.get());
    }

    #[test]
    fn test_reset() {
        let timers = TimerQueue::manual();
        timers.schedule_once(ms(5), Box::new(|| {}));
        timers.advance(ms(2));
        timers.reset();
        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.now(), Duration::ZERO);
    }
}
