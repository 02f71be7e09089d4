//! Deferred callbacks.

use std::cell::{Cell, RefCell};
use std::time::Duration;

/// A deferred callback.
pub type Task = Box<dyn FnOnce()>;

/// Identifier of a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// `setTimeout`: run a callback once after a delay.
pub trait Scheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId;
}

struct PendingTask {
    id: TimerId,
    due: Duration,
    task: Task,
}

/// Virtual-clock scheduler; time only moves when [`advance`](Self::advance)
/// is called.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    pending: RefCell<Vec<PendingTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of callbacks not yet run.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Move the clock forward, running every callback that falls due in
    /// due-time order (ties in scheduling order). Callbacks may schedule
    /// further callbacks. Returns how many ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;

        loop {
            let next = {
                let mut pending = self.pending.borrow_mut();
                let earliest = pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.id))
                    .map(|(i, _)| i);
                earliest.map(|i| pending.remove(i))
            };
            let Some(task) = next else {
                break;
            };
            self.now.set(task.due);
            (task.task)();
            ran += 1;
        }

        self.now.set(target);
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.pending.borrow_mut().push(PendingTask {
            id,
            due: self.now.get() + delay,
            task,
        });
        id
    }
}

/// Scheduler backed by Tokio timers.
///
/// Callbacks are spawned with `spawn_local`, so this must be used inside a
/// `tokio::task::LocalSet`.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    next_id: Cell<u64>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for TokioScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_runs_when_due() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        scheduler.set_timeout(
            Duration::from_millis(2000),
            Box::new(move || l.borrow_mut().push("revert")),
        );

        assert_eq!(scheduler.advance(Duration::from_millis(1999)), 0);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
        assert_eq!(*log.borrow(), vec!["revert"]);
        assert_eq!(scheduler.now(), Duration::from_millis(2000));
    }

    #[test]
    fn test_order_and_nested_scheduling() {
        let scheduler = Rc::new(ManualScheduler::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let (l1, l2) = (log.clone(), log.clone());
        let inner_scheduler = scheduler.clone();
        scheduler.set_timeout(
            Duration::from_millis(20),
            Box::new(move || l1.borrow_mut().push(20)),
        );
        scheduler.set_timeout(
            Duration::from_millis(10),
            Box::new(move || {
                l2.borrow_mut().push(10);
                let l3 = l2.clone();
                inner_scheduler.set_timeout(
                    Duration::from_millis(5),
                    Box::new(move || l3.borrow_mut().push(15)),
                );
            }),
        );

        assert_eq!(scheduler.advance(Duration::from_millis(30)), 3);
        assert_eq!(*log.borrow(), vec![10, 15, 20]);
    }

    #[tokio::test]
    async fn test_tokio_scheduler_fires() {
        let local = tokio::task::LocalSet::new();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();

        local
            .run_until(async move {
                TokioScheduler::new()
                    .set_timeout(Duration::from_millis(1), Box::new(move || f.set(true)));
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
            .await;
        assert!(fired.get());
    }
}
