//! Cancellable delayed callbacks.
//!
//! The debounce timer is the only suspension point of the preview controller.
//! It is modelled as an explicit capability so the controller can be driven by
//! a simulated clock in tests and by tokio timers in the server.

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

/// Identity of one scheduled callback. Never reused by the scheduler that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    /// Arrange for `handle` to fire once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration) -> TimerHandle;

    /// Cancel a scheduled callback. Unknown or already fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Simulated clock: time only moves when [`ManualScheduler::advance`] is called.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_handle: u64,
    deadlines: BTreeMap<TimerHandle, Duration>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }

    /// Move the clock forward and return every handle that came due, in
    /// deadline order. Returned handles are no longer pending.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerHandle> {
        self.now += by;
        let now = self.now;

        let mut due: Vec<(Duration, TimerHandle)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(handle, deadline)| (*deadline, *handle))
            .collect();
        due.sort();

        for (_, handle) in &due {
            self.deadlines.remove(handle);
        }

        due.into_iter().map(|(_, handle)| handle).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.deadlines.insert(handle, self.now + delay);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.deadlines.remove(&handle);
    }
}

/// Tokio-backed scheduler. Expired handles are delivered over a channel to
/// whoever owns the receiver returned by [`TokioScheduler::new`].
#[derive(Debug)]
pub struct TokioScheduler {
    fired: UnboundedSender<TimerHandle>,
    next_handle: u64,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new() -> (Self, UnboundedReceiver<TimerHandle>) {
        let (fired, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            fired,
            next_handle: 0,
            tasks: HashMap::new(),
        };
        (scheduler, receiver)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());

        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone once the owning session is torn down.
            let _ = fired.send(handle);
        });
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_fires_in_deadline_order() {
        let mut scheduler = ManualScheduler::new();
        let late = scheduler.schedule(Duration::from_millis(300));
        let early = scheduler.schedule(Duration::from_millis(100));

        assert!(scheduler.advance(Duration::from_millis(99)).is_empty());
        assert_eq!(scheduler.advance(Duration::from_millis(201)), vec![early, late]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn manual_scheduler_cancel_prevents_firing() {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.schedule(Duration::from_millis(10));
        scheduler.cancel(handle);

        assert!(scheduler.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn handles_are_never_reused() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.schedule(Duration::ZERO);
        scheduler.cancel(first);
        let second = scheduler.schedule(Duration::ZERO);

        assert_ne!(first, second);
        assert!(second.id() > first.id());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_delivers_expired_handles() {
        let (mut scheduler, mut fired) = TokioScheduler::new();
        let handle = scheduler.schedule(Duration::from_millis(1000));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(fired.recv().await, Some(handle));
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_scheduler_cancel_aborts_timer() {
        let (mut scheduler, mut fired) = TokioScheduler::new();
        let cancelled = scheduler.schedule(Duration::from_millis(50));
        scheduler.cancel(cancelled);
        let kept = scheduler.schedule(Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(fired.recv().await, Some(kept));
        assert!(fired.try_recv().is_err());
    }
}
