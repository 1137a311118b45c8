//! Deferred task scheduling on a virtual clock.
//!
//! Activation retries and relabel passes run some milliseconds after the
//! event that requested them. Scheduled tasks are fire-and-forget: nothing
//! cancels them when a newer source loads, so every task must re-check
//! state when it runs. Time is virtual and only moves when the host calls
//! [`TaskScheduler::advance_to`], which keeps event ordering reproducible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use thiserror::Error;

/// Maximum time that can be advanced in a single operation (24 hours).
const MAX_TIME_ADVANCE: Duration = Duration::from_secs(86400);

/// Errors from moving the scheduler clock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Target time lies before the current time.
    #[error("cannot move clock backwards from {now:?} to {target:?}")]
    BackwardsTime {
        /// Current clock value.
        now: Duration,
        /// Requested clock value.
        target: Duration,
    },

    /// Requested step exceeds the single-advance limit.
    #[error("cannot advance clock by {requested:?}, limit is {limit:?}")]
    AdvanceTooLarge {
        /// Requested step.
        requested: Duration,
        /// Maximum allowed step.
        limit: Duration,
    },
}

/// Work that the controller defers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredTask {
    /// Try to activate the quality selector again
    RetrySelectorInit,
    /// Rewrite quality menu labels from the remembered URL
    ApplyLabels,
}

impl DeferredTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeferredTask::RetrySelectorInit => "retry_selector_init",
            DeferredTask::ApplyLabels => "apply_labels",
        }
    }
}

/// Task waiting in the scheduler queue.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    /// Insertion counter, breaks ties between equal due times
    pub id: u64,
    /// Virtual time at which the task becomes due
    pub due: Duration,
    pub task: DeferredTask,
    /// Source generation current when the task was scheduled
    pub generation: u64,
}

impl Eq for ScheduledTask {}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap yields the earliest task, then lowest id.
        match self.due.cmp(&other.due) {
            Ordering::Equal => self.id.cmp(&other.id).reverse(),
            other => other.reverse(),
        }
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Virtual-time queue of deferred tasks.
#[derive(Debug, Default)]
pub struct TaskScheduler {
    now: Duration,
    next_id: u64,
    queue: BinaryHeap<ScheduledTask>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the scheduler was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of tasks that have not run yet.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|task| task.due)
    }

    /// Schedules `task` to run `delay` after the current time.
    ///
    /// A due time past the end of the clock is clamped to it. Returns the
    /// task id.
    pub fn schedule(&mut self, delay: Duration, task: DeferredTask, generation: u64) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.queue.push(ScheduledTask {
            id,
            due: self.now.saturating_add(delay),
            task,
            generation,
        });

        tracing::trace!(id, task = task.as_str(), ?delay, "Scheduled deferred task");
        id
    }

    /// Removes the earliest task due at or before `deadline`.
    ///
    /// The clock moves forward to the task's due time, never backwards.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<ScheduledTask> {
        if self.queue.peek()?.due > deadline {
            return None;
        }

        let task = self.queue.pop()?;
        self.now = self.now.max(task.due);
        Some(task)
    }

    /// Moves the clock to `target` without running anything.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::BackwardsTime` - Target lies before the current time
    /// - `SchedulerError::AdvanceTooLarge` - Step exceeds 24 hours
    pub fn advance_to(&mut self, target: Duration) -> Result<(), SchedulerError> {
        self.validate_target(target)?;
        self.now = target;
        Ok(())
    }

    /// Returns the time `elapsed` after now, if the clock may move there.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::AdvanceTooLarge` - Step exceeds 24 hours
    pub fn target_after(&self, elapsed: Duration) -> Result<Duration, SchedulerError> {
        let too_large = SchedulerError::AdvanceTooLarge {
            requested: elapsed,
            limit: MAX_TIME_ADVANCE,
        };
        if elapsed > MAX_TIME_ADVANCE {
            return Err(too_large);
        }
        self.now.checked_add(elapsed).ok_or(too_large)
    }

    /// Checks that the clock may move to `target`.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::BackwardsTime` - Target lies before the current time
    /// - `SchedulerError::AdvanceTooLarge` - Step exceeds 24 hours
    pub fn validate_target(&self, target: Duration) -> Result<(), SchedulerError> {
        let step = target
            .checked_sub(self.now)
            .ok_or(SchedulerError::BackwardsTime {
                now: self.now,
                target,
            })?;

        if step > MAX_TIME_ADVANCE {
            return Err(SchedulerError::AdvanceTooLarge {
                requested: step,
                limit: MAX_TIME_ADVANCE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_pop_in_due_order() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(Duration::from_millis(500), DeferredTask::ApplyLabels, 1);
        scheduler.schedule(Duration::from_millis(300), DeferredTask::RetrySelectorInit, 1);

        let deadline = Duration::from_secs(1);
        let first = scheduler.pop_due(deadline).unwrap();
        assert_eq!(first.task, DeferredTask::RetrySelectorInit);
        assert_eq!(scheduler.now(), Duration::from_millis(300));

        let second = scheduler.pop_due(deadline).unwrap();
        assert_eq!(second.task, DeferredTask::ApplyLabels);
        assert!(scheduler.pop_due(deadline).is_none());
    }

    #[test]
    fn test_equal_due_times_keep_insertion_order() {
        let mut scheduler = TaskScheduler::new();
        let a = scheduler.schedule(Duration::ZERO, DeferredTask::ApplyLabels, 1);
        let b = scheduler.schedule(Duration::ZERO, DeferredTask::RetrySelectorInit, 1);
        let c = scheduler.schedule(Duration::ZERO, DeferredTask::ApplyLabels, 2);

        let order: Vec<u64> = std::iter::from_fn(|| scheduler.pop_due(Duration::ZERO))
            .map(|task| task.id)
            .collect();
        assert_eq!(order, [a, b, c]);
    }

    #[test]
    fn test_tasks_not_due_stay_queued() {
        let mut scheduler = TaskScheduler::new();
        scheduler.schedule(Duration::from_millis(300), DeferredTask::RetrySelectorInit, 1);

        assert!(scheduler.pop_due(Duration::from_millis(299)).is_none());
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_delays_are_relative_to_current_time() {
        let mut scheduler = TaskScheduler::new();
        scheduler.advance_to(Duration::from_millis(100)).unwrap();
        scheduler.schedule(Duration::from_millis(50), DeferredTask::ApplyLabels, 1);

        assert_eq!(scheduler.next_due(), Some(Duration::from_millis(150)));
    }

    #[test]
    fn test_clock_cannot_go_backwards() {
        let mut scheduler = TaskScheduler::new();
        scheduler.advance_to(Duration::from_secs(10)).unwrap();

        let result = scheduler.advance_to(Duration::from_secs(5));
        assert!(matches!(result, Err(SchedulerError::BackwardsTime { .. })));
    }

    #[test]
    fn test_clock_max_advance_limit() {
        let mut scheduler = TaskScheduler::new();
        let result = scheduler.advance_to(Duration::from_secs(86401));
        assert!(matches!(result, Err(SchedulerError::AdvanceTooLarge { .. })));
        assert_eq!(scheduler.now(), Duration::ZERO);
    }

    #[test]
    fn test_oversized_step_is_an_error() {
        let mut scheduler = TaskScheduler::new();
        scheduler.advance_to(Duration::from_millis(1)).unwrap();

        assert!(matches!(
            scheduler.target_after(Duration::MAX),
            Err(SchedulerError::AdvanceTooLarge { .. })
        ));
        assert_eq!(
            scheduler.target_after(Duration::from_secs(1)).unwrap(),
            Duration::from_millis(1001)
        );
    }

    #[test]
    fn test_huge_delay_is_clamped() {
        let mut scheduler = TaskScheduler::new();
        scheduler.advance_to(Duration::from_millis(1)).unwrap();
        scheduler.schedule(Duration::MAX, DeferredTask::ApplyLabels, 1);

        assert_eq!(scheduler.next_due(), Some(Duration::MAX));
    }
}
