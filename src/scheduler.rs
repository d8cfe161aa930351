//! Single owned timer queue with revocable entries.
//!
//! The controller never hands callbacks to the browser directly. It schedules
//! plain task values here and the host pumps [`Scheduler::pop_due`] with the
//! current time. Cancelling an entry is therefore exact: once revoked, a task
//! can never fire.

/// Handle to a scheduled entry. Stays valid across interval re-arms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

#[derive(Clone, Debug)]
struct Entry<T> {
    handle: TaskHandle,
    due_at: f64,
    order: u64,
    nesting: u32,
    interval_ms: Option<f64>,
    task: T,
}

/// Shortest interval period; also the floor for every re-arm.
pub const MIN_INTERVAL_MS: f64 = 1.0;
/// Timeouts nested deeper than this are clamped to [`NESTED_MIN_DELAY_MS`].
pub const MAX_NESTING: u32 = 5;
pub const NESTED_MIN_DELAY_MS: f64 = 4.0;

#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: f64,
    next_handle: u64,
    next_order: u64,
    /// Nesting level of the entry popped last; 0 outside a drain.
    nesting: u32,
    queue: Vec<Entry<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new(now_ms: f64) -> Self {
        Self {
            now_ms,
            next_handle: 1,
            next_order: 0,
            nesting: 0,
            queue: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Fire `task` once, `delay_ms` from now.
    pub fn schedule(&mut self, delay_ms: f64, task: T) -> TaskHandle {
        self.push(delay_ms, None, task)
    }

    /// Fire `task` every `period_ms` (at least [`MIN_INTERVAL_MS`]), first
    /// time one period from now.
    pub fn schedule_interval(&mut self, period_ms: f64, task: T) -> TaskHandle {
        let period = period_ms.max(MIN_INTERVAL_MS);
        self.push(period, Some(period), task)
    }

    /// Entries queued while a popped entry is being handled are one level
    /// deeper than it. Past [`MAX_NESTING`] levels the delay is clamped, so a
    /// task that keeps re-queueing itself with no delay still lets the clock
    /// reach `now_ms` and the drain end.
    fn push(&mut self, delay_ms: f64, interval_ms: Option<f64>, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        let order = self.bump_order();
        let nesting = self.nesting.saturating_add(1);
        let mut delay = delay_ms.max(0.0);
        if nesting > MAX_NESTING {
            delay = delay.max(NESTED_MIN_DELAY_MS);
        }
        self.queue.push(Entry {
            handle,
            due_at: self.now_ms + delay,
            order,
            nesting,
            interval_ms,
            task,
        });
        handle
    }

    fn bump_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    /// Revoke an entry. Returns whether it was still queued.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.queue.len();
        self.queue.retain(|e| e.handle != handle);
        before != self.queue.len()
    }

    /// Revoke every entry whose task matches. Returns the number removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|e| !pred(&e.task));
        before - self.queue.len()
    }

    /// Move the clock and every queued entry `delta_ms` forward, as if the
    /// queue had been frozen for that long. Nothing fires.
    pub fn fast_forward(&mut self, delta_ms: f64) {
        if delta_ms <= 0.0 {
            return;
        }
        self.now_ms += delta_ms;
        for entry in &mut self.queue {
            entry.due_at += delta_ms;
        }
    }

    /// Take the earliest entry due by `now_ms`, advancing the clock to its due
    /// time; with nothing due the clock moves to `now_ms`. The clock never
    /// runs backwards.
    ///
    /// Tasks scheduled while handling a popped entry are timed from that
    /// entry's due time, so a large jump replays the same timeline as many
    /// small ones. Ties fire in scheduling order. An interval is re-armed
    /// before its task is returned, with a fresh order, so the task may
    /// cancel its own handle. Call repeatedly until `None` to drain.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(TaskHandle, T)> {
        let target = now_ms.max(self.now_ms);
        let Some(idx) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_at <= target)
            .min_by(|(_, a), (_, b)| a.due_at.total_cmp(&b.due_at).then(a.order.cmp(&b.order)))
            .map(|(i, _)| i)
        else {
            self.now_ms = target;
            self.nesting = 0;
            return None;
        };
        self.now_ms = self.queue[idx].due_at.max(self.now_ms);
        self.nesting = self.queue[idx].nesting;

        match self.queue[idx].interval_ms {
            Some(period) => {
                let order = self.bump_order();
                let entry = &mut self.queue[idx];
                // Catch-up ticks keep their nominal spacing.
                entry.due_at += period.max(MIN_INTERVAL_MS);
                entry.order = order;
                Some((entry.handle, entry.task.clone()))
            }
            None => {
                let entry = self.queue.swap_remove(idx);
                Some((entry.handle, entry.task))
            }
        }
    }

    /// Due time of the earliest queued entry.
    pub fn next_due(&self) -> Option<f64> {
        self.queue.iter().map(|e| e.due_at).min_by(f64::total_cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, now: f64) -> Vec<&'static str> {
        std::iter::from_fn(|| s.pop_due(now).map(|(_, t)| t)).collect()
    }

    #[test]
    fn fires_in_due_then_schedule_order() {
        let mut s = Scheduler::new(0.0);
        s.schedule(20.0, "b");
        s.schedule(10.0, "a");
        s.schedule(20.0, "c");
        assert!(drain(&mut s, 5.0).is_empty());
        assert_eq!(drain(&mut s, 20.0), vec!["a", "b", "c"]);
        assert!(s.is_empty());
    }

    #[test]
    fn cancelled_entries_never_fire() {
        let mut s = Scheduler::new(0.0);
        let h = s.schedule(10.0, "x");
        s.schedule(10.0, "y");
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert_eq!(drain(&mut s, 100.0), vec!["y"]);
    }

    #[test]
    fn interval_rearms_until_cancelled() {
        let mut s = Scheduler::new(0.0);
        let h = s.schedule_interval(50.0, "tick");
        assert_eq!(drain(&mut s, 160.0).len(), 3);
        assert_eq!(s.next_due(), Some(200.0));
        s.cancel(h);
        assert!(drain(&mut s, 1000.0).is_empty());
    }

    #[test]
    fn rearmed_interval_yields_to_older_timeout_at_same_instant() {
        let mut s = Scheduler::new(0.0);
        s.schedule_interval(50.0, "tick");
        s.schedule(100.0, "stop");
        // tick@50, then at 100 the timeout was queued before the re-armed tick.
        assert_eq!(drain(&mut s, 100.0), vec!["tick", "stop", "tick"]);
    }

    #[test]
    fn work_scheduled_mid_drain_is_timed_from_due_time() {
        let mut s = Scheduler::new(0.0);
        s.schedule(100.0, "first");
        let (_, task) = s.pop_due(1000.0).unwrap();
        assert_eq!(task, "first");
        assert_eq!(s.now_ms(), 100.0);
        s.schedule(50.0, "second");
        assert_eq!(s.pop_due(1000.0).map(|(_, t)| t), Some("second"));
        assert_eq!(s.now_ms(), 150.0);
        assert!(s.pop_due(1000.0).is_none());
        assert_eq!(s.now_ms(), 1000.0);
    }

    #[test]
    fn cancel_where_filters_by_task() {
        let mut s = Scheduler::new(0.0);
        s.schedule(1.0, "effect");
        s.schedule(2.0, "loop");
        s.schedule_interval(3.0, "effect");
        assert_eq!(s.cancel_where(|t| *t == "effect"), 2);
        assert_eq!(drain(&mut s, 10.0), vec!["loop"]);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut s: Scheduler<&str> = Scheduler::new(100.0);
        assert!(s.pop_due(50.0).is_none());
        assert_eq!(s.now_ms(), 100.0);
        s.schedule(10.0, "a");
        assert_eq!(s.next_due(), Some(110.0));
    }

    #[test]
    fn self_requeueing_zero_delay_task_lets_the_drain_finish() {
        let mut s = Scheduler::new(0.0);
        s.schedule(0.0, "again");
        let mut fired = 0;
        while let Some((_, task)) = s.pop_due(10.0) {
            fired += 1;
            assert!(fired < 100, "drain did not terminate");
            s.schedule(0.0, task);
        }
        // five unclamped levels at t=0, then one every 4 ms: 4 and 8
        assert_eq!(fired, 7);
        assert_eq!(s.next_due(), Some(12.0));
    }

    #[test]
    fn top_level_zero_delay_is_not_clamped() {
        let mut s = Scheduler::new(0.0);
        for _ in 0..10 {
            s.schedule(0.0, "now");
        }
        assert_eq!(drain(&mut s, 0.0).len(), 10);
    }

    #[test]
    fn tiny_interval_is_floored() {
        let mut s = Scheduler::new(0.0);
        s.schedule_interval(1e-300, "tick");
        assert_eq!(drain(&mut s, 10.0).len(), 10);
        assert_eq!(s.next_due(), Some(11.0));
    }

    #[test]
    fn fast_forward_keeps_remaining_delays() {
        let mut s = Scheduler::new(0.0);
        s.schedule(30.0, "a");
        s.fast_forward(1000.0);
        assert_eq!(s.now_ms(), 1000.0);
        assert!(drain(&mut s, 1029.0).is_empty());
        assert_eq!(drain(&mut s, 1030.0), vec!["a"]);
    }
}
