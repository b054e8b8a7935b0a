use super::lock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Deferred callback scheduling against a clock the caller controls.
pub trait Scheduler: Send + Sync {
    /// Time elapsed since the scheduler's epoch.
    fn now(&self) -> Duration;

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Returns `false` if the timer already fired or was cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

#[derive(Default)]
struct QueueState {
    now: Duration,
    next_id: u64,
    // Keyed by (deadline, id) so equal deadlines fire in scheduling order.
    timers: BTreeMap<(Duration, u64), TimerCallback>,
    deadlines: HashMap<u64, Duration>,
}

/// Timer queue with a virtual clock. Nothing fires until the owner advances
/// the clock, which makes it usable both from the render loop (driven by a
/// real `Instant`) and from tests.
#[derive(Clone, Default)]
pub struct TimerQueue {
    state: Arc<Mutex<QueueState>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        lock(&self.state).timers.len()
    }

    #[cfg(test)]
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        self.advance_to(target)
    }

    /// Moves the clock to `target`, running every timer due on the way.
    /// Returns how many callbacks ran. Moving backwards is a no-op.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        loop {
            let callback = {
                let mut state = lock(&self.state);
                let due = match state.timers.keys().next() {
                    Some(&key) if key.0 <= target => key,
                    _ => {
                        if target > state.now {
                            state.now = target;
                        }
                        return fired;
                    }
                };
                state.deadlines.remove(&due.1);
                if due.0 > state.now {
                    state.now = due.0;
                }
                state.timers.remove(&due)
            };
            if let Some(callback) = callback {
                tracing::trace!(?target, "timer fired");
                callback();
                fired += 1;
            }
        }
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Duration {
        lock(&self.state).now
    }

    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        let deadline = state.now + delay;
        state.timers.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);
        TimerId(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = lock(&self.state);
        match state.deadlines.remove(&id.0) {
            Some(deadline) => state.timers.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_in_deadline_order() {
        let queue = TimerQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (label, delay) in [("late", 30), ("early", 10), ("tie", 10)] {
            let order = order.clone();
            queue.schedule(ms(delay), Box::new(move || order.lock().unwrap().push(label)));
        }

        assert_eq!(queue.advance(ms(5)), 0);
        assert_eq!(queue.advance(ms(5)), 2);
        assert_eq!(queue.advance(ms(100)), 1);
        assert_eq!(*order.lock().unwrap(), vec!["early", "tie", "late"]);
        assert_eq!(queue.now(), ms(110));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let queue = TimerQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = queue.schedule(
            ms(10),
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        queue.advance(ms(50));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn callbacks_may_schedule_more_timers() {
        let queue = TimerQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let inner_queue = queue.clone();
        let counter = hits.clone();
        queue.schedule(
            ms(10),
            Box::new(move || {
                let counter = counter.clone();
                inner_queue.schedule(
                    ms(10),
                    Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        queue.advance(ms(15));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        queue.advance(ms(5));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clock_never_moves_backwards() {
        let queue = TimerQueue::new();
        queue.advance_to(ms(40));
        queue.advance_to(ms(10));
        assert_eq!(queue.now(), ms(40));
    }
}
