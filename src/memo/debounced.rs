use super::observable::{Observable, SubscriptionId};
use super::scheduler::{Scheduler, TimerId};
use super::lock;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

type Factory<D, T> = Arc<dyn Fn(&D) -> T + Send + Sync>;

struct Pending<D> {
    id: TimerId,
    deps: D,
    generation: u64,
}

struct MemoState<D> {
    /// Dependencies the cached value was computed from.
    deps: D,
    computed_at: Duration,
    pending: Option<Pending<D>>,
    generation: u64,
}

/// A memoised value whose recomputation is rate limited to once per `delay`.
///
/// Every render pass calls [`DebouncedMemo::get`] with the current
/// dependencies. A change arriving less than `delay` after the last
/// computation schedules a trailing recompute and keeps returning the stale
/// value until it fires; a later change supersedes the scheduled one.
///
/// A factory that panics on the immediate path unwinds into the caller of
/// `get`. On the deferred path it unwinds into whoever advances the
/// scheduler. Fallible factories should return a `Result` as `T` instead.
pub struct DebouncedMemo<D, T> {
    state: Arc<Mutex<MemoState<D>>>,
    value: Observable<T>,
    factory: Factory<D, T>,
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
}

impl<D, T> DebouncedMemo<D, T>
where
    D: PartialEq + Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    pub fn new(
        factory: impl Fn(&D) -> T + Send + Sync + 'static,
        deps: D,
        delay: Duration,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let factory: Factory<D, T> = Arc::new(factory);
        let value = Observable::new(factory(&deps));
        let state = MemoState {
            deps,
            computed_at: scheduler.now(),
            pending: None,
            generation: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            value,
            factory,
            scheduler,
            delay,
        }
    }

    /// Returns the cached value, recomputing or scheduling a recompute when
    /// `deps` differs from the dependencies the value was computed from.
    pub fn get(&self, deps: &D) -> T {
        let mut state = lock(&self.state);

        if *deps == state.deps {
            // Back to the computed state: a trailing recompute is moot.
            if let Some(pending) = state.pending.take() {
                self.scheduler.cancel(pending.id);
            }
            drop(state);
            return self.value.get();
        }
        if matches!(&state.pending, Some(p) if p.deps == *deps) {
            drop(state);
            return self.value.get();
        }
        if let Some(pending) = state.pending.take() {
            self.scheduler.cancel(pending.id);
        }

        let now = self.scheduler.now();
        let elapsed = now.saturating_sub(state.computed_at);
        if elapsed >= self.delay {
            drop(state);
            let value = (self.factory)(deps);
            {
                let mut state = lock(&self.state);
                state.deps = deps.clone();
                state.computed_at = now;
            }
            tracing::debug!(?elapsed, "memo recomputed");
            self.value.set(value.clone());
            return value;
        }

        state.generation += 1;
        let generation = state.generation;
        let id = self.scheduler.schedule(
            self.delay - elapsed,
            self.trailing_recompute(Arc::downgrade(&self.state), generation),
        );
        state.pending = Some(Pending {
            id,
            deps: deps.clone(),
            generation,
        });
        drop(state);
        self.value.get()
    }

    fn trailing_recompute(
        &self,
        state: Weak<Mutex<MemoState<D>>>,
        generation: u64,
    ) -> Box<dyn FnOnce() + Send> {
        let factory = self.factory.clone();
        let value = self.value.clone();
        let scheduler = self.scheduler.clone();
        Box::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let deps = {
                let mut guard = lock(&state);
                match guard.pending.take() {
                    Some(pending) if pending.generation == generation => pending.deps,
                    other => {
                        guard.pending = other;
                        return;
                    }
                }
            };
            let computed = factory(&deps);
            {
                let mut guard = lock(&state);
                guard.deps = deps;
                guard.computed_at = scheduler.now();
            }
            tracing::debug!("memo recomputed after debounce");
            value.set(computed);
        })
    }

    /// The current value without reporting dependencies.
    pub fn value(&self) -> T {
        self.value.get()
    }

    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        self.value.subscribe(callback)
    }
}

impl<D, T> Drop for DebouncedMemo<D, T> {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.state).pending.take() {
            self.scheduler.cancel(pending.id);
        }
    }
}

/// Compares by pointer, for dependencies that should only count as changed
/// when they are replaced.
#[derive(Debug)]
pub struct Shallow<T>(pub Arc<T>);

impl<T> Shallow<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl<T> Clone for Shallow<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for Shallow<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> std::ops::Deref for Shallow<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}
