use super::lock;
use std::sync::{Arc, Mutex};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

struct Inner<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(u64, Subscriber<T>)>,
}

/// A value holder that notifies registered callbacks whenever it is set.
pub struct Observable<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> T {
        lock(&self.inner).value.clone()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&lock(&self.inner).value)
    }

    /// Replaces the value and notifies subscribers. Callbacks run after the
    /// internal lock is released, so they may read the observable.
    pub fn set(&self, value: T) {
        let subscribers: Vec<Subscriber<T>> = {
            let mut inner = lock(&self.inner);
            inner.value = value.clone();
            inner.subscribers.iter().map(|(_, s)| s.clone()).collect()
        };
        for subscriber in subscribers {
            subscriber(&value);
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        SubscriptionId(id)
    }

    #[cfg(test)]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = lock(&self.inner);
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id.0);
        inner.subscribers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_subscribers_on_set() {
        let observable = Observable::new(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = observable.subscribe(move |v| sink.lock().unwrap().push(*v));

        observable.set(2);
        observable.set(3);
        assert!(observable.unsubscribe(id));
        observable.set(4);

        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
        assert_eq!(observable.get(), 4);
    }

    #[test]
    fn subscribers_can_read_back() {
        let observable = Observable::new(String::from("a"));
        let reader = observable.clone();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        observable.subscribe(move |_| *sink.lock().unwrap() = reader.get());

        observable.set(String::from("b"));
        assert_eq!(*seen.lock().unwrap(), "b");
    }
}
