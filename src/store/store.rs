use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

type Subscriber<T> = Box<dyn Fn(&T) + Send + Sync>;
type Middleware<T> = Box<dyn Fn(&T, &T) + Send + Sync>;

/// A thread-safe store for managing application state.
///
/// Stores provide a higher-level abstraction over signals for managing
/// complex state. Change detection follows the same rule as the cells:
/// a write that leaves the state equal to what it was notifies nobody.
/// Middleware hooks observe every accepted transition and are the place
/// for concerns like logging or persistence.
pub struct Store<T> {
    state: Arc<RwLock<T>>,
    subscribers: Arc<RwLock<Vec<Subscriber<T>>>>,
    middleware: Arc<RwLock<Vec<Middleware<T>>>>,
}

impl<T: Clone + PartialEq> Store<T> {
    /// Create a new store with the given initial state.
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            middleware: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get a clone of the current state.
    pub fn get(&self) -> T {
        self.state.read().clone()
    }

    /// Update the state using a function.
    ///
    /// Subscribers are notified only when the state actually changed.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let previous = {
            let mut state = self.state.write();
            let previous = state.clone();
            f(&mut state);
            if *state == previous {
                return;
            }
            previous
        };
        self.notify(&previous);
    }

    /// Set a new state value.
    ///
    /// Subscribers are notified only when the new state differs.
    pub fn set(&self, new_state: T) {
        let previous = {
            let mut state = self.state.write();
            if *state == new_state {
                return;
            }
            std::mem::replace(&mut *state, new_state)
        };
        self.notify(&previous);
    }

    /// Subscribe to state changes.
    ///
    /// The callback will be called whenever the state actually changes.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Box::new(callback));
    }

    /// Register a middleware hook observing `(previous, next)` on every
    /// accepted transition, before subscribers are notified.
    pub fn add_middleware<F>(&self, hook: F)
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        self.middleware.write().push(Box::new(hook));
    }

    /// Notify middleware and subscribers of an accepted transition.
    fn notify(&self, previous: &T) {
        let state = self.state.read();
        debug!("store state changed");

        let middleware = self.middleware.read();
        for hook in middleware.iter() {
            hook(previous, &state);
        }

        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            subscriber(&state);
        }
    }

    /// Read state without cloning.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.state.read())
    }
}

impl<T: Clone + PartialEq> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: Arc::clone(&self.subscribers),
            middleware: Arc::clone(&self.middleware),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct AppState {
        count: usize,
        name: String,
    }

    #[test]
    fn store_get_set() {
        let store = Store::new(AppState {
            count: 0,
            name: "test".to_string(),
        });

        assert_eq!(store.get().count, 0);

        store.set(AppState {
            count: 42,
            name: "updated".to_string(),
        });

        assert_eq!(store.get().count, 42);
        assert_eq!(store.get().name, "updated");
    }

    #[test]
    fn store_update() {
        let store = Store::new(AppState {
            count: 0,
            name: "test".to_string(),
        });

        store.update(|state| {
            state.count += 10;
        });

        assert_eq!(store.get().count, 10);
    }

    #[test]
    fn store_subscribe() {
        let store = Store::new(AppState {
            count: 0,
            name: "test".to_string(),
        });

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        store.subscribe(move |_state| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        store.update(|state| state.count += 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        store.update(|state| state.count += 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unchanged_state_notifies_nobody() {
        let store = Store::new(AppState {
            count: 1,
            name: "same".to_string(),
        });

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();
        store.subscribe(move |_| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set(store.get());
        store.update(|_| {});
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn middleware_sees_old_and_new_state() {
        let store = Store::new(AppState {
            count: 1,
            name: "log".to_string(),
        });

        let transitions = Arc::new(RwLock::new(Vec::new()));
        store.add_middleware({
            let transitions = Arc::clone(&transitions);
            move |previous: &AppState, next: &AppState| {
                transitions.write().push((previous.count, next.count));
            }
        });

        store.update(|state| state.count = 2);
        store.update(|state| state.count = 5);

        assert_eq!(*transitions.read(), vec![(1, 2), (2, 5)]);
    }
}
