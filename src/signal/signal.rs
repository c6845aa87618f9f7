use crate::runtime::ReactiveRuntime;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tracing::trace;

type EqualsFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// A reactive cell that holds a value and notifies dependents when it changes.
///
/// Writes go through [`set`](Signal::set) and [`update`](Signal::update) and
/// are gated by a comparison function: when the new value is judged equal to
/// the old one, no notification fires. Mutating the interior of a previously
/// read value never notifies anything; only the write operations can.
///
/// # Examples
///
/// ```
/// use tripwire::Signal;
///
/// let name = Signal::new("tin".to_string());
/// assert_eq!(name.get(), "tin");
///
/// name.set("copper".to_string());
/// assert_eq!(name.get(), "copper");
/// ```
#[derive(Clone)]
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    id: usize,
    equals: EqualsFn<T>,
    _dependencies: Arc<Mutex<Vec<WatchGuard>>>,
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    ///
    /// Change detection uses `PartialEq`. Use
    /// [`with_equals`](Signal::with_equals) for a custom comparison.
    pub fn new(initial: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equals(initial, |a, b| a == b)
    }

    /// Create a new signal with a custom change-detection comparison.
    ///
    /// The comparison receives the old and the candidate value; returning
    /// `true` means "unchanged" and suppresses notification. A comparison
    /// of `|_, _| false` makes every write notify.
    ///
    /// # Examples
    ///
    /// ```
    /// use tripwire::Signal;
    ///
    /// // Only the integral part counts as a change.
    /// let level = Signal::with_equals(1.2_f64, |a, b| a.trunc() == b.trunc());
    /// level.set(1.9);
    /// assert_eq!(level.get(), 1.2);
    /// level.set(2.0);
    /// assert_eq!(level.get(), 2.0);
    /// ```
    pub fn with_equals<E>(initial: T, equals: E) -> Self
    where
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Self {
            value: Arc::new(RwLock::new(initial)),
            id,
            equals: Arc::new(equals),
            _dependencies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the current value of the signal.
    ///
    /// Inside an effect or memo this registers a dependency on the signal.
    pub fn get(&self) -> T {
        let runtime = ReactiveRuntime::current();
        runtime.track_read(self.id);
        self.value.read().clone()
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let runtime = ReactiveRuntime::current();
        runtime.track_read(self.id);
        f(&self.value.read())
    }

    /// Read the value with a function, without cloning or tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the signal's value.
    ///
    /// Dependents are notified unless the comparison judges the new value
    /// equal to the current one, in which case the write is discarded.
    pub fn set(&self, new_value: T) {
        {
            let value = self.value.read();
            if (self.equals)(&value, &new_value) {
                trace!(cell = self.id, "write ignored, value unchanged");
                return;
            }
        }
        *self.value.write() = new_value;
        ReactiveRuntime::current().notify_observers(self.id);
    }

    /// Transform the value in place.
    ///
    /// The value before and after `f` runs are compared; dependents are only
    /// notified when they differ.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut value = self.value.write();
            let previous = value.clone();
            f(&mut value);
            !(self.equals)(&previous, &value)
        };
        if changed {
            ReactiveRuntime::current().notify_observers(self.id);
        } else {
            trace!(cell = self.id, "update ignored, value unchanged");
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Split into read-only and write-only handles.
    pub fn split(&self) -> (ReadSignal<T>, WriteSignal<T>) {
        (self.read_only(), self.write_only())
    }

    /// A read-only handle sharing this signal's state.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            inner: self.clone(),
        }
    }

    /// A write-only handle sharing this signal's state.
    pub fn write_only(&self) -> WriteSignal<T> {
        WriteSignal {
            inner: self.clone(),
        }
    }

    /// Watch this signal for changes.
    ///
    /// The callback runs immediately with the current value, then again on
    /// every accepted write. Dropping the returned guard disconnects it.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let observer_id = runtime.next_id();
        let value = Arc::clone(&self.value);
        let callback = Arc::new(callback);
        let callback_clone = Arc::clone(&callback);

        runtime.create_observer(observer_id, move || {
            let val = value.read().clone();
            callback_clone(val);
        });

        // Subscribe to this signal only
        runtime.with_observer(observer_id, || {
            runtime.track_read(self.id);
        });

        // Call immediately with current value
        let val = self.value.read().clone();
        callback(val);

        WatchGuard {
            observer_id,
            runtime: Arc::downgrade(&runtime.inner()),
        }
    }

    /// Create a derived signal by applying a function to this signal's value.
    pub fn map<U, F>(&self, f: F) -> Signal<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let source = self.clone();
        let derived = Signal::new(f(&self.get()));
        let derived_clone = derived.clone();
        let f = Arc::new(f);

        // Watch the source and update the derived signal
        let guard = source.watch(move |value| {
            derived_clone.set(f(&value));
        });

        // Keep the observer alive as long as the derived signal
        derived._dependencies.lock().push(guard);
        derived
    }

    /// Combine two signals into one holding both values.
    pub fn zip<U>(self, other: Signal<U>) -> Signal<(T, U)>
    where
        T: PartialEq,
        U: Clone + PartialEq + Send + Sync + 'static,
    {
        let combined = Signal::new((self.get(), other.get()));

        let combined_clone1 = combined.clone();
        let other_clone1 = other.clone();
        let guard1 = self.watch(move |val| {
            let other_val = other_clone1.get_untracked();
            combined_clone1.set((val, other_val));
        });

        let combined_clone2 = combined.clone();
        let self_clone = self.clone();
        let guard2 = other.watch(move |val| {
            let self_val = self_clone.get_untracked();
            combined_clone2.set((self_val, val));
        });

        {
            let mut deps = combined._dependencies.lock();
            deps.push(guard1);
            deps.push(guard2);
        }
        combined
    }
}

/// Read-only handle to a [`Signal`].
///
/// This is the face a cell shows to consumers who may observe but not
/// write it, such as a value passed down from an owning scope.
#[derive(Clone)]
pub struct ReadSignal<T> {
    inner: Signal<T>,
}

impl<T: Clone + Send + Sync + 'static> ReadSignal<T> {
    /// Get the current value, registering a dependency.
    pub fn get(&self) -> T {
        self.inner.get()
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.inner.get_untracked()
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    /// Read the value with a function, without cloning or tracking.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with_untracked(f)
    }

    /// Watch the underlying signal for changes.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.inner.watch(callback)
    }

    /// Create a derived signal from this handle.
    pub fn map<U, F>(&self, f: F) -> Signal<U>
    where
        U: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.inner.map(f)
    }

    /// The underlying signal's ID.
    pub fn id(&self) -> usize {
        self.inner.id()
    }
}

/// Write-only handle to a [`Signal`].
#[derive(Clone)]
pub struct WriteSignal<T> {
    inner: Signal<T>,
}

impl<T: Clone + Send + Sync + 'static> WriteSignal<T> {
    /// Replace the signal's value, subject to the change comparison.
    pub fn set(&self, new_value: T) {
        self.inner.set(new_value);
    }

    /// Transform the value in place, notifying only on change.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.inner.update(f);
    }

    /// The underlying signal's ID.
    pub fn id(&self) -> usize {
        self.inner.id()
    }
}

/// Create a signal and split it into read and write handles.
///
/// # Examples
///
/// ```
/// use tripwire::create_signal;
///
/// let (count, set_count) = create_signal(0);
/// set_count.set(42);
/// assert_eq!(count.get(), 42);
/// ```
pub fn create_signal<T>(initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Signal::new(initial).split()
}

/// Like [`create_signal`], with a custom change-detection comparison.
pub fn create_signal_with_equals<T, E>(initial: T, equals: E) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + Send + Sync + 'static,
    E: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    Signal::with_equals(initial, equals).split()
}

/// RAII guard for signal watchers.
pub struct WatchGuard {
    observer_id: usize,
    runtime: Weak<RwLock<crate::runtime::RuntimeInner>>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.write().remove_observer(self.observer_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn set_equal_value_does_not_notify() {
        let signal = Signal::new(7);
        let notifications = Arc::new(AtomicUsize::new(0));

        let _guard = signal.watch({
            let notifications = Arc::clone(&notifications);
            move |_| {
                notifications.fetch_add(1, Ordering::SeqCst);
            }
        });
        // watch fires once with the current value
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        signal.set(7);
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        signal.set(8);
        assert_eq!(notifications.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn update_with_no_net_change_does_not_notify() {
        let signal = Signal::new(10);
        let notifications = Arc::new(AtomicUsize::new(0));

        let _guard = signal.watch({
            let notifications = Arc::clone(&notifications);
            move |_| {
                notifications.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(notifications.load(Ordering::SeqCst), 1);

        signal.update(|n| {
            *n += 5;
            *n -= 5;
        });
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn custom_equals_controls_notification() {
        let signal = Signal::with_equals("abc".to_string(), |a: &String, b: &String| {
            a.len() == b.len()
        });
        let notifications = Arc::new(AtomicUsize::new(0));

        let _guard = signal.watch({
            let notifications = Arc::clone(&notifications);
            move |_| {
                notifications.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Same length: treated as unchanged
        signal.set("xyz".to_string());
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        assert_eq!(signal.get(), "abc");

        signal.set("longer".to_string());
        assert_eq!(notifications.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn split_handles_share_state() {
        let (read, write) = create_signal(1);
        write.set(2);
        assert_eq!(read.get(), 2);
        write.update(|n| *n *= 10);
        assert_eq!(read.get(), 20);
    }
}
