use crate::error::Error;
use crate::runtime::ReactiveRuntime;
use parking_lot::RwLock;
use std::sync::Arc;

/// A memoized derived value that automatically tracks dependencies.
///
/// Memos recompute lazily: a write to an upstream cell only marks the memo
/// stale, and the computation reruns on the next read. A memo is read-only
/// from the outside.
#[derive(Clone)]
pub struct Memo<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    cached: Arc<RwLock<Option<T>>>,
    equals: Arc<dyn Fn(&T, &T) -> bool + Send + Sync>,
    id: usize,
}

impl<T: Clone + Send + Sync + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    ///
    /// Recomputed values are compared to the cached one with `PartialEq`;
    /// when equal, the cached value is kept.
    pub fn new<F>(compute: F) -> Self
    where
        T: PartialEq,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_equals(compute, |a, b| a == b)
    }

    /// Create a new memo with a custom comparison for recomputed values.
    pub fn with_equals<F, E>(compute: F, equals: E) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        E: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        // Register this as a memo with the runtime; it starts stale.
        runtime.register_memo(id);

        Self {
            compute: Arc::new(compute),
            cached: Arc::new(RwLock::new(None)),
            equals: Arc::new(equals),
            id,
        }
    }

    /// Recompute if stale, tracking dependencies from scratch.
    fn refresh(&self, runtime: &ReactiveRuntime) -> Result<(), Error> {
        if !runtime.is_memo_dirty(self.id) && self.cached.read().is_some() {
            return Ok(());
        }
        if runtime.is_observer_active(self.id) {
            return Err(Error::Cycle(self.id));
        }

        runtime.clear_dependencies(self.id);
        let value = runtime.with_observer(self.id, || (self.compute)());

        let mut cached = self.cached.write();
        match cached.take() {
            // Unchanged per the comparison: keep the previous value so
            // downstream readers observe a stable one.
            Some(previous) if (self.equals)(&previous, &value) => *cached = Some(previous),
            _ => *cached = Some(value),
        }
        runtime.mark_memo_clean(self.id);
        Ok(())
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// # Panics
    ///
    /// Panics if the memo is read during its own recomputation. Use
    /// [`try_get`](Memo::try_get) to observe that case as an error.
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Get the current value, reporting reactive cycles as errors.
    pub fn try_get(&self) -> Result<T, Error> {
        let runtime = ReactiveRuntime::current();
        runtime.track_read(self.id);
        self.refresh(&runtime)?;

        let cached = self.cached.read();
        match cached.as_ref() {
            Some(value) => Ok(value.clone()),
            None => unreachable!("memo cache empty after refresh"),
        }
    }

    /// Read the memoized value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let runtime = ReactiveRuntime::current();
        runtime.track_read(self.id);
        if let Err(err) = self.refresh(&runtime) {
            panic!("{err}");
        }

        let cached = self.cached.read();
        match cached.as_ref() {
            Some(value) => f(value),
            None => unreachable!("memo cache empty after refresh"),
        }
    }

    /// Get the memo's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Create a new memoized computation.
///
/// # Example
///
/// ```
/// use tripwire::{create_memo, create_signal};
///
/// let (count, set_count) = create_signal(5);
/// let doubled = create_memo(move || count.get() * 2);
/// assert_eq!(doubled.get(), 10);
///
/// set_count.set(8);
/// assert_eq!(doubled.get(), 16);
/// ```
pub fn create_memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Memo::new(compute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::create_signal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn memo_basic() {
        let (count, set_count) = create_signal(5);
        let doubled = create_memo(move || count.get() * 2);

        assert_eq!(doubled.get(), 10);

        set_count.set(10);
        assert_eq!(doubled.get(), 20);
        assert_eq!(doubled.with(|v| *v), 20);
    }

    #[test]
    fn memo_is_lazy_and_caches() {
        let (count, set_count) = create_signal(1);
        let computations = Arc::new(AtomicUsize::new(0));

        let squared = Memo::new({
            let computations = Arc::clone(&computations);
            move || {
                computations.fetch_add(1, Ordering::SeqCst);
                let n = count.get();
                n * n
            }
        });

        // Nothing runs until the first read
        assert_eq!(computations.load(Ordering::SeqCst), 0);

        assert_eq!(squared.get(), 1);
        assert_eq!(squared.get(), 1);
        assert_eq!(computations.load(Ordering::SeqCst), 1);

        // One recomputation per distinct upstream change
        set_count.set(3);
        set_count.set(4);
        assert_eq!(squared.get(), 16);
        assert_eq!(computations.load(Ordering::SeqCst), 2);
    }
}
