use crate::runtime::{ReactiveRuntime, RuntimeInner};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// A side effect that runs when its dependencies change.
///
/// The effect runs immediately on creation, registering a dependency on
/// every cell it reads, and re-runs whenever one of those cells changes.
/// Dependencies are re-tracked on every run, so a read taken only in a
/// branch that is no longer active stops triggering the effect.
///
/// Dropping the `Effect` unregisters it.
///
/// # Examples
///
/// ```
/// use tripwire::{Effect, Signal};
/// use std::sync::{Arc, atomic::{AtomicI32, Ordering}};
///
/// let count = Signal::new(5);
/// let seen = Arc::new(AtomicI32::new(0));
///
/// let _effect = Effect::new({
///     let (count, seen) = (count.clone(), seen.clone());
///     move || {
///         seen.store(count.get(), Ordering::SeqCst);
///     }
/// });
/// assert_eq!(seen.load(Ordering::SeqCst), 5);
///
/// count.set(10);
/// assert_eq!(seen.load(Ordering::SeqCst), 10);
/// ```
pub struct Effect {
    id: usize,
    runtime: Weak<RwLock<RuntimeInner>>,
}

impl Effect {
    /// Create a new effect that runs when dependencies change.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();
        let effect = Arc::new(effect);

        // Re-runs drop the previous dependency set and track from scratch.
        let rerun = {
            let effect = Arc::clone(&effect);
            move || {
                let runtime = ReactiveRuntime::current();
                runtime.clear_dependencies(id);
                runtime.with_observer(id, || effect());
            }
        };
        runtime.create_observer(id, rerun);

        // Run immediately within the observer context to establish
        // the initial dependencies
        runtime.with_observer(id, || effect());

        Self {
            id,
            runtime: Arc::downgrade(&runtime.inner()),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.write().remove_observer(self.id);
        }
    }
}

/// Create a new effect that runs when dependencies change.
///
/// The effect runs immediately and then again whenever any cell it read
/// during its last run changes. The returned handle must be kept alive;
/// dropping it disconnects the effect.
pub fn create_effect<F>(effect: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(effect)
}
