use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

/// Reactive context for tracking dependencies.
struct ReactiveContext {
    // Map from cell ID to set of observer IDs that depend on it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to set of cell IDs it depends on
    observer_deps: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to the observer function
    observers: HashMap<usize, Arc<dyn Fn() + Send + Sync>>,
    // Map from memo ID to dirty state
    memo_dirty: HashMap<usize, bool>,
    // Open batch count; effects are deferred while non-zero.
    batch_depth: usize,
    // Effects deferred by an open batch, in first-trigger order.
    pending_effects: IndexSet<usize>,
}

impl ReactiveContext {
    fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
            observer_deps: HashMap::new(),
            observers: HashMap::new(),
            memo_dirty: HashMap::new(),
            batch_depth: 0,
            pending_effects: IndexSet::new(),
        }
    }

    /// Drop every dependency edge touching `observer_id`, both directions.
    fn clear_observer_deps(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for cell_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&cell_id) {
                    deps.remove(&observer_id);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.dependencies.clear();
        self.observer_deps.clear();
        self.observers.clear();
        self.memo_dirty.clear();
        self.batch_depth = 0;
        self.pending_effects.clear();
    }
}

/// Inner runtime state that can be shared.
pub struct RuntimeInner {
    context: Mutex<ReactiveContext>,
}

impl RuntimeInner {
    fn new() -> Self {
        Self {
            context: Mutex::new(ReactiveContext::new()),
        }
    }

    pub fn remove_observer(&mut self, observer_id: usize) {
        let mut ctx = self.context.lock();
        ctx.observers.remove(&observer_id);
        ctx.memo_dirty.remove(&observer_id);
        ctx.pending_effects.shift_remove(&observer_id);
        ctx.clear_observer_deps(observer_id);
    }

    fn clear(&mut self) {
        self.context.lock().clear();
    }
}

/// Hybrid reactive runtime for managing reactive primitives.
///
/// Supports both a global runtime (default) and scoped runtimes for
/// isolation. The runtime tracks dependencies between cells, effects, and
/// memos, and manages the reactive graph: which observer re-runs when which
/// cell changes, which memos are stale, and which effect runs are deferred
/// by an open batch.
///
/// # Examples
///
/// Using the default global runtime:
///
/// ```
/// use tripwire::Signal;
///
/// let signal = Signal::new(42);
/// assert_eq!(signal.get(), 42);
/// ```
///
/// Using scoped runtimes for isolation:
///
/// ```
/// use tripwire::runtime::ReactiveRuntime;
/// use tripwire::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// // Runtime and all its state is dropped here
/// ```
pub struct ReactiveRuntime {
    next_id: AtomicUsize,
    inner: Arc<RwLock<RuntimeInner>>,
}

// Thread-local stack for scoped runtimes
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = RefCell::new(vec![]);
}

// Per-thread stack of executing observers. `Some(id)` is an observer frame,
// `None` an untracked frame; the top decides what a read subscribes.
// Observation is cooperative and single-threaded, so this lives outside the
// shared graph state.
thread_local! {
    static OBSERVER_FRAMES: RefCell<Vec<Option<usize>>> = RefCell::new(vec![]);
}

fn current_observer() -> Option<usize> {
    OBSERVER_FRAMES.with(|frames| frames.borrow().last().copied().flatten())
}

impl ReactiveRuntime {
    fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            next_id: AtomicUsize::new(0),
            inner: Arc::new(RwLock::new(RuntimeInner::new())),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Useful for testing or creating isolated reactive contexts. The
    /// runtime and all its state is cleaned up when the function returns.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let runtime = Self::new();
        Self::with_runtime(runtime, f)
    }

    /// Get or create the global runtime (fallback).
    ///
    /// This is used as the default runtime when no scoped runtime is active.
    pub fn global() -> Arc<Self> {
        use std::sync::OnceLock;
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// Get the current reactive runtime (scoped or global fallback).
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(Self::global)
        })
    }

    /// Run a function with a specific runtime as the current context.
    ///
    /// This pushes the runtime onto the thread-local stack for the duration
    /// of the function execution.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Clear all observers, dependencies, and state from this runtime.
    ///
    /// Useful for resetting between tests. This removes all tracked
    /// dependencies and observers and resets the ID counter.
    pub fn clear(&self) {
        self.inner.write().clear();
        self.next_id.store(0, Ordering::SeqCst);
    }

    /// Get a reference to the inner runtime state.
    pub fn inner(&self) -> Arc<RwLock<RuntimeInner>> {
        Arc::clone(&self.inner)
    }

    /// Generate the next unique ID for a reactive primitive.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Track a read of a cell by the current observer.
    pub fn track_read(&self, cell_id: usize) {
        let Some(observer) = current_observer() else {
            return;
        };
        // A memo reading itself while recomputing is not a dependency.
        if observer == cell_id {
            return;
        }
        let inner = self.inner.read();
        let mut ctx = inner.context.lock();
        ctx.dependencies
            .entry(cell_id)
            .or_default()
            .insert(observer);
        ctx.observer_deps
            .entry(observer)
            .or_default()
            .insert(cell_id);
    }

    /// Notify all observers that depend on a cell.
    pub fn notify_observers(&self, cell_id: usize) {
        trace!(cell = cell_id, "cell changed");
        let observers = {
            let inner = self.inner.read();
            let ctx = inner.context.lock();
            ctx.dependencies
                .get(&cell_id)
                .map(|obs| obs.iter().copied().collect::<Vec<_>>())
        };

        if let Some(observers) = observers {
            for observer_id in observers {
                self.mark_observer_dirty(observer_id);
            }
        }
    }

    /// Mark an observer (memo or effect) as dirty and propagate to dependents.
    fn mark_observer_dirty(&self, observer_id: usize) {
        {
            let inner = self.inner.read();
            let mut ctx = inner.context.lock();

            // Memos are marked stale and their own dependents propagated;
            // recomputation waits for the next read.
            if ctx.memo_dirty.contains_key(&observer_id) {
                let already_dirty = ctx.memo_dirty.get(&observer_id).copied().unwrap_or(false);
                if already_dirty {
                    return;
                }
                ctx.memo_dirty.insert(observer_id, true);

                let dependents = ctx
                    .dependencies
                    .get(&observer_id)
                    .map(|deps| deps.iter().copied().collect::<Vec<_>>());

                drop(ctx);
                drop(inner);

                if let Some(dependents) = dependents {
                    for dependent_id in dependents {
                        self.mark_observer_dirty(dependent_id);
                    }
                }
                return;
            }
        }

        // Effect observer: run now, or defer while a batch is open.
        let effect = {
            let inner = self.inner.read();
            let mut ctx = inner.context.lock();
            if ctx.batch_depth > 0 {
                if ctx.observers.contains_key(&observer_id) {
                    ctx.pending_effects.insert(observer_id);
                }
                None
            } else {
                ctx.observers.get(&observer_id).cloned()
            }
        };

        if let Some(effect) = effect {
            trace!(observer = observer_id, "running effect");
            effect();
        }
    }

    /// Register an observer function, replacing any previous dependencies.
    pub fn create_observer<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = self.inner.read();
        let mut ctx = inner.context.lock();
        ctx.clear_observer_deps(observer_id);
        ctx.observers.insert(observer_id, Arc::new(f));
    }

    /// Drop all dependencies recorded for an observer.
    ///
    /// Observers call this before re-running so that reads taken only on a
    /// previous run (in a branch that is no longer active, say) stop
    /// triggering them.
    pub fn clear_dependencies(&self, observer_id: usize) {
        let inner = self.inner.read();
        let mut ctx = inner.context.lock();
        ctx.clear_observer_deps(observer_id);
    }

    /// Run a function with a specific observer as the current context.
    pub fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        OBSERVER_FRAMES.with(|frames| {
            frames.borrow_mut().push(Some(observer_id));
        });

        let result = f();

        OBSERVER_FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });

        result
    }

    /// Whether an observer is somewhere on the currently-executing stack.
    pub fn is_observer_active(&self, observer_id: usize) -> bool {
        OBSERVER_FRAMES.with(|frames| frames.borrow().contains(&Some(observer_id)))
    }

    /// Run a function without registering any dependencies.
    ///
    /// Cell reads inside `f` return current values but do not subscribe the
    /// enclosing observer to them.
    pub fn untrack<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        OBSERVER_FRAMES.with(|frames| {
            frames.borrow_mut().push(None);
        });

        let result = f();

        OBSERVER_FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });

        result
    }

    /// Run a function with effect execution deferred until it returns.
    ///
    /// Writes inside the batch still update cell values and mark memos
    /// stale immediately; only effect runs are held back. Each affected
    /// effect runs once when the outermost batch closes, no matter how many
    /// of its dependencies changed.
    pub fn batch<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        {
            let inner = self.inner.read();
            inner.context.lock().batch_depth += 1;
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        {
            let inner = self.inner.read();
            inner.context.lock().batch_depth -= 1;
        }
        self.flush_pending_effects();

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Run deferred effects in first-trigger order.
    fn flush_pending_effects(&self) {
        loop {
            let effect = {
                let inner = self.inner.read();
                let mut ctx = inner.context.lock();
                if ctx.batch_depth > 0 {
                    return;
                }
                match ctx.pending_effects.shift_remove_index(0) {
                    Some(observer_id) => ctx.observers.get(&observer_id).cloned(),
                    None => return,
                }
            };
            if let Some(effect) = effect {
                effect();
            }
        }
    }

    /// Register a memo and mark it as dirty initially.
    pub fn register_memo(&self, memo_id: usize) {
        let inner = self.inner.read();
        inner.context.lock().memo_dirty.insert(memo_id, true);
    }

    /// Check if a memo is dirty (needs recomputation).
    pub fn is_memo_dirty(&self, memo_id: usize) -> bool {
        let inner = self.inner.read();
        let ctx = inner.context.lock();
        ctx.memo_dirty.get(&memo_id).copied().unwrap_or(true)
    }

    /// Mark a memo as clean (after recomputation).
    pub fn mark_memo_clean(&self, memo_id: usize) {
        let inner = self.inner.read();
        inner.context.lock().memo_dirty.insert(memo_id, false);
    }
}

/// Run `f` with effect execution deferred and deduplicated.
///
/// # Examples
///
/// ```
/// use tripwire::{batch, Effect, Signal};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let a = Signal::new(0);
/// let b = Signal::new(0);
/// let runs = Arc::new(AtomicUsize::new(0));
///
/// let _effect = Effect::new({
///     let (a, b, runs) = (a.clone(), b.clone(), runs.clone());
///     move || {
///         let _ = (a.get(), b.get());
///         runs.fetch_add(1, Ordering::SeqCst);
///     }
/// });
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
///
/// batch(|| {
///     a.set(1);
///     b.set(2);
/// });
/// // One run for the whole batch, not one per write.
/// assert_eq!(runs.load(Ordering::SeqCst), 2);
/// ```
pub fn batch<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    ReactiveRuntime::current().batch(f)
}

/// Run `f` without registering dependencies on the cells it reads.
pub fn untrack<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    ReactiveRuntime::current().untrack(f)
}
