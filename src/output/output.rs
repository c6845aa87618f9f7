use futures::channel::mpsc;
use futures::stream::Stream;
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use tracing::trace;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct OutputInner<T> {
    next_id: usize,
    subscribers: Vec<(usize, Callback<T>)>,
}

/// An event emitter for pushing discrete values out of reactive code.
///
/// Unlike a [`Signal`](crate::Signal), an output holds no current value:
/// every emitted value is delivered to the subscribers registered at that
/// moment and then gone. This is the push-side counterpart to the
/// pull-based cells.
///
/// # Examples
///
/// ```
/// use tripwire::Output;
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let clicks: Output<u32> = Output::new();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let _sub = clicks.subscribe({
///     let total = total.clone();
///     move |n| {
///         total.fetch_add(*n as usize, Ordering::SeqCst);
///     }
/// });
///
/// clicks.emit(2);
/// clicks.emit(3);
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
pub struct Output<T> {
    inner: Arc<RwLock<OutputInner<T>>>,
}

impl<T> Output<T> {
    /// Create a new output with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(OutputInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Emit a value to all current subscribers.
    pub fn emit(&self, value: T) {
        // Snapshot so a callback may subscribe or unsubscribe reentrantly
        let subscribers: Vec<Callback<T>> = {
            let inner = self.inner.read();
            inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        trace!(subscribers = subscribers.len(), "emitting event");
        for callback in subscribers {
            callback(&value);
        }
    }

    /// Subscribe to emitted values.
    ///
    /// Dropping the returned guard unsubscribes.
    pub fn subscribe<F>(&self, callback: F) -> OutputSubscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));

        OutputSubscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl<T: Clone + Send + 'static> Output<T> {
    /// Convert the output into a stream of emitted values.
    ///
    /// Values emitted after this call are buffered until polled. The stream
    /// ends when every handle to the output has been dropped.
    pub fn to_stream(&self) -> OutputStream<T> {
        let (tx, rx) = mpsc::unbounded();
        let subscription = self.subscribe(move |value: &T| {
            let _ = tx.unbounded_send(value.clone());
        });
        OutputStream {
            receiver: rx,
            _subscription: subscription,
        }
    }
}

impl<T> Default for Output<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// RAII guard for an [`Output`] subscription.
pub struct OutputSubscription<T> {
    id: usize,
    inner: Weak<RwLock<OutputInner<T>>>,
}

impl<T> Drop for OutputSubscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.write().subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Stream of values emitted by an [`Output`].
pub struct OutputStream<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    _subscription: OutputSubscription<T>,
}

impl<T> Stream for OutputStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.get_mut().receiver).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn emit_reaches_all_subscribers() {
        let output: Output<i32> = Output::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let _sub_a = output.subscribe({
            let a = a.clone();
            move |_| {
                a.fetch_add(1, Ordering::SeqCst);
            }
        });
        let _sub_b = output.subscribe({
            let b = b.clone();
            move |_| {
                b.fetch_add(1, Ordering::SeqCst);
            }
        });

        output.emit(1);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let output: Output<i32> = Output::new();
        let count = Arc::new(AtomicUsize::new(0));

        let sub = output.subscribe({
            let count = count.clone();
            move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(output.subscriber_count(), 1);

        output.emit(1);
        drop(sub);
        assert_eq!(output.subscriber_count(), 0);

        output.emit(2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn to_stream_buffers_emitted_values() {
        use futures::StreamExt;

        let output: Output<i32> = Output::new();
        let stream = output.to_stream();

        output.emit(1);
        output.emit(2);
        drop(output);

        let values = futures::executor::block_on(stream.collect::<Vec<_>>());
        assert_eq!(values, vec![1, 2]);
    }
}
