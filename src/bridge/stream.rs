use crate::signal::{ReadSignal, Signal, WatchGuard, WriteSignal};
use futures::channel::mpsc;
use futures::stream::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future that forwards a stream's items into a cell.
///
/// The crate schedules nothing itself: the caller decides where this runs
/// by spawning it on an executor of their choice, or by driving it directly
/// with `futures::executor::block_on` in synchronous code. The future
/// completes when the stream ends.
pub struct StreamBridge<S: Stream> {
    stream: S,
    write: WriteSignal<S::Item>,
}

impl<S> Future for StreamBridge<S>
where
    S: Stream + Unpin,
    S::Item: Clone + Send + Sync + 'static,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        loop {
            match Pin::new(&mut this.stream).poll_next(cx) {
                Poll::Ready(Some(item)) => this.write.set(item),
                Poll::Ready(None) => return Poll::Ready(()),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Turn a push-based stream into a pull-based cell.
///
/// The cell starts at `None` and tracks the latest item once the returned
/// [`StreamBridge`] is driven. Each arriving item goes through the cell's
/// normal write path, so equal consecutive items notify dependents only
/// once.
///
/// # Examples
///
/// ```
/// use tripwire::bridge::from_stream;
///
/// let (latest, bridge) = from_stream(futures::stream::iter([1, 2, 3]));
/// assert_eq!(latest.get(), None);
///
/// futures::executor::block_on(bridge);
/// assert_eq!(latest.get(), Some(3));
/// ```
pub fn from_stream<S>(
    stream: S,
) -> (
    ReadSignal<Option<S::Item>>,
    StreamBridge<impl Stream<Item = Option<S::Item>> + Unpin>,
)
where
    S: Stream + Unpin,
    S::Item: Clone + PartialEq + Send + Sync + 'static,
{
    let signal = Signal::new(None::<S::Item>);
    let bridge = StreamBridge {
        stream: stream.map(Some),
        write: signal.write_only(),
    };
    (signal.read_only(), bridge)
}

/// Like [`from_stream`], with a synchronous initial value instead of `None`.
pub fn from_stream_with_initial<S>(
    initial: S::Item,
    stream: S,
) -> (ReadSignal<S::Item>, StreamBridge<S>)
where
    S: Stream + Unpin,
    S::Item: Clone + PartialEq + Send + Sync + 'static,
{
    let signal = Signal::new(initial);
    let bridge = StreamBridge {
        stream,
        write: signal.write_only(),
    };
    (signal.read_only(), bridge)
}

/// Stream of a cell's accepted writes.
///
/// Yields the current value immediately, then every value the cell accepts.
/// Values arriving between polls are buffered in order. Dropping the stream
/// disconnects it from the cell.
pub struct SignalStream<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    _watch: WatchGuard,
}

impl<T> Stream for SignalStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.get_mut().receiver).poll_next(cx)
    }
}

/// Turn a pull-based cell into a push-based stream.
///
/// # Examples
///
/// ```
/// use futures::StreamExt;
/// use tripwire::bridge::to_stream;
/// use tripwire::Signal;
///
/// let count = Signal::new(0);
/// let stream = to_stream(&count);
///
/// count.set(1);
/// count.set(1); // gated out, not emitted
/// count.set(2);
///
/// let seen = futures::executor::block_on(stream.take(3).collect::<Vec<_>>());
/// assert_eq!(seen, vec![0, 1, 2]);
/// ```
pub fn to_stream<T>(signal: &Signal<T>) -> SignalStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded();
    let watch = signal.watch(move |value| {
        let _ = tx.unbounded_send(value);
    });
    SignalStream {
        receiver: rx,
        _watch: watch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn from_stream_tracks_latest_item() {
        let (latest, bridge) = from_stream(futures::stream::iter(["a", "b", "c"]));
        assert_eq!(latest.get(), None);

        block_on(bridge);
        assert_eq!(latest.get(), Some("c"));
    }

    #[test]
    fn from_stream_with_initial_starts_synchronously() {
        let (value, bridge) = from_stream_with_initial(10, futures::stream::iter([20, 30]));
        assert_eq!(value.get(), 10);

        block_on(bridge);
        assert_eq!(value.get(), 30);
    }

    #[test]
    fn to_stream_replays_current_then_follows_writes() {
        let signal = Signal::new(0);
        let stream = to_stream(&signal);

        signal.set(1);
        signal.set(2);

        let seen = block_on(stream.take(3).collect::<Vec<_>>());
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn gated_writes_are_not_emitted() {
        let signal = Signal::new(5);
        let stream = to_stream(&signal);

        signal.set(5); // unchanged, discarded
        signal.set(6);

        let seen = block_on(stream.take(2).collect::<Vec<_>>());
        assert_eq!(seen, vec![5, 6]);
    }
}
