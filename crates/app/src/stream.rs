//! Combinators over typed state-change streams.

use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use hubkit_domain::error::HubError;
use tokio_stream::{Stream, StreamExt, StreamMap};

use crate::state_change::StateTransition;
use crate::temporal::{Timer, TokioTimer, WhenStateIsFor};

/// A boxed stream of changes. An `Err` item is always the last one.
pub type ChangeStream<T> = Pin<Box<dyn Stream<Item = Result<T, HubError>> + Send>>;

/// Ends a stream right after its first error.
#[derive(Debug)]
pub struct UntilError<S> {
    inner: S,
    done: bool,
}

impl<S> UntilError<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, done: false }
    }
}

impl<S, T> Stream for UntilError<S>
where
    S: Stream<Item = Result<T, HubError>> + Unpin,
{
    type Item = Result<T, HubError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        let item = ready!(Pin::new(&mut this.inner).poll_next(cx));
        if !matches!(item, Some(Ok(_))) {
            this.done = true;
        }
        Poll::Ready(item)
    }
}

/// Extension methods for streams of state changes.
pub trait StateChangeStreamExt<C>: Stream<Item = Result<C, HubError>> + Sized {
    /// Keep only changes whose state string differs between old and new.
    /// Errors pass through.
    fn state_changes_only(self) -> ChangeStream<C>
    where
        Self: Send + 'static,
        C: StateTransition + Send + 'static,
    {
        Box::pin(self.filter(|item| match item {
            Ok(change) => change.is_state_change(),
            Err(_) => true,
        }))
    }

    /// End the stream after forwarding its first error.
    fn until_error(self) -> UntilError<Self>
    where
        Self: Unpin,
    {
        UntilError::new(self)
    }

    /// Emit a change only once `predicate` has held on its new snapshot
    /// for `duration`, using the tokio clock.
    fn when_state_is_for<P>(self, predicate: P, duration: Duration) -> ChangeStream<C>
    where
        Self: Unpin + Send + 'static,
        C: StateTransition + Unpin + Send + 'static,
        P: FnMut(Option<&C::Snapshot>) -> bool + Unpin + Send + 'static,
    {
        self.when_state_is_for_with(predicate, duration, TokioTimer)
    }

    /// Same as [`when_state_is_for`](Self::when_state_is_for) with an
    /// explicit timer.
    fn when_state_is_for_with<P, T>(self, predicate: P, duration: Duration, timer: T) -> ChangeStream<C>
    where
        Self: Unpin + Send + 'static,
        C: StateTransition + Unpin + Send + 'static,
        P: FnMut(Option<&C::Snapshot>) -> bool + Unpin + Send + 'static,
        T: Timer + Unpin,
    {
        Box::pin(WhenStateIsFor::new(self, predicate, duration, timer))
    }
}

impl<S, C> StateChangeStreamExt<C> for S where S: Stream<Item = Result<C, HubError>> {}

/// Merge several change streams, interleaved by arrival.
///
/// No deduplication happens. The merged stream ends after the first error
/// of any branch, or once every branch has ended.
pub fn merge<T, I>(streams: I) -> ChangeStream<T>
where
    T: Send + 'static,
    I: IntoIterator<Item = ChangeStream<T>>,
{
    let mut branches = StreamMap::new();
    for (index, stream) in streams.into_iter().enumerate() {
        branches.insert(index, stream);
    }
    Box::pin(branches.map(|(_, item)| item).until_error())
}
