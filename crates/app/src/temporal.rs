//! Temporal filtering: emit a transition only once it has held for a
//! given duration.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use hubkit_domain::error::HubError;
use tokio_stream::Stream;

use crate::state_change::StateTransition;

/// A pending deadline.
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of deadlines for [`WhenStateIsFor`].
pub trait Timer: Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> Sleep;
}

/// [`Timer`] backed by the tokio clock (pausable in tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Debounces predicate edges of a change stream.
///
/// Every change where the predicate flips between old and new snapshot
/// (re)starts the timer, replacing any pending one. When the timer
/// completes the last edge is emitted if the predicate holds on its new
/// snapshot. Changes that do not flip the predicate are dropped without
/// touching the timer.
///
/// Upstream is drained before the timer is polled, so an edge that is
/// already queued always wins over an expiring timer.
pub struct WhenStateIsFor<S, C, P, T> {
    upstream: S,
    upstream_done: bool,
    predicate: P,
    duration: Duration,
    timer: T,
    pending: Option<(C, Sleep)>,
    finished: bool,
}

impl<S, C, P, T> WhenStateIsFor<S, C, P, T> {
    pub fn new(upstream: S, predicate: P, duration: Duration, timer: T) -> Self {
        Self {
            upstream,
            upstream_done: false,
            predicate,
            duration,
            timer,
            pending: None,
            finished: false,
        }
    }
}

impl<S, C, P, T> fmt::Debug for WhenStateIsFor<S, C, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhenStateIsFor")
            .field("duration", &self.duration)
            .field("pending", &self.pending.is_some())
            .field("upstream_done", &self.upstream_done)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<S, C, P, T> Stream for WhenStateIsFor<S, C, P, T>
where
    S: Stream<Item = Result<C, HubError>> + Unpin,
    C: StateTransition + Unpin,
    P: FnMut(Option<&C::Snapshot>) -> bool + Unpin,
    T: Timer + Unpin,
{
    type Item = Result<C, HubError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        while !this.upstream_done {
            match Pin::new(&mut this.upstream).poll_next(cx) {
                Poll::Ready(Some(Ok(change))) => {
                    let before = (this.predicate)(change.old_snapshot());
                    let after = (this.predicate)(change.new_snapshot());
                    if before != after {
                        let sleep = this.timer.sleep(this.duration);
                        this.pending = Some((change, sleep));
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    this.finished = true;
                    this.pending = None;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => this.upstream_done = true,
                Poll::Pending => break,
            }
        }

        let expired = match this.pending.as_mut() {
            Some((_, sleep)) => sleep.as_mut().poll(cx).is_ready(),
            None => false,
        };
        if expired
            && let Some((change, _)) = this.pending.take()
            && (this.predicate)(change.new_snapshot())
        {
            return Poll::Ready(Some(Ok(change)));
        }

        if this.upstream_done && this.pending.is_none() {
            this.finished = true;
            return Poll::Ready(None);
        }
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entity::{Entity, EntitySet};
    use crate::state_bus::InProcessStateBus;
    use crate::stream::StateChangeStreamExt;
    use hubkit_domain::state::EntityState;
    use tokio::time::{Instant, timeout};
    use tokio_stream::StreamExt;

    const HOLD: Duration = Duration::from_secs(5);

    fn is_on(state: Option<&EntityState>) -> bool {
        state.is_some_and(EntityState::is_on)
    }

    fn set(bus: &InProcessStateBus, state: &str) {
        bus.set_state(EntityState::new("light.kitchen", Some(state)));
    }

    #[tokio::test(start_paused = true)]
    async fn should_emit_on_event_when_state_holds_for_duration() {
        let bus = Arc::new(InProcessStateBus::new(16));
        set(&bus, "off");
        let light = Entity::new(Arc::clone(&bus), "light.kitchen");
        let mut stream = light.state_all_changes().when_state_is_for(is_on, HOLD);

        let start = Instant::now();
        set(&bus, "on");

        let change = stream.next().await.unwrap().unwrap();
        assert_eq!(change.new.unwrap().state(), Some("on"));
        assert!(start.elapsed() >= HOLD);

        let nothing_more = timeout(Duration::from_secs(60), stream.next()).await;
        assert!(nothing_more.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_emit_nothing_when_state_reverts_within_window() {
        let bus = Arc::new(InProcessStateBus::new(16));
        set(&bus, "off");
        let light = Entity::new(Arc::clone(&bus), "light.kitchen");
        let mut stream = light.state_all_changes().when_state_is_for(is_on, HOLD);

        set(&bus, "on");
        assert!(timeout(Duration::from_secs(2), stream.next()).await.is_err());
        set(&bus, "off");

        assert!(timeout(Duration::from_secs(60), stream.next()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_reset_timer_when_on_is_repeated() {
        let bus = Arc::new(InProcessStateBus::new(16));
        set(&bus, "off");
        let light = Entity::new(Arc::clone(&bus), "light.kitchen");
        let mut stream = light.state_all_changes().when_state_is_for(is_on, HOLD);

        let start = Instant::now();
        set(&bus, "on");
        assert!(timeout(Duration::from_secs(3), stream.next()).await.is_err());
        bus.set_state(
            EntityState::new("light.kitchen", Some("on"))
                .with_attributes(serde_json::json!({"brightness": 80})),
        );

        let change = stream.next().await.unwrap().unwrap();
        assert!(change.old.unwrap().is_off());
        let elapsed = start.elapsed();
        assert!(elapsed >= HOLD && elapsed < HOLD + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn should_restart_timer_on_every_edge() {
        let bus = Arc::new(InProcessStateBus::new(16));
        set(&bus, "off");
        let light = Entity::new(Arc::clone(&bus), "light.kitchen");
        let mut stream = light.state_all_changes().when_state_is_for(is_on, HOLD);

        set(&bus, "on");
        assert!(timeout(Duration::from_secs(4), stream.next()).await.is_err());
        set(&bus, "off");
        assert!(timeout(Duration::from_secs(1), stream.next()).await.is_err());
        let start = Instant::now();
        set(&bus, "on");

        let change = stream.next().await.unwrap().unwrap();
        assert!(change.new.unwrap().is_on());
        assert!(start.elapsed() >= HOLD);
    }

    #[tokio::test(start_paused = true)]
    async fn should_finish_pending_timer_when_upstream_ends() {
        let upstream = tokio_stream::iter(vec![Ok::<_, HubError>(
            hubkit_domain::state::RawStateChange {
                entity_id: "light.kitchen".to_string(),
                old: Some(EntityState::new("light.kitchen", Some("off"))),
                new: Some(EntityState::new("light.kitchen", Some("on"))),
            },
        )]);
        let mut stream = WhenStateIsFor::new(upstream, is_on, HOLD, TokioTimer);

        let change = stream.next().await.unwrap().unwrap();
        assert_eq!(change.entity_id, "light.kitchen");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_forward_error_and_end() {
        let upstream = tokio_stream::iter(vec![
            Ok(hubkit_domain::state::RawStateChange {
                entity_id: "light.kitchen".to_string(),
                old: Some(EntityState::new("light.kitchen", Some("off"))),
                new: Some(EntityState::new("light.kitchen", Some("on"))),
            }),
            Err(HubError::Bus(hubkit_domain::error::BusError::Lagged { skipped: 3 })),
        ]);
        let mut stream = WhenStateIsFor::new(upstream, is_on, HOLD, TokioTimer);

        assert!(matches!(stream.next().await, Some(Err(HubError::Bus(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_release_every_subscription_when_merged_filter_is_dropped() {
        let bus = Arc::new(InProcessStateBus::new(16));
        set(&bus, "off");
        let lights = EntitySet::new(vec![
            Entity::new(Arc::clone(&bus), "light.kitchen"),
            Entity::new(Arc::clone(&bus), "light.bedroom"),
        ]);
        let mut stream = lights.state_all_changes().when_state_is_for(is_on, HOLD);
        assert_eq!(bus.subscriber_count(), 2);

        set(&bus, "on");
        let pending = timeout(Duration::from_secs(1), stream.next()).await;
        assert!(pending.is_err());

        drop(stream);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
