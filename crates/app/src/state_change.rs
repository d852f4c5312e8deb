//! Typed state changes and the traits combinators work against.

use hubkit_domain::state::{AttributeDecoder, EntityState, NumericEntityState, RawStateChange};

/// Transition of one entity: the handle plus the snapshots on both sides.
///
/// `old` is `None` for a newly created entity, `new` is `None` for a
/// removed one.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange<E, S> {
    pub entity: E,
    pub old: Option<S>,
    pub new: Option<S>,
}

/// A state snapshot exposing its raw state string.
pub trait StateSnapshot {
    fn raw_state(&self) -> Option<&str>;
}

impl<D: AttributeDecoder> StateSnapshot for EntityState<D> {
    fn raw_state(&self) -> Option<&str> {
        self.state()
    }
}

impl<D: AttributeDecoder> StateSnapshot for NumericEntityState<D> {
    fn raw_state(&self) -> Option<&str> {
        self.entity_state().state()
    }
}

/// Anything with an old and a new snapshot.
pub trait StateTransition {
    type Snapshot: StateSnapshot;

    fn old_snapshot(&self) -> Option<&Self::Snapshot>;

    fn new_snapshot(&self) -> Option<&Self::Snapshot>;

    /// Whether the state string differs on both sides, ordinal and
    /// null-aware. Attribute-only updates are not state changes.
    fn is_state_change(&self) -> bool {
        self.old_snapshot().and_then(StateSnapshot::raw_state)
            != self.new_snapshot().and_then(StateSnapshot::raw_state)
    }
}

impl<E, S: StateSnapshot> StateTransition for StateChange<E, S> {
    type Snapshot = S;

    fn old_snapshot(&self) -> Option<&S> {
        self.old.as_ref()
    }

    fn new_snapshot(&self) -> Option<&S> {
        self.new.as_ref()
    }
}

impl StateTransition for RawStateChange {
    type Snapshot = EntityState;

    fn old_snapshot(&self) -> Option<&EntityState> {
        self.old.as_ref()
    }

    fn new_snapshot(&self) -> Option<&EntityState> {
        self.new.as_ref()
    }
}
