use crate::log::Index;
use crate::engine::Term;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A state machine command. Commands are replicated through the log, so they
/// must be serializable, and they must be deterministic: applying the same
/// command to the same state on every replica must yield the same state.
///
/// Commands cannot fail. Any panic while applying a command is fatal and
/// must terminate the replica, since replicas would otherwise diverge.
pub trait Command<S: ?Sized>: Clone + std::fmt::Debug + Send + Serialize + DeserializeOwned + 'static {
    /// Applies the command to the given state machine.
    fn apply_to(&self, state: &mut S);
}

/// A replicated state machine driven by the Raft engine. The engine applies
/// committed log entries in index order, calling the entry command's
/// [`Command::apply_to`] followed by [`StateMachine::apply`] to record the
/// applied position.
pub trait StateMachine: Send + 'static {
    /// The command type applied to this state machine.
    type Command: Command<Self>;

    /// Returns the index of the last applied entry, or 0 if none.
    fn applied_index(&self) -> Index;

    /// Records that the entry at the given index and term has been applied.
    fn apply(&mut self, index: Index, term: Term);

    /// Resets the state machine to its initial (empty) state. Used when a
    /// deposed leader must discard optimistically applied entries that never
    /// committed, before replaying the log up to the commit index.
    fn reset(&mut self);
}
