//! A Raft consensus engine. It coordinates a cluster of replicas such that
//! they all apply the same ordered sequence of commands to identical,
//! deterministic state machines. The engine implements leader election, log
//! replication, commit advancement, and role transitions; log storage, the
//! state machine, and the RPC transport are pluggable collaborators.
//!
//! For the algorithm itself, see the Raft paper:
//! https://raft.github.io/raft.pdf

#![warn(clippy::all)]

mod engine;
pub mod error;
mod log;
mod message;
mod state;
pub mod storage;
mod transport;

pub use engine::{Engine, Options, PeerId, Role, Term, Ticks, TICK_INTERVAL};
pub use error::{Error, Result};
pub use self::log::{Entry, Index, Log};
pub use message::{AppendRequest, AppendResponse, VoteRequest, VoteResponse};
pub use state::{Command, StateMachine};
pub use transport::{ResponseHandler, Transport};
