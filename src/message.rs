use crate::engine::{PeerId, Term};
use crate::log::{Entry, Index};

use serde::{Deserialize, Serialize};

/// A RequestVote RPC, sent by candidates to solicit votes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteRequest {
    /// The candidate's term.
    pub term: Term,
    /// The candidate requesting the vote.
    pub candidate_id: PeerId,
    /// The index of the candidate's last log entry.
    pub last_log_index: Index,
    /// The term of the candidate's last log entry.
    pub last_log_term: Term,
}

/// A RequestVote RPC response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    /// The responder's current term, for the candidate to update itself.
    pub term: Term,
    /// Whether the responder granted its vote to the candidate.
    pub granted: bool,
}

/// An AppendEntries RPC, sent by leaders to replicate log entries. An empty
/// entries vector is a heartbeat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppendRequest<C> {
    /// The leader's term.
    pub term: Term,
    /// The leader's ID, so followers can redirect clients.
    pub leader_id: PeerId,
    /// The index of the log entry immediately preceding the new ones.
    pub prev_log_index: Index,
    /// The term of the entry at prev_log_index.
    pub prev_log_term: Term,
    /// Entries to replicate, empty for heartbeats.
    pub entries: Vec<Entry<C>>,
    /// The leader's commit index.
    pub leader_commit: Index,
}

/// An AppendEntries RPC response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppendResponse {
    /// The responder's current term, for the leader to update itself.
    pub term: Term,
    /// Whether the entries were appended. False if the responder's log did
    /// not contain the prev_log_index/prev_log_term entry.
    pub success: bool,
    /// The responder's last log index, which bounds the leader's rewind
    /// after a rejection.
    pub last_log_index: Index,
}
