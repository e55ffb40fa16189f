use crate::error::Result;
use crate::log::{Index, Log};
use crate::message::{AppendRequest, AppendResponse, VoteRequest, VoteResponse};
use crate::state::{Command as _, StateMachine};
use crate::transport::{ResponseHandler, Transport};

use itertools::Itertools as _;
use log::{debug, error, info, warn};
use rand::Rng as _;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

/// A peer ID. 0 is reserved and never identifies a node.
pub type PeerId = u64;

/// A leader term. 0 means no term.
pub type Term = u64;

/// A logical clock instant or duration, as a number of ticks. The periodic
/// worker advances the clock by one tick every TICK_INTERVAL, so a Ticks
/// value converts to wall-clock time by multiplying with it.
pub type Ticks = u64;

/// The interval between periodic ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// The fixed part of the election timeout (1 second).
const ELECTION_TIMEOUT_FIXED: Ticks = 100;

/// The randomized part of the election timeout (up to 2 seconds), to avoid
/// repeated split votes.
const ELECTION_TIMEOUT_RANDOM: Ticks = 200;

/// The interval between appends to an idle peer, i.e. heartbeats (250 ms).
const HEARTBEAT_INTERVAL: Ticks = 25;

/// The time after which an unanswered append RPC is presumed lost and
/// dispatch to the peer is re-armed (1 second).
const APPEND_TIMEOUT: Ticks = 100;

/// The maximum number of entries sent in a single append request.
const MAX_ENTRIES_PER_REQUEST: usize = 250;

/// Raft engine options. Durations are given in ticks of TICK_INTERVAL.
#[derive(Clone, Debug)]
pub struct Options {
    /// The fixed part of the election timeout.
    pub election_timeout_fixed: Ticks,
    /// The randomized part of the election timeout. Every rescheduled
    /// deadline adds a uniform random duration in [0, election_timeout_random).
    pub election_timeout_random: Ticks,
    /// The interval between appends to an idle peer (heartbeats).
    pub heartbeat_interval: Ticks,
    /// The time after which an unanswered append RPC is presumed lost and
    /// dispatch to the peer is re-armed.
    pub append_timeout: Ticks,
    /// The maximum number of entries per append request.
    pub max_entries_per_request: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            election_timeout_fixed: ELECTION_TIMEOUT_FIXED,
            election_timeout_random: ELECTION_TIMEOUT_RANDOM,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            append_timeout: APPEND_TIMEOUT,
            max_entries_per_request: MAX_ENTRIES_PER_REQUEST,
        }
    }
}

/// A node role. Nodes begin Joining and become Follower on start(), then
/// move between Follower, Candidate, and Leader as elections run. An
/// Observer replicates and applies the log but never campaigns; the engine
/// never enters or leaves that role on its own. Leaving is terminal and
/// stops the periodic worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Joining,
    Observer,
    Follower,
    Candidate,
    Leader,
    Leaving,
}

/// A remote peer's replication state, tracked by the leader.
struct Peer {
    /// The next log index to send to this peer.
    next_index: Index,
    /// The highest log index known to be replicated to this peer.
    match_index: Index,
    /// Whether an append RPC to this peer is in flight. Only one append is
    /// outstanding per peer at a time, which keeps responses in send order.
    append_pending: bool,
    /// The tick at which the last append was sent, for heartbeat cadence.
    last_append: Ticks,
    /// The sequence number of the last append sent. Response handlers echo
    /// the sequence of the send they answer, so a late response to an
    /// append that was presumed lost (and superseded after the append
    /// timeout) is told apart from the current in-flight one.
    seq: u64,
}

impl Peer {
    fn new() -> Self {
        Self { next_index: 1, match_index: 0, append_pending: false, last_append: 0, seq: 0 }
    }
}

/// A Raft consensus engine, generic over the state machine it coordinates.
/// The log, state machine, and RPC transport are collaborators passed in at
/// construction.
///
/// All engine state lives behind a single mutex: ticks, inbound RPC
/// handlers, outbound response callbacks, and command proposals each acquire
/// it for their full duration, so every state transition is atomic with
/// respect to all others. The handle itself is cheaply cloneable and can be
/// shared with the transport for inbound dispatch.
pub struct Engine<S: StateMachine> {
    shared: Arc<Shared<S>>,
}

impl<S: StateMachine> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

struct Shared<S: StateMachine> {
    raft: Mutex<Raft<S>>,
    worker: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl<S: StateMachine> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Raft<S>> {
        self.raft.lock().expect("raft mutex poisoned")
    }
}

impl<S: StateMachine> Engine<S> {
    /// Creates a new Raft engine coordinating the given state machine, with
    /// the given log and transport. The node starts in the Joining role;
    /// set_peer_id() and add_peer() must be called before start().
    pub fn new(
        log: Log<S::Command>,
        state: S,
        transport: Box<dyn Transport<S::Command>>,
        options: Options,
    ) -> Self {
        let shared = Arc::new_cyclic(|weak| Shared {
            raft: Mutex::new(Raft {
                weak: weak.clone(),
                id: 0,
                role: Role::Joining,
                term: 0,
                voted_for: None,
                leader_id: None,
                clock: 0,
                election_deadline: 0,
                votes: HashSet::new(),
                peers: HashMap::new(),
                log,
                state,
                transport,
                opts: options,
            }),
            worker: Mutex::new(None),
        });
        Self { shared }
    }

    /// Sets this node's peer ID. Must be called before start().
    pub fn set_peer_id(&self, id: PeerId) {
        assert_ne!(id, 0, "peer id 0 is reserved");
        self.shared.lock().id = id;
    }

    /// Returns this node's peer ID, or 0 if not yet set.
    pub fn peer_id(&self) -> PeerId {
        self.shared.lock().id
    }

    /// Registers a remote cluster member. Peers are added before start()
    /// and never removed.
    pub fn add_peer(&self, peer_id: PeerId) {
        assert_ne!(peer_id, 0, "peer id 0 is reserved");
        let mut raft = self.shared.lock();
        assert_ne!(peer_id, raft.id, "can't add ourself as a peer");
        raft.peers.insert(peer_id, Peer::new());
    }

    /// Places this node in the Observer role: it votes, replicates, and
    /// applies the log like a follower, but never campaigns for leadership.
    pub fn set_observer(&self) {
        let mut raft = self.shared.lock();
        assert!(
            matches!(raft.role, Role::Joining | Role::Follower),
            "can't become observer while {:?}",
            raft.role
        );
        raft.role = Role::Observer;
    }

    /// Starts the engine: the node becomes a follower (unless it is an
    /// observer), and the periodic worker begins ticking every TICK_INTERVAL
    /// until stop() is called.
    pub fn start(&self) {
        let mut raft = self.shared.lock();
        assert_ne!(raft.id, 0, "peer id must be set before start");
        match raft.role {
            Role::Joining => raft.role = Role::Follower,
            Role::Observer => {}
            role => panic!("can't start while {role:?}"),
        }
        raft.schedule_election();
        drop(raft);

        let shared = self.shared.clone();
        let worker = std::thread::Builder::new()
            .name("raft-engine".into())
            .spawn(move || {
                let ticker = crossbeam::channel::tick(TICK_INTERVAL);
                while ticker.recv().is_ok() {
                    let mut raft = shared.lock();
                    if raft.role == Role::Leaving {
                        break;
                    }
                    if let Err(e) = raft.tick() {
                        error!("Periodic tick failed: {e}");
                    }
                }
            })
            .expect("failed to spawn periodic worker");
        *self.shared.worker.lock().expect("worker mutex poisoned") = Some(worker);
    }

    /// Stops the engine. The role becomes Leaving, which is terminal, and
    /// the periodic worker is joined.
    pub fn stop(&self) {
        self.shared.lock().role = Role::Leaving;
        if let Some(worker) = self.shared.worker.lock().expect("worker mutex poisoned").take() {
            if worker.join().is_err() {
                panic!("periodic worker panicked");
            }
        }
    }

    /// Returns the node's current role.
    pub fn role(&self) -> Role {
        self.shared.lock().role
    }

    /// Returns the node's current term.
    pub fn current_term(&self) -> Term {
        self.shared.lock().term
    }

    /// Returns the last observed leader for the current term, if any. This
    /// is advisory: it may be stale, e.g. while an election is running.
    pub fn leader_id(&self) -> Option<PeerId> {
        self.shared.lock().leader_id
    }

    /// Accesses the log under the engine's lock.
    pub fn with_log<R>(&self, f: impl FnOnce(&mut Log<S::Command>) -> R) -> R {
        f(&mut self.shared.lock().log)
    }

    /// Accesses the state machine under the engine's lock, e.g. for local
    /// reads on the leader.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.lock().state)
    }

    /// Proposes a command for consensus, returning the log index assigned to
    /// it, or None if this node is not the leader (callers redirect via
    /// leader_id()). The command is optimistically applied to the local
    /// state machine before it commits, so local reads on the leader observe
    /// the write while replication is in flight; if leadership is lost, the
    /// state machine is rewound to the commit index.
    pub fn execute_command(&self, command: S::Command) -> Result<Option<Index>> {
        self.shared.lock().execute(command)
    }

    /// Serves an inbound RequestVote RPC. Invoked by the transport.
    pub fn handle_request_vote(&self, request: VoteRequest) -> Result<VoteResponse> {
        self.shared.lock().request_vote(request)
    }

    /// Serves an inbound AppendEntries RPC. Invoked by the transport.
    pub fn handle_append_entries(
        &self,
        request: AppendRequest<S::Command>,
    ) -> Result<AppendResponse> {
        self.shared.lock().append_entries(request)
    }
}

/// The engine state, which lives behind the engine's single mutex.
struct Raft<S: StateMachine> {
    /// A self-reference, captured by outbound RPC response handlers.
    weak: Weak<Shared<S>>,
    /// This node's ID. Must be set (non-zero) before start().
    id: PeerId,
    /// The current role.
    role: Role,
    /// The current term. Never decreases.
    term: Term,
    /// The candidate granted our vote in the current term, if any. At most
    /// one vote is granted per term, and it is never switched.
    voted_for: Option<PeerId>,
    /// The last observed leader for the current term, if any. Advisory.
    leader_id: Option<PeerId>,
    /// The logical clock, advanced by the periodic worker.
    clock: Ticks,
    /// The tick after which a follower or candidate starts an election.
    election_deadline: Ticks,
    /// Votes received in the current candidacy, including our own.
    votes: HashSet<PeerId>,
    /// All other cluster members.
    peers: HashMap<PeerId, Peer>,
    /// The replicated log.
    log: Log<S::Command>,
    /// The state machine we are coordinating.
    state: S,
    /// The outbound RPC transport.
    transport: Box<dyn Transport<S::Command>>,
    opts: Options,
}

impl<S: StateMachine> Raft<S> {
    /// Processes a periodic tick: advances the clock, applies any newly
    /// committed entries, and runs the role's recurring work.
    fn tick(&mut self) -> Result<()> {
        self.clock += 1;
        self.update_state_machine(self.log.commit_index())?;

        match self.role {
            Role::Follower | Role::Candidate => {
                if self.clock > self.election_deadline {
                    self.call_election()?;
                }
            }
            Role::Leader => {
                self.update_commit_index()?;
                self.update_peers()?;
            }
            Role::Joining | Role::Observer | Role::Leaving => {}
        }
        Ok(())
    }

    /// Reschedules the election deadline, with a randomized timeout to avoid
    /// repeated split votes.
    fn schedule_election(&mut self) {
        let random = match self.opts.election_timeout_random {
            0 => 0,
            window => rand::thread_rng().gen_range(0..window),
        };
        self.election_deadline = self.clock + self.opts.election_timeout_fixed + random;
    }

    /// Returns the number of replicas (counting ourself) that form a strict
    /// majority of the cluster.
    fn quorum_size(&self) -> usize {
        (self.peers.len() + 1) / 2 + 1
    }

    /// Campaigns for leadership: becomes a candidate in a new term, votes
    /// for ourself, and solicits votes from all peers.
    fn call_election(&mut self) -> Result<()> {
        self.role = Role::Candidate;
        self.term += 1;
        self.voted_for = Some(self.id);
        self.votes = std::iter::once(self.id).collect();
        info!("Calling election for term {}", self.term);

        let request = VoteRequest {
            term: self.term,
            candidate_id: self.id,
            last_log_index: self.log.last_index(),
            last_log_term: self.log.last_term(),
        };
        for peer_id in self.peers.keys().copied().sorted() {
            let peer = self.peers.get_mut(&peer_id).expect("unknown peer");
            peer.next_index = 1;
            peer.match_index = 0;
            let handler = self.vote_handler(peer_id);
            self.transport.send_request_vote(peer_id, request.clone(), handler);
        }
        self.schedule_election();

        // A single-node cluster wins its election immediately, since there
        // are no responses that would otherwise complete the tally.
        if self.votes.len() >= self.quorum_size() {
            self.become_leader()?;
        }
        Ok(())
    }

    /// Returns a response handler for an outbound vote solicitation.
    fn vote_handler(&self, from: PeerId) -> ResponseHandler<VoteResponse> {
        let shared = self.weak.clone();
        Box::new(move |response| {
            let Some(shared) = shared.upgrade() else { return };
            if let Err(e) = shared.lock().vote_response(from, response) {
                error!("Vote response from {from} failed: {e}");
            };
        })
    }

    /// Processes a vote solicitation response. Votes for other terms or
    /// resolved elections are discarded.
    fn vote_response(&mut self, from: PeerId, response: VoteResponse) -> Result<()> {
        if self.step_down(response.term)? {
            return Ok(());
        }
        if response.term != self.term || self.role != Role::Candidate || !response.granted {
            return Ok(());
        }
        self.votes.insert(from);
        if self.votes.len() >= self.quorum_size() {
            self.become_leader()?;
        }
        Ok(())
    }

    /// Assumes leadership after winning an election: resets replication
    /// progress for all peers and sends them an initial append.
    fn become_leader(&mut self) -> Result<()> {
        assert_eq!(self.role, Role::Candidate, "can only become leader as candidate");
        info!("Won election for term {}, becoming leader", self.term);
        self.role = Role::Leader;
        self.leader_id = Some(self.id);

        let next_index = self.log.last_index() + 1;
        for peer in self.peers.values_mut() {
            peer.next_index = next_index;
            peer.match_index = 0;
            peer.append_pending = false;
        }

        // Propose an empty entry on assuming leadership, so entries from
        // previous terms can commit under the current-term quorum rule. See
        // section 5.4.2 in the Raft paper.
        assert!(self.log.append(self.term, None)?, "noop append failed");
        self.update_commit_index()?;
        self.update_peers()?;
        Ok(())
    }

    /// Steps down on observing a higher term: adopts it as a leaderless
    /// follower with a cleared vote. Any state machine entries applied
    /// optimistically above the commit index are discarded by replaying the
    /// log. Returns true if the term was adopted.
    fn step_down(&mut self, term: Term) -> Result<bool> {
        if term <= self.term {
            return Ok(false);
        }
        self.term = term;
        self.voted_for = None;
        self.leader_id = None;
        if matches!(self.role, Role::Candidate | Role::Leader) {
            info!("Stepping down in term {term}");
            self.role = Role::Follower;
            if self.state.applied_index() > self.log.commit_index() {
                self.state.reset();
                self.update_state_machine(self.log.commit_index())?;
            }
        }
        self.schedule_election();
        Ok(true)
    }

    /// Computes the highest log index replicated to a quorum and advances
    /// the commit index to it. Only indexes from the current term can move
    /// the commit index (see figure 8 in the Raft paper); earlier entries
    /// commit implicitly when a later current-term entry does.
    fn update_commit_index(&mut self) -> Result<()> {
        debug_assert_eq!(self.role, Role::Leader);
        let mut index = self.peers.values().fold(self.log.last_index(), |i, p| i.min(p.match_index));
        index = index.max(self.log.commit_index());
        while index <= self.log.last_index() && self.is_committable(index) {
            if index > 0 && self.log.term_at(index)? == self.term {
                self.log.set_commit_index(index);
            }
            index += 1;
        }
        Ok(())
    }

    /// Checks whether a quorum of the cluster (counting ourself) has
    /// replicated the given index.
    fn is_committable(&self, index: Index) -> bool {
        let replicas = 1 + self.peers.values().filter(|p| p.match_index >= index).count();
        replicas >= self.quorum_size()
    }

    /// Dispatches appends or heartbeats to all peers, as appropriate.
    fn update_peers(&mut self) -> Result<()> {
        debug_assert_eq!(self.role, Role::Leader);
        for peer_id in self.peers.keys().copied().sorted() {
            self.update_peer(peer_id)?;
        }
        Ok(())
    }

    /// Dispatches a single append to a peer if it has pending entries or a
    /// heartbeat is due, and no append is already in flight. Sending records
    /// the in-flight state, so responses arrive in send order per peer.
    fn update_peer(&mut self, peer_id: PeerId) -> Result<()> {
        let last_index = self.log.last_index();
        let commit_index = self.log.commit_index();

        let Some(peer) = self.peers.get_mut(&peer_id) else { return Ok(()) };
        if peer.append_pending && self.clock >= peer.last_append + self.opts.append_timeout {
            // The response was presumably lost in transit; re-arm dispatch.
            // If it still arrives after the next send, its stale sequence
            // number gets it discarded.
            debug!("Append to {peer_id} timed out, re-arming");
            peer.append_pending = false;
        }
        if peer.append_pending {
            return Ok(());
        }
        if peer.next_index > last_index
            && self.clock < peer.last_append + self.opts.heartbeat_interval
        {
            return Ok(());
        }
        assert!(peer.next_index >= 1, "next_index 0 for peer {peer_id}");
        peer.append_pending = true;
        peer.last_append = self.clock;
        peer.seq += 1;
        let seq = peer.seq;
        let next_index = peer.next_index;

        let prev_log_index = next_index - 1;
        let prev_log_term = self.log.term_at(prev_log_index)?;
        let entries = self.log.entries_from(next_index, self.opts.max_entries_per_request)?;
        let last_sent = entries.last().map(|e| e.index);
        debug!("Sending {} entries to {peer_id} with base {prev_log_index}", entries.len());

        let request = AppendRequest {
            term: self.term,
            leader_id: self.id,
            prev_log_index,
            prev_log_term,
            entries,
            leader_commit: commit_index,
        };
        let handler = self.append_handler(peer_id, seq, self.term, last_sent);
        self.transport.send_append_entries(peer_id, request, handler);
        Ok(())
    }

    /// Returns a response handler for an outbound append, remembering the
    /// dispatch sequence number, the term it was sent in, and the last entry
    /// index it carried (None for a heartbeat).
    fn append_handler(
        &self,
        peer_id: PeerId,
        seq: u64,
        sent_term: Term,
        last_sent: Option<Index>,
    ) -> ResponseHandler<AppendResponse> {
        let shared = self.weak.clone();
        Box::new(move |response| {
            let Some(shared) = shared.upgrade() else { return };
            let result = shared.lock().append_response(peer_id, seq, sent_term, last_sent, response);
            if let Err(e) = result {
                error!("Append response from {peer_id} failed: {e}");
            }
        })
    }

    /// Processes an append response: advances the peer's replication
    /// progress on success and keeps feeding it, or rewinds next_index on
    /// rejection to converge on the first matching index.
    fn append_response(
        &mut self,
        peer_id: PeerId,
        seq: u64,
        sent_term: Term,
        last_sent: Option<Index>,
        response: AppendResponse,
    ) -> Result<()> {
        let Some(peer) = self.peers.get_mut(&peer_id) else { return Ok(()) };
        // A response to a superseded append (one presumed lost, where the
        // append timeout already re-armed dispatch) must not clear the
        // current request's in-flight status or trigger another dispatch:
        // only one append is outstanding per peer.
        if seq != peer.seq {
            debug!("Discarding late append response from {peer_id}");
            return Ok(());
        }
        peer.append_pending = false;
        if self.role != Role::Leader {
            return Ok(());
        }
        if self.step_down(response.term)? {
            return Ok(());
        }
        // Responses to appends from a previous leadership say nothing about
        // this term's replication progress.
        if sent_term != self.term {
            return Ok(());
        }

        if response.success {
            if let Some(last) = last_sent {
                let peer = self.peers.get_mut(&peer_id).expect("unknown peer");
                debug_assert!(last >= peer.match_index, "match index regression");
                peer.match_index = last;
                peer.next_index = last + 1;
            }
            // Keep feeding the peer without waiting for the next tick.
            self.update_peer(peer_id)?;
        } else {
            let peer = self.peers.get_mut(&peer_id).expect("unknown peer");
            // Jump to the peer's last log index if we're beyond it, otherwise
            // walk back one entry, but never below 1.
            if peer.next_index > response.last_log_index {
                peer.next_index = response.last_log_index.max(1);
            } else if peer.next_index > 1 {
                peer.next_index -= 1;
            }
        }
        Ok(())
    }

    /// Applies log entries in order until the state machine reaches the
    /// target index. Commands cannot fail; a missing entry is a fatal bug.
    fn update_state_machine(&mut self, target: Index) -> Result<()> {
        while self.state.applied_index() < target {
            let index = self.state.applied_index() + 1;
            let entry = match self.log.entry(index)? {
                Some(entry) => entry,
                None => panic!("entry {index} missing from log"),
            };
            debug!("Applying entry {}@{}", entry.index, entry.term);
            if let Some(command) = &entry.command {
                command.apply_to(&mut self.state);
            }
            self.state.apply(entry.index, entry.term);
        }
        Ok(())
    }

    /// Proposes a command, if we are the leader. See
    /// [`Engine::execute_command`].
    fn execute(&mut self, command: S::Command) -> Result<Option<Index>> {
        if self.role != Role::Leader {
            debug!("Ignoring command proposal while {:?}", self.role);
            return Ok(None);
        }
        if !self.log.append(self.term, Some(command))? {
            return Ok(None);
        }
        let index = self.log.last_index();
        // Optimistic apply: local reads see the write while replication is
        // in flight. step_down() rewinds this if leadership is lost.
        self.update_state_machine(index)?;
        Ok(Some(index))
    }

    /// Serves a RequestVote RPC. The vote is granted iff the candidate's
    /// term is current, we haven't voted for anyone else in it, and the
    /// candidate's log is at least as up-to-date as ours.
    fn request_vote(&mut self, request: VoteRequest) -> Result<VoteResponse> {
        if request.term > self.term {
            self.step_down(request.term)?;
        }
        let granted = request.term >= self.term
            && self.voted_for.map_or(true, |vote| vote == request.candidate_id)
            && request.last_log_index >= self.log.last_index()
            && request.last_log_term >= self.log.last_term();
        if granted {
            info!("Voting for {} in term {} election", request.candidate_id, self.term);
            self.voted_for = Some(request.candidate_id);
            self.schedule_election();
        }
        Ok(VoteResponse { term: self.term, granted })
    }

    /// Serves an AppendEntries RPC: appends the leader's entries if our log
    /// is consistent with the request's base entry, and advances the commit
    /// index. Rejections return our last log index, which bounds the
    /// leader's rewind.
    fn append_entries(
        &mut self,
        request: AppendRequest<S::Command>,
    ) -> Result<AppendResponse> {
        if request.term < self.term {
            debug!(
                "Rejecting append from {} in stale term {}",
                request.leader_id, request.term
            );
            return self.append_rejection();
        }
        if request.term > self.term {
            self.step_down(request.term)?;
        }
        // Valid leader contact: hold off on elections.
        self.schedule_election();
        if self.leader_id != Some(request.leader_id) {
            self.leader_id = Some(request.leader_id);
            info!("Following leader {} in term {}", request.leader_id, self.term);
        }

        if !self.log.is_consistent_with(request.prev_log_index, request.prev_log_term)? {
            debug!(
                "Rejecting append from {}: log is inconsistent with {}@{}",
                request.leader_id, request.prev_log_index, request.prev_log_term
            );
            return self.append_rejection();
        }
        for entry in request.entries {
            let index = entry.index;
            if !self.log.append_entry(entry)? {
                warn!("Failing append from {}: can't append entry {index}", request.leader_id);
                return self.append_rejection();
            }
        }

        let commit_index = request.leader_commit.min(self.log.last_index());
        self.log.set_commit_index(commit_index);
        Ok(AppendResponse { term: self.term, success: true, last_log_index: self.log.last_index() })
    }

    /// Returns an append rejection with our last log index.
    fn append_rejection(&self) -> Result<AppendResponse> {
        Ok(AppendResponse { term: self.term, success: false, last_log_index: self.log.last_index() })
    }
}
