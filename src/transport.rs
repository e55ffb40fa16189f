use crate::engine::PeerId;
use crate::message::{AppendRequest, AppendResponse, VoteRequest, VoteResponse};

/// A response callback for an outbound RPC. Invoked at most once, when the
/// peer's response arrives.
pub type ResponseHandler<R> = Box<dyn FnOnce(R) + Send>;

/// An RPC transport for communication with peers. Sends are non-blocking
/// and fire-and-forget: delivery failures are swallowed, and the response
/// handler is simply dropped if no response arrives. Convergence then relies
/// on the engine's heartbeat and retry cadence.
///
/// Handlers must be invoked asynchronously, after the send returns: the
/// engine sends while holding its internal lock, which the handler also
/// acquires, so invoking a handler from within a send deadlocks.
pub trait Transport<C>: Send {
    /// Sends a RequestVote RPC to the given peer.
    fn send_request_vote(
        &self,
        to: PeerId,
        request: VoteRequest,
        handler: ResponseHandler<VoteResponse>,
    );

    /// Sends an AppendEntries RPC to the given peer.
    fn send_append_entries(
        &self,
        to: PeerId,
        request: AppendRequest<C>,
        handler: ResponseHandler<AppendResponse>,
    );
}
