//! Event and action types for the engine's single-writer loop.
//!
//! Events are **passive data** describing something that happened; the
//! dispatcher state machine processes them and returns actions. Actions are
//! **commands** the runner executes: spawning a transport worker or
//! completing a one-shot channel.

use snowfall_consensus::QueryKey;
use snowfall_messages::{PollRequest, PollResponse};
use snowfall_types::{BlockId, PeerId, Status};
use tokio::sync::oneshot;

/// All inputs to the dispatcher.
#[derive(Debug)]
pub enum Event {
    /// Poll scheduler tick (1 ms cadence).
    PollTick,

    /// External submission of a new candidate.
    ///
    /// `callback` receives exactly one terminal [`Status`] when the record
    /// finalizes; it is dropped unanswered if the candidate is already
    /// tracked or gets garbage collected.
    NewBlock {
        id: BlockId,
        preference: bool,
        callback: oneshot::Sender<Status>,
    },

    /// A query arrived on an inbound peer stream.
    InboundQuery {
        request: PollRequest,
        reply: oneshot::Sender<PollResponse>,
    },

    /// A peer answered one of our queries.
    VotesReceived {
        peer: PeerId,
        response: PollResponse,
    },

    /// An outstanding query failed or timed out.
    RequestExpired { key: QueryKey },
}

impl Event {
    /// Event type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::PollTick => "PollTick",
            Event::NewBlock { .. } => "NewBlock",
            Event::InboundQuery { .. } => "InboundQuery",
            Event::VotesReceived { .. } => "VotesReceived",
            Event::RequestExpired { .. } => "RequestExpired",
        }
    }
}

/// All outputs of the dispatcher.
#[derive(Debug)]
pub enum Action {
    /// Dispatch a query to a peer on a detached worker.
    ///
    /// The worker reports back with [`Event::VotesReceived`] on success or
    /// [`Event::RequestExpired`] on failure.
    SendQuery { peer: PeerId, request: PollRequest },

    /// Answer an inbound query.
    Respond {
        reply: oneshot::Sender<PollResponse>,
        response: PollResponse,
    },

    /// Deliver a terminal verdict to the submitter.
    DeliverVerdict {
        id: BlockId,
        status: Status,
        callback: oneshot::Sender<Status>,
    },
}

impl Action {
    /// Action type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::SendQuery { .. } => "SendQuery",
            Action::Respond { .. } => "Respond",
            Action::DeliverVerdict { .. } => "DeliverVerdict",
        }
    }
}
