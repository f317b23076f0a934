//! Dispatcher state: the single writer over all engine tables.

use crate::{Action, Event, WeightedChooser};
use rand::{rngs::StdRng, Rng};
use snowfall_consensus::{ConsensusConfig, QueryKey, RequestRecord, VoteRecord};
use snowfall_messages::{PollRequest, PollResponse};
use snowfall_types::{BlockId, PeerId, Status, Vote};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// The engine's mutable state.
///
/// Owned by the event-loop task; no other task reads or writes the tables.
/// Handlers are synchronous and never suspend, so a single candidate's vote
/// accumulation is linearizable by construction.
///
/// Time is an injected duration since engine start ([`set_time`]); the state
/// machine never reads the wall clock, which keeps it deterministic under
/// test.
///
/// [`set_time`]: EngineState::set_time
pub struct EngineState {
    config: ConsensusConfig,
    chooser: Arc<dyn WeightedChooser>,
    rng: StdRng,
    now: Duration,

    /// Active and finalized candidates. Finalized records linger to answer
    /// ongoing queries until the GC horizon passes.
    vote_records: HashMap<BlockId, VoteRecord>,

    /// Memoized rejections, keyed to the original record's creation time so
    /// the same GC horizon applies.
    rejected_blocks: HashMap<BlockId, Duration>,

    /// Outstanding queries by (request id, peer).
    queries: HashMap<QueryKey, RequestRecord>,

    /// Pending verdict sinks, one per tracked candidate.
    callbacks: HashMap<BlockId, oneshot::Sender<Status>>,
}

impl EngineState {
    /// Create the dispatcher state.
    ///
    /// `rng` supplies request ids; production seeds it from entropy, tests
    /// from a fixed seed.
    pub fn new(config: ConsensusConfig, chooser: Arc<dyn WeightedChooser>, rng: StdRng) -> Self {
        Self {
            config,
            chooser,
            rng,
            now: Duration::ZERO,
            vote_records: HashMap::new(),
            rejected_blocks: HashMap::new(),
            queries: HashMap::new(),
            callbacks: HashMap::new(),
        }
    }

    /// Inject the current engine-relative time. The runner calls this before
    /// every `handle`.
    pub fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    /// Process one event, returning the actions for the runner to execute.
    pub fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::PollTick => self.on_poll_tick(),
            Event::NewBlock {
                id,
                preference,
                callback,
            } => self.on_new_block(id, preference, callback),
            Event::InboundQuery { request, reply } => self.on_inbound_query(request, reply),
            Event::VotesReceived { peer, response } => self.on_votes_received(peer, response),
            Event::RequestExpired { key } => self.on_request_expired(key),
        }
    }

    // === Handlers ===

    fn on_new_block(
        &mut self,
        id: BlockId,
        preference: bool,
        callback: oneshot::Sender<Status>,
    ) -> Vec<Action> {
        if self.vote_records.contains_key(&id) || self.rejected_blocks.contains_key(&id) {
            // Idempotent: the duplicate's callback is dropped unanswered.
            debug!(block = %id, "ignoring duplicate candidate submission");
            return Vec::new();
        }

        self.vote_records
            .insert(id, VoteRecord::new(id, preference, self.now));
        self.callbacks.insert(id, callback);
        debug!(block = %id, preference, "tracking new candidate");
        Vec::new()
    }

    fn on_inbound_query(
        &mut self,
        request: PollRequest,
        reply: oneshot::Sender<PollResponse>,
    ) -> Vec<Action> {
        let mut votes = Vec::with_capacity(request.inventory.len());
        for id in &request.inventory {
            let vote = if self.rejected_blocks.contains_key(id) {
                Vote::No
            } else if let Some(record) = self.vote_records.get(id) {
                // We only vote yes for candidates we have a record for and
                // currently prefer.
                if record.is_preferred() {
                    Vote::Yes
                } else {
                    Vote::No
                }
            } else {
                // Unknown candidate; fetching it is not this layer's job.
                Vote::Neutral
            };
            votes.push(vote.as_byte());
        }

        let response = PollResponse::new(request.request_id, votes);
        vec![Action::Respond { reply, response }]
    }

    fn on_votes_received(&mut self, peer: PeerId, response: PollResponse) -> Vec<Action> {
        let key = QueryKey::new(response.request_id, peer);
        let Some(record) = self.queries.remove(&key) else {
            debug!(peer = %key.peer, request_id = key.request_id, "response for unknown query");
            return Vec::new();
        };

        if record.is_expired(self.now) {
            debug!(peer = %key.peer, request_id = key.request_id, "response for expired query");
            return Vec::new();
        }

        if response.votes.len() != record.inventory().len() {
            debug!(
                peer = %key.peer,
                votes = response.votes.len(),
                inventory = record.inventory().len(),
                "response vote count does not match inventory"
            );
            return Vec::new();
        }

        let mut actions = Vec::new();
        for (id, vote_byte) in record.into_inventory().into_iter().zip(response.votes) {
            let mut terminal = None;
            if let Some(vr) = self.vote_records.get_mut(&id) {
                vr.end_request();
                if !vr.is_finalized() {
                    let changed =
                        vr.register_vote(Vote::from_byte(vote_byte), self.config.finalization_score);
                    if !changed {
                        trace!(block = %id, "vote carried no new information");
                    }
                    if vr.is_finalized() {
                        terminal = Some((vr.status(), vr.created_at()));
                    }
                }
            }

            let Some((status, created_at)) = terminal else {
                continue;
            };

            debug!(block = %id, %status, "candidate reached terminal verdict");
            if let Some(callback) = self.callbacks.remove(&id) {
                actions.push(Action::DeliverVerdict {
                    id,
                    status,
                    callback,
                });
            }
            if status == Status::Rejected {
                // Memoize the rejection so resubmission stays a no-op and
                // inbound queries keep answering no.
                self.vote_records.remove(&id);
                self.rejected_blocks.insert(id, created_at);
            }
        }
        actions
    }

    fn on_request_expired(&mut self, key: QueryKey) -> Vec<Action> {
        let Some(record) = self.queries.remove(&key) else {
            return Vec::new();
        };
        debug!(peer = %key.peer, request_id = key.request_id, "query expired");
        for id in record.inventory() {
            if let Some(vr) = self.vote_records.get_mut(id) {
                vr.end_request();
            }
        }
        Vec::new()
    }

    fn on_poll_tick(&mut self) -> Vec<Action> {
        self.collect_stale_rejections();
        let inventory = self.collect_poll_inventory();
        if inventory.is_empty() {
            return Vec::new();
        }

        let Some(peer) = self.chooser.weighted_random_validator() else {
            // In-flight counts already taken stay taken: the same records
            // are reconsidered next tick and the overshoot is bounded by
            // the per-candidate cap.
            trace!("no validator available to poll");
            return Vec::new();
        };

        let request_id: u32 = self.rng.gen();
        let key = QueryKey::new(request_id, peer.clone());
        if self.queries.contains_key(&key) {
            debug!(request_id, peer = %peer, "request id collision, skipping tick");
            return Vec::new();
        }

        self.queries.insert(
            key,
            RequestRecord::new(inventory.clone(), self.now, self.config.request_timeout),
        );
        vec![Action::SendQuery {
            peer,
            request: PollRequest::new(request_id, inventory),
        }]
    }

    // === Poll batch assembly ===

    /// Walk the vote records, taking an in-flight slot on every pollable
    /// candidate up to the per-query cap, and garbage-collect records past
    /// the inventory horizon.
    fn collect_poll_inventory(&mut self) -> Vec<BlockId> {
        let mut inventory = Vec::new();
        let mut stale = Vec::new();

        for (id, vr) in self.vote_records.iter_mut() {
            if self.now.saturating_sub(vr.created_at()) > self.config.delete_inventory_after {
                stale.push(*id);
                continue;
            }
            if vr.is_finalized() {
                continue;
            }
            if vr.inflight() >= self.config.max_inflight_poll {
                continue;
            }
            if inventory.len() >= self.config.max_element_poll {
                continue;
            }
            vr.begin_request();
            inventory.push(*id);
        }

        for id in stale {
            debug!(block = %id, "garbage collecting stale candidate");
            self.vote_records.remove(&id);
            // Dropping the sink closes the submitter's channel without a
            // verdict ever firing.
            self.callbacks.remove(&id);
        }

        inventory
    }

    fn collect_stale_rejections(&mut self) {
        let horizon = self.config.delete_inventory_after;
        let now = self.now;
        self.rejected_blocks
            .retain(|_, created_at| now.saturating_sub(*created_at) <= horizon);
    }

    // === Introspection ===

    /// Look up a candidate's vote record.
    pub fn record(&self, id: &BlockId) -> Option<&VoteRecord> {
        self.vote_records.get(id)
    }

    /// Whether a candidate is memoized as rejected.
    pub fn is_rejected(&self, id: &BlockId) -> bool {
        self.rejected_blocks.contains_key(id)
    }

    /// Number of tracked (active or finalized) candidates.
    pub fn record_count(&self) -> usize {
        self.vote_records.len()
    }

    /// Number of candidates still being voted on.
    pub fn active_record_count(&self) -> usize {
        self.vote_records
            .values()
            .filter(|vr| !vr.is_finalized())
            .count()
    }

    /// Number of outstanding queries.
    pub fn outstanding_queries(&self) -> usize {
        self.queries.len()
    }
}
