//! The consensus engine runner and its control surface.

use crate::{metrics, Action, EngineError, EngineState, Event, PeerTransport, WeightedChooser};
use rand::{rngs::StdRng, SeedableRng};
use snowfall_consensus::{ConsensusConfig, QueryKey};
use snowfall_types::{BlockId, Status};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Capacity of the bounded event channel. When full, senders (stream
/// handlers, query workers) block, which naturally rate-limits peers.
const EVENT_CHANNEL_CAPACITY: usize = 10_000;

/// Cadence of the metrics gauge refresh.
const METRICS_INTERVAL: Duration = Duration::from_secs(1);

/// An avalanche consensus engine, ready to be started.
///
/// The engine needs two collaborators: a [`PeerTransport`] that can deliver
/// a query to a peer and return its response, and a [`WeightedChooser`] that
/// samples validators by stake. Candidate validation, download, and ledger
/// application all live elsewhere; the engine is only told that a candidate
/// exists and asked for a verdict.
///
/// # Example
///
/// ```no_run
/// # use snowfall_engine::{ConsensusEngine, PeerTransport, WeightedChooser};
/// # use snowfall_consensus::ConsensusConfig;
/// # use snowfall_types::BlockId;
/// # use std::sync::Arc;
/// # async fn example(
/// #     transport: Arc<dyn PeerTransport>,
/// #     chooser: Arc<dyn WeightedChooser>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let engine = ConsensusEngine::new(ConsensusConfig::default(), transport, chooser);
/// let handle = engine.start();
///
/// let (verdict_tx, verdict_rx) = tokio::sync::oneshot::channel();
/// handle.new_block(BlockId::new([0x11; 32]), true, verdict_tx).await?;
/// let verdict = verdict_rx.await?;
/// println!("candidate resolved: {verdict}");
///
/// handle.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct ConsensusEngine {
    config: ConsensusConfig,
    transport: Arc<dyn PeerTransport>,
    chooser: Arc<dyn WeightedChooser>,
}

impl ConsensusEngine {
    /// Create an engine with the given collaborators.
    pub fn new(
        config: ConsensusConfig,
        transport: Arc<dyn PeerTransport>,
        chooser: Arc<dyn WeightedChooser>,
    ) -> Self {
        Self {
            config,
            transport,
            chooser,
        }
    }

    /// Spawn the event loop and return its control handle.
    pub fn start(self) -> EngineHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let poll_interval = self.config.poll_interval;
        let state = EngineState::new(self.config, self.chooser, StdRng::from_entropy());

        let event_loop = EngineLoop {
            state,
            transport: self.transport,
            event_rx,
            event_tx: event_tx.clone(),
            shutdown_rx,
            poll_interval,
            start_time: Instant::now(),
        };
        let join = tokio::spawn(event_loop.run());

        EngineHandle {
            event_tx,
            shutdown_tx: Some(shutdown_tx),
            join,
        }
    }
}

/// Handle to a running engine.
pub struct EngineHandle {
    event_tx: mpsc::Sender<Event>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl EngineHandle {
    /// Submit a candidate for consensus.
    ///
    /// Fire-and-forget: `callback` receives exactly one terminal [`Status`]
    /// when the record finalizes. It is dropped unanswered if the candidate
    /// is already tracked, gets garbage collected, or the engine stops
    /// first.
    pub async fn new_block(
        &self,
        id: BlockId,
        preference: bool,
        callback: oneshot::Sender<Status>,
    ) -> Result<(), EngineError> {
        self.event_tx
            .send(Event::NewBlock {
                id,
                preference,
                callback,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Clone the event sender, for wiring stream handlers by hand.
    pub fn event_sender(&self) -> mpsc::Sender<Event> {
        self.event_tx.clone()
    }

    /// Serve one inbound peer stream on a detached task.
    ///
    /// The network layer calls this once per accepted consensus-protocol
    /// stream; the task runs until the stream closes or errors.
    pub fn serve_stream<S>(&self, stream: S) -> JoinHandle<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = crate::stream::handle_stream(stream, event_tx).await {
                debug!(error = %err, "inbound consensus stream closed");
            }
        })
    }

    /// Signal shutdown and wait for the event loop to drain.
    ///
    /// Callbacks still outstanding when the loop exits are dropped
    /// unanswered.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// The single task owning [`EngineState`].
struct EngineLoop {
    state: EngineState,
    transport: Arc<dyn PeerTransport>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    shutdown_rx: oneshot::Receiver<()>,
    poll_interval: Duration,
    start_time: Instant,
}

impl EngineLoop {
    async fn run(mut self) {
        let mut poll_tick = tokio::time::interval(self.poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut metrics_tick = tokio::time::interval(METRICS_INTERVAL);
        metrics_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("consensus engine started");
        loop {
            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    info!("consensus engine shutting down");
                    break;
                }

                maybe_event = self.event_rx.recv() => {
                    // The loop holds a sender clone, so the channel cannot
                    // close from under us; handle it anyway.
                    let Some(event) = maybe_event else { break };
                    self.state.set_time(self.start_time.elapsed());
                    let actions = self.state.handle(event);
                    self.process_actions(actions);
                }

                _ = poll_tick.tick() => {
                    self.state.set_time(self.start_time.elapsed());
                    let actions = self.state.handle(Event::PollTick);
                    self.process_actions(actions);
                }

                _ = metrics_tick.tick() => {
                    let m = metrics::global();
                    m.records_active.set(self.state.active_record_count() as f64);
                    m.queries_outstanding.set(self.state.outstanding_queries() as f64);
                }
            }
        }
        info!("consensus engine stopped");
    }

    fn process_actions(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::SendQuery { peer, request } => {
                    metrics::global().queries_sent.inc();
                    let transport = self.transport.clone();
                    let event_tx = self.event_tx.clone();
                    // Detached worker per in-flight query; results come back
                    // as events.
                    tokio::spawn(async move {
                        let key = QueryKey::new(request.request_id, peer.clone());
                        match transport.send_request(&peer, request).await {
                            Ok(response) => {
                                let _ = event_tx.send(Event::VotesReceived { peer, response }).await;
                            }
                            Err(err) => {
                                debug!(peer = %key.peer, error = %err, "poll query failed");
                                metrics::global().queries_expired.inc();
                                let _ = event_tx.send(Event::RequestExpired { key }).await;
                            }
                        }
                    });
                }

                // One-shot sends never block, so completing them inline
                // cannot stall the loop even with a slow consumer.
                Action::Respond { reply, response } => {
                    let _ = reply.send(response);
                }

                Action::DeliverVerdict {
                    id,
                    status,
                    callback,
                } => {
                    debug!(block = %id, %status, "delivering verdict");
                    metrics::record_verdict(status);
                    let _ = callback.send(status);
                }
            }
        }
    }
}
