//! Engine error types.

use snowfall_messages::CodecError;
use thiserror::Error;

/// Errors surfaced by a [`PeerTransport`](crate::PeerTransport).
///
/// The engine treats every variant the same way: the query expires and the
/// next scheduler tick re-polls. Variants exist for logging.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("peer unreachable: {0}")]
    Unreachable(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Errors from the engine control surface.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine event channel closed")]
    ChannelClosed,

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
