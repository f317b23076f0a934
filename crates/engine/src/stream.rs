//! Inbound query stream handling.

use crate::{EngineError, Event};
use snowfall_messages::codec::{decode_request, read_frame, write_response, MAX_REQUEST_FRAME};
use snowfall_messages::CodecError;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// Serve one inbound peer stream until it closes or errors.
///
/// Each length-delimited query is answered inline before the next is read:
/// decode, hand the dispatcher an [`Event::InboundQuery`] with a fresh reply
/// channel, await the reply, write it back. A query that decodes but cannot
/// be framed out again, or any frame-level error, abandons the stream;
/// malformed bodies are dropped and the stream continues.
///
/// The bounded event channel provides backpressure: a peer flooding queries
/// ends up waiting on its own stream.
pub async fn handle_stream<S>(mut stream: S, event_tx: mpsc::Sender<Event>) -> Result<(), EngineError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let body = match read_frame(&mut stream, MAX_REQUEST_FRAME).await {
            Ok(body) => body,
            Err(CodecError::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                trace!("peer closed consensus stream");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let request = match decode_request(&body) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "dropping malformed query");
                continue;
            }
        };

        crate::metrics::global().inbound_queries.inc();

        let (reply_tx, reply_rx) = oneshot::channel();
        event_tx
            .send(Event::InboundQuery {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;

        // The dispatcher drops the reply channel only when shutting down.
        let Ok(response) = reply_rx.await else {
            return Ok(());
        };

        write_response(&mut stream, &response).await?;
    }
}
