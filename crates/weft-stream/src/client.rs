use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use weft_types::StreamEvent;

use crate::decode::decode_frame;
use crate::error::{Result, StreamError};
use crate::frame::FrameBuffer;

/// A cancelable, typed, ordered sequence of backend events
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Open an SSE connection: POST the request body and expose the response as
/// a typed event stream.
///
/// Non-2xx responses fail here, before any event is yielded; failures after
/// the stream is established surface as a synthetic `error` event instead.
pub async fn connect(
    client: &reqwest::Client,
    url: &str,
    body: &impl Serialize,
    token: CancellationToken,
) -> Result<EventStream> {
    let response = client
        .post(url)
        .header("Accept", "text/event-stream")
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(StreamError::Status { code: status.as_u16() });
    }

    Ok(event_stream(response.bytes_stream(), token))
}

/// Turn a raw byte stream into a typed event stream.
///
/// Contract:
/// - events are yielded in exact transport order, never reordered;
/// - cancelling the token stops the underlying read and ends the sequence
///   cleanly (no error reaches the consumer);
/// - a transport-level failure yields one synthetic `error` event and ends
///   the sequence, so callers always finish their read loop and clean up;
/// - malformed frames are dropped with a warning and the stream continues.
pub fn event_stream<S, E>(bytes: S, token: CancellationToken) -> EventStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send,
{
    Box::pin(async_stream::stream! {
        let mut chunks = Box::pin(bytes);
        let mut buffer = FrameBuffer::with_capacity(8192);
        let mut ended_early = false;

        loop {
            let chunk_result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!("Event stream cancelled");
                    ended_early = true;
                    break;
                }
                next = chunks.next() => next,
            };

            match chunk_result {
                Some(Ok(chunk)) => {
                    buffer.extend(&chunk);
                    while let Some(frame) = buffer.next_frame() {
                        if let Some(event) = decode_frame(&frame) {
                            yield event;
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("Event stream transport failure: {}", e);
                    yield StreamEvent::transport_error(e.to_string());
                    ended_early = true;
                    break;
                }
                None => break,
            }
        }

        // Stream drained to its natural end; a trailing frame without its
        // blank-line terminator is still worth delivering
        if !ended_early {
            if let Some(frame) = buffer.flush() {
                if let Some(event) = decode_frame(&frame) {
                    yield event;
                }
            }
        }
    })
}
