//! Server-Sent Events plumbing for run event streams.
//!
//! The relay runs on its own task and writes frames into a bounded channel;
//! the response body drains the channel. Dropping the body (client
//! disconnect) cancels the relay through a [`DropGuard`].

use std::convert::Infallible;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, header};
use axum::response::Response;
use bytes::Bytes;
use cigate_core::{EventSink, GatewayPort};
use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::Instrument;

/// Frames buffered between the relay and a slow client.
const FRAME_BUFFER: usize = 64;

/// [`EventSink`] that forwards frames to a response body.
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelSink {
    pub const fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.tx
            .send(Bytes::copy_from_slice(frame))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "event stream client disconnected"))
    }
}

pub fn connected_frame(request_id: &str) -> String {
    format!(
        "event: connected\ndata: {}\n\n",
        json!({ "request_id": request_id })
    )
}

pub fn error_frame(request_id: &str) -> String {
    format!(
        "event: error\ndata: {}\n\n",
        json!({ "message": "stream error", "request_id": request_id })
    )
}

/// Start relaying `run_id` and return the streaming response.
pub fn stream_run(gateway: Arc<dyn GatewayPort>, run_id: String, request_id: String) -> Response {
    let (tx, rx) = mpsc::channel(FRAME_BUFFER);
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    tokio::spawn(
        relay(gateway, run_id, request_id, ChannelSink::new(tx), cancel)
            .instrument(tracing::Span::current()),
    );

    let frames = ReceiverStream::new(rx).map(move |frame| {
        let _: &DropGuard = &guard;
        Ok::<_, Infallible>(frame)
    });

    let mut response = Response::new(Body::from_stream(frames));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}

async fn relay(
    gateway: Arc<dyn GatewayPort>,
    run_id: String,
    request_id: String,
    mut sink: ChannelSink,
    cancel: CancellationToken,
) {
    if sink
        .write_frame(connected_frame(&request_id).as_bytes())
        .await
        .is_err()
    {
        return;
    }
    tracing::info!(run_id = %run_id, "Event stream opened");

    match gateway.stream_run_events(&run_id, &mut sink, &cancel).await {
        Ok(()) if cancel.is_cancelled() => tracing::info!(run_id = %run_id, "Event stream client disconnected"),
        Ok(()) => tracing::info!(run_id = %run_id, "Event stream completed"),
        Err(e) => {
            tracing::warn!(run_id = %run_id, error = %e, "Event stream failed");
            // Best effort: the client may already be gone.
            let _ = sink.write_frame(error_frame(&request_id).as_bytes()).await;
        }
    }
}
