//! Build event relay.
//!
//! Concourse streams build events as SSE. The relay re-frames each payload
//! as a plain `data: <payload>\n\n` frame, drops SSE bookkeeping fields and
//! skips lines it cannot interpret.

use cigate_core::EventSink;
use serde::de::IgnoredAny;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ConcourseError, ConcourseResult};
use crate::http::ByteStream;

/// SSE fields that carry no payload.
const IGNORED_FIELDS: [&str; 3] = ["id", "event", "retry"];

/// Transform one raw line into an outgoing frame.
///
/// `Ok(None)` means the line carries nothing to forward; `Err` means it is
/// malformed and should be skipped.
pub fn transform_line(raw: &[u8]) -> Result<Option<String>, &'static str> {
    let line = std::str::from_utf8(raw).map_err(|_| "invalid UTF-8")?;
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() || line.starts_with(':') {
        return Ok(None);
    }

    if let Some((field, value)) = line.split_once(':') {
        if field == "data" {
            let payload = value.strip_prefix(' ').unwrap_or(value);
            if payload.is_empty() {
                return Ok(None);
            }
            return Ok(Some(frame(payload)));
        }
        if IGNORED_FIELDS.contains(&field) {
            return Ok(None);
        }
    }

    serde_json::from_str::<IgnoredAny>(line).map_err(|_| "neither an SSE field nor JSON")?;
    Ok(Some(frame(line)))
}

fn frame(payload: &str) -> String {
    format!("data: {payload}\n\n")
}

/// Copy `body` line by line into `sink` until the body ends or `cancel`
/// fires. Every frame is flushed as soon as it is written.
pub async fn relay(
    body: ByteStream,
    sink: &mut dyn EventSink,
    cancel: &CancellationToken,
) -> ConcourseResult<()> {
    let mut lines = StreamReader::new(body).split(b'\n');
    let mut forwarded = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(forwarded, "Event relay cancelled");
                return Ok(());
            }
            next = lines.next_segment() => next,
        };

        let Some(line) = next.map_err(|e| ConcourseError::Connection {
            message: format!("event stream interrupted: {e}"),
        })?
        else {
            debug!(forwarded, "Event stream closed by Concourse");
            return Ok(());
        };

        match transform_line(&line) {
            Ok(Some(frame)) => {
                sink.write_frame(frame.as_bytes())
                    .await
                    .map_err(ConcourseError::Sink)?;
                sink.flush().await.map_err(ConcourseError::Sink)?;
                forwarded += 1;
            }
            Ok(None) => {}
            Err(reason) => debug!(reason, "Skipping malformed event line"),
        }
    }
}
