//! Server-sent event decoding shared by the streaming clients.

use std::pin::Pin;

use async_stream::stream;
use futures::{Stream, StreamExt};

use super::AiError;

/// Incremental text produced by a streaming completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, AiError>> + Send>>;

/// What one SSE `data:` payload means to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum SseData {
    /// Text to forward.
    Text(String),
    /// Nothing to forward (keep-alive, role header, empty delta).
    Skip,
    /// End of stream.
    Done,
}

/// Extract a complete SSE event from the buffer.
///
/// Returns `Some(event)` if a complete event was found (and removes it from
/// the buffer), or `None` if no complete event is available yet. Accepts
/// both `\n\n` and `\r\n\r\n` separators.
pub fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<String> {
    let (idx, sep_len) = find_separator(buffer)?;
    let event: Vec<u8> = buffer.drain(..idx + sep_len).take(idx).collect();
    Some(String::from_utf8_lossy(&event).into_owned())
}

fn find_separator(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Concatenated `data:` lines of one event, if any.
pub fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Turn an SSE response body into a text stream.
///
/// `decode` interprets each `data:` payload. The stream ends at
/// [`SseData::Done`], at the end of the body, or after the first error.
pub fn text_stream<F>(response: reqwest::Response, decode: F) -> TextStream
where
    F: Fn(&str) -> Result<SseData, AiError> + Send + 'static,
{
    Box::pin(stream! {
        let mut buffer: Vec<u8> = Vec::new();
        let mut byte_stream = std::pin::pin!(response.bytes_stream());

        'outer: while let Some(chunk_result) = byte_stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend_from_slice(&chunk);

                    while let Some(event) = extract_sse_event(&mut buffer) {
                        let Some(data) = event_data(&event) else {
                            continue;
                        };
                        match decode(&data) {
                            Ok(SseData::Text(text)) => yield Ok(text),
                            Ok(SseData::Skip) => {}
                            Ok(SseData::Done) => break 'outer,
                            Err(e) => {
                                yield Err(e);
                                break 'outer;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(AiError::Stream(e.to_string()));
                    break;
                }
            }
        }

        // Trailing event without a final blank line.
        if !buffer.is_empty() {
            let event = String::from_utf8_lossy(&buffer).into_owned();
            if let Some(data) = event_data(&event)
                && let Ok(SseData::Text(text)) = decode(&data)
            {
                yield Ok(text);
            }
        }
    })
}
