//! Line-oriented processing of a query's server-sent event stream.
//!
//! The service writes one record per line.  Records starting with `data:` carry either the
//! `[DONE]` sentinel or a JSON [`StreamEvent`]; everything else on the wire is ignored.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::STREAM_BYTES;
use crate::{Error, Result, StreamEvent};

/// Prefix of every record that carries a payload.
pub const DATA_PREFIX: &str = "data:";

/// Payload that ends the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One line of the event stream, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    /// A `data:` record holding a well-formed event.
    Event(StreamEvent),

    /// The `[DONE]` sentinel.
    Done,

    /// A `data:` record whose payload is not a recognisable event.
    Malformed,

    /// A line without a `data:` prefix.
    Ignored,
}

/// Classify a single line of the stream.
///
/// The line must not contain its terminating newline.
pub fn parse_record(line: &str) -> StreamRecord {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return StreamRecord::Ignored;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return StreamRecord::Done;
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => StreamRecord::Event(event),
        Err(err) => {
            tracing::debug!(payload = %payload, error = %err, "skipping malformed stream record");
            StreamRecord::Malformed
        }
    }
}

/// Longest record accepted, in bytes, not counting its line ending.
pub const MAX_RECORD_BYTES: usize = 64 * 1024;

/// Split a byte stream into classified records.
///
/// Records may span chunk boundaries; a final record without a trailing newline is still
/// yielded when the byte stream ends.  Errors from the byte stream are passed through and end
/// the record stream, as does a record longer than [`MAX_RECORD_BYTES`].
pub fn process_event_stream<S>(byte_stream: S) -> impl Stream<Item = Result<StreamRecord>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    stream::unfold(
        (byte_stream, LineBuffer::default(), false),
        |(mut stream, mut lines, finished)| async move {
            loop {
                if let Some(line) = lines.next_line() {
                    return Some((Ok(parse_record(&line)), (stream, lines, finished)));
                }
                if finished {
                    return None;
                }
                if lines.pending() > MAX_RECORD_BYTES {
                    let err = Error::streaming(
                        format!("stream record exceeds {MAX_RECORD_BYTES} bytes"),
                        None,
                    );
                    return Some((Err(err), (stream, LineBuffer::default(), true)));
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        lines.extend(&bytes);
                    }
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, LineBuffer::default(), true)));
                    }
                    None => {
                        let Some(line) = lines.take_rest() else {
                            return None;
                        };
                        return Some((
                            Ok(parse_record(&line)),
                            (stream, LineBuffer::default(), true),
                        ));
                    }
                }
            }
        },
    )
}

/// Bytes received but not yet split into lines.
///
/// `scanned` marks how much of `buffer` is known to hold no newline, so each byte is
/// searched once however many chunks a line arrives in.
#[derive(Debug, Default)]
struct LineBuffer {
    buffer: Vec<u8>,
    scanned: usize,
}

impl LineBuffer {
    fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes of the incomplete line held so far.
    fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Remove and return the first complete line, without its line ending.
    fn next_line(&mut self) -> Option<String> {
        let newline = self.buffer[self.scanned..].iter().position(|b| *b == b'\n');
        let Some(offset) = newline else {
            self.scanned = self.buffer.len();
            return None;
        };
        let end = self.scanned + offset;
        let line: Vec<u8> = self.buffer.drain(..=end).collect();
        self.scanned = 0;
        Some(decode_line(&line[..end]))
    }

    /// Return whatever is left once the byte stream has ended.
    fn take_rest(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
