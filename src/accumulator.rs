//! Folds a query's event stream into a single [`FinalResult`].

use std::time::Instant;

use futures::{Stream, StreamExt};
use serde_json::{Map, Value};

use crate::observability::{STREAM_DURATION, STREAM_ERRORS, STREAM_EVENTS, STREAM_SKIPPED};
use crate::sse::StreamRecord;
use crate::{ContextField, Error, FinalResult, Result, StreamEvent};

/// Where stream consumption stands after a record.
#[derive(Debug)]
pub enum StreamState {
    /// More records are expected.
    Reading,

    /// The sentinel arrived or the input ended cleanly.
    Done,

    /// Reading failed; the partial result must be discarded.
    Errored(Error),
}

/// Accumulates answer text and metadata from stream events.
///
/// Answer chunks are concatenated in arrival order.  Session id, message id and metrics are
/// last-write-wins across the whole stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamAccumulator {
    answer: String,
    session_id: String,
    message_id: String,
    metrics: Option<Map<String, Value>>,
}

impl StreamAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the accumulator.
    pub fn accumulate(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Fulfillment(fulfillment) => {
                if let Some(answer) = &fulfillment.answer {
                    self.answer.push_str(answer);
                }
                if let Some(session_id) = &fulfillment.session_id {
                    self.session_id.clone_from(session_id);
                }
                if let Some(message_id) = &fulfillment.message_id {
                    self.message_id.clone_from(message_id);
                }
            }
            StreamEvent::MetricsLog(metrics_log) => {
                if let Some(metrics) = &metrics_log.public_metrics {
                    self.metrics = Some(metrics.clone());
                }
            }
            StreamEvent::Unknown => {}
        }
    }

    /// Feed one item of the record stream and report the resulting state.
    pub fn feed(&mut self, record: Result<StreamRecord>) -> StreamState {
        match record {
            Ok(StreamRecord::Event(event)) => {
                STREAM_EVENTS.click();
                self.accumulate(&event);
                StreamState::Reading
            }
            Ok(StreamRecord::Done) => StreamState::Done,
            Ok(StreamRecord::Malformed) => {
                STREAM_SKIPPED.click();
                StreamState::Reading
            }
            Ok(StreamRecord::Ignored) => StreamState::Reading,
            Err(err) => {
                STREAM_ERRORS.click();
                StreamState::Errored(err)
            }
        }
    }

    /// The answer text accumulated so far.
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// The last session id seen so far.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The last message id seen so far.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// The last metrics seen so far.
    pub fn metrics(&self) -> Option<&Map<String, Value>> {
        self.metrics.as_ref()
    }

    /// Assemble the final result.
    pub fn finish(self, context_metadata: Vec<ContextField>) -> FinalResult {
        FinalResult::new(
            self.session_id,
            self.message_id,
            self.answer,
            self.metrics,
            context_metadata,
        )
    }
}

/// Drive a record stream to completion and assemble its [`FinalResult`].
///
/// Nothing after the `[DONE]` sentinel is read.  A read error discards everything
/// accumulated so far and is returned instead.
pub async fn consume_stream<S>(records: S, context_metadata: &[ContextField]) -> Result<FinalResult>
where
    S: Stream<Item = Result<StreamRecord>>,
{
    let start = Instant::now();
    let mut records = std::pin::pin!(records);
    let mut accumulator = StreamAccumulator::new();
    let state = loop {
        let state = match records.next().await {
            Some(record) => accumulator.feed(record),
            None => StreamState::Done,
        };
        if !matches!(state, StreamState::Reading) {
            break state;
        }
    };
    STREAM_DURATION.add(start.elapsed().as_secs_f64());

    match state {
        StreamState::Errored(err) => {
            tracing::warn!(error = %err, "event stream failed; discarding partial result");
            Err(err)
        }
        StreamState::Done | StreamState::Reading => {
            tracing::debug!(
                answer_len = accumulator.answer().len(),
                session_id = accumulator.session_id(),
                message_id = accumulator.message_id(),
                "event stream complete"
            );
            Ok(accumulator.finish(context_metadata.to_vec()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::{parse_record, process_event_stream};
    use crate::{FulfillmentEvent, MetricsLogEvent};
    use bytes::Bytes;
    use futures::stream;
    use serde_json::json;

    fn records(lines: &[&str]) -> impl Stream<Item = Result<StreamRecord>> {
        let records: Vec<_> = lines.iter().map(|line| Ok(parse_record(line))).collect();
        stream::iter(records)
    }

    #[tokio::test]
    async fn accumulates_the_reference_stream() {
        let result = consume_stream(
            records(&[
                r#"data: {"eventType":"fulfillment","answer":"He","sessionId":"S1","messageId":"M1"}"#,
                r#"data: {"eventType":"fulfillment","answer":"llo"}"#,
                r#"data: {"eventType":"metricsLog","publicMetrics":{"tokens":5}}"#,
                "data: [DONE]",
            ]),
            &[ContextField::new("userId", "1")],
        )
        .await
        .unwrap();

        assert_eq!(result.data.answer, "Hello");
        assert_eq!(result.data.session_id, "S1");
        assert_eq!(result.data.message_id, "M1");
        assert_eq!(
            serde_json::to_value(&result.data.metrics).unwrap(),
            json!({"tokens": 5})
        );
        assert_eq!(result.data.status, "completed");
        assert_eq!(result.message, "Chat query submitted successfully");
        assert_eq!(result.data.context_metadata, vec![ContextField::new("userId", "1")]);
    }

    #[tokio::test]
    async fn malformed_records_do_not_abort_the_stream() {
        let result = consume_stream(
            records(&[
                r#"data: {"eventType":"fulfillment","answer":"a"}"#,
                "data: {this is not json",
                "data: 42",
                r#"data: {"eventType":"fulfillment","answer":"b"}"#,
            ]),
            &[],
        )
        .await
        .unwrap();
        assert_eq!(result.data.answer, "ab");
    }

    #[tokio::test]
    async fn mistyped_fields_keep_the_answer_text() {
        let result = consume_stream(
            records(&[
                r#"data: {"eventType":"fulfillment","answer":"He","sessionId":"S1","messageId":"M1"}"#,
                r#"data: {"eventType":"fulfillment","answer":"llo","messageId":42}"#,
                r#"data: {"eventType":"metricsLog","publicMetrics":{"tokens":5}}"#,
                r#"data: {"eventType":"metricsLog","publicMetrics":[1,2]}"#,
                "data: [DONE]",
            ]),
            &[],
        )
        .await
        .unwrap();
        assert_eq!(result.data.answer, "Hello");
        assert_eq!(result.data.session_id, "S1");
        assert_eq!(result.data.message_id, "M1");
        assert_eq!(
            serde_json::to_value(&result.data.metrics).unwrap(),
            json!({"tokens": 5})
        );
    }

    #[tokio::test]
    async fn records_after_the_sentinel_are_not_read() {
        let stream = stream::iter(vec![
            Ok(parse_record(r#"data: {"eventType":"fulfillment","answer":"done"}"#)),
            Ok(StreamRecord::Done),
            Ok(parse_record(r#"data: {"eventType":"fulfillment","answer":" and more"}"#)),
            Err(Error::streaming("never reached", None)),
        ]);
        let result = consume_stream(stream, &[]).await.unwrap();
        assert_eq!(result.data.answer, "done");
    }

    #[tokio::test]
    async fn clean_end_without_sentinel_completes() {
        let result = consume_stream(
            records(&[r#"data: {"eventType":"fulfillment","answer":"partial","sessionId":"S9"}"#]),
            &[],
        )
        .await
        .unwrap();
        assert_eq!(result.data.answer, "partial");
        assert_eq!(result.data.session_id, "S9");
        assert_eq!(result.data.message_id, "");
        assert!(result.data.metrics.is_none());
    }

    #[tokio::test]
    async fn read_error_discards_partial_result() {
        let stream = stream::iter(vec![
            Ok(Bytes::from_static(
                b"data: {\"eventType\":\"fulfillment\",\"answer\":\"lost\"}\n",
            )),
            Err(Error::streaming("connection reset by peer", None)),
        ]);
        let err = consume_stream(process_event_stream(stream), &[])
            .await
            .unwrap_err();
        assert!(err.is_streaming());
    }

    #[test]
    fn unknown_events_leave_the_accumulator_unchanged() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.accumulate(&StreamEvent::Fulfillment(FulfillmentEvent {
            answer: Some("Hi".to_string()),
            session_id: Some("S1".to_string()),
            message_id: None,
        }));
        let before = accumulator.clone();
        accumulator.accumulate(&StreamEvent::Unknown);
        assert_eq!(accumulator, before);

        let state = accumulator.feed(Ok(parse_record(
            r#"data: {"eventType":"agentTrace","answer":"ignored","sessionId":"S2"}"#,
        )));
        assert!(matches!(state, StreamState::Reading));
        assert_eq!(accumulator, before);
    }

    #[test]
    fn identifiers_and_metrics_are_last_write_wins() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.accumulate(&StreamEvent::Fulfillment(FulfillmentEvent {
            answer: None,
            session_id: Some("S1".to_string()),
            message_id: Some("M1".to_string()),
        }));
        accumulator.accumulate(&StreamEvent::Fulfillment(FulfillmentEvent {
            answer: None,
            session_id: Some("S2".to_string()),
            message_id: None,
        }));
        let mut first = Map::new();
        first.insert("tokens".to_string(), json!(1));
        let mut second = Map::new();
        second.insert("latency".to_string(), json!(7));
        accumulator.accumulate(&StreamEvent::MetricsLog(MetricsLogEvent {
            public_metrics: Some(first),
        }));
        accumulator.accumulate(&StreamEvent::MetricsLog(MetricsLogEvent {
            public_metrics: Some(second.clone()),
        }));
        accumulator.accumulate(&StreamEvent::MetricsLog(MetricsLogEvent {
            public_metrics: None,
        }));

        assert_eq!(accumulator.session_id(), "S2");
        assert_eq!(accumulator.message_id(), "M1");
        assert_eq!(accumulator.metrics(), Some(&second));
        assert_eq!(accumulator.answer(), "");
    }

    #[test]
    fn feed_transitions() {
        let mut accumulator = StreamAccumulator::new();
        assert!(matches!(
            accumulator.feed(Ok(StreamRecord::Ignored)),
            StreamState::Reading
        ));
        assert!(matches!(
            accumulator.feed(Ok(StreamRecord::Malformed)),
            StreamState::Reading
        ));
        assert!(matches!(
            accumulator.feed(Ok(StreamRecord::Done)),
            StreamState::Done
        ));
        assert!(matches!(
            accumulator.feed(Err(Error::streaming("eof", None))),
            StreamState::Errored(_)
        ));
    }
}
