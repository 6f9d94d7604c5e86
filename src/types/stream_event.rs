use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::lenient;

/// One record of a query's event stream, discriminated by its `eventType` field.
///
/// The service emits more event types than the client needs.  All of them deserialize to
/// [`StreamEvent::Unknown`] so they can be skipped without failing the stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "eventType")]
pub enum StreamEvent {
    /// A chunk of the answer.
    #[serde(rename = "fulfillment")]
    Fulfillment(FulfillmentEvent),

    /// Usage and timing metrics for the query.
    #[serde(rename = "metricsLog")]
    MetricsLog(MetricsLogEvent),

    /// Any event type this client does not consume.
    #[serde(other)]
    Unknown,
}

/// Payload of a `fulfillment` event.
///
/// Fields are read independently; one with an unexpected type is dropped without losing
/// the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentEvent {
    /// The next piece of answer text.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub answer: Option<String>,

    /// The session the answer belongs to.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<String>,

    /// The message the answer belongs to.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub message_id: Option<String>,
}

impl FulfillmentEvent {
    /// Create a `FulfillmentEvent` carrying only answer text.
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            answer: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Payload of a `metricsLog` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsLogEvent {
    /// Metrics the service publishes for the query.
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_metrics: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn fulfillment_deserialization() {
        let event: StreamEvent = from_value(json!({
            "eventType": "fulfillment",
            "answer": "He",
            "sessionId": "S1",
            "messageId": "M1",
            "publicMetrics": {}
        }))
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::Fulfillment(FulfillmentEvent {
                answer: Some("He".to_string()),
                session_id: Some("S1".to_string()),
                message_id: Some("M1".to_string()),
            })
        );
    }

    #[test]
    fn fulfillment_fields_are_optional() {
        let event: StreamEvent = from_value(json!({"eventType": "fulfillment"})).unwrap();
        assert_eq!(event, StreamEvent::Fulfillment(FulfillmentEvent::default()));
    }

    #[test]
    fn metrics_log_deserialization() {
        let event: StreamEvent = from_value(json!({
            "eventType": "metricsLog",
            "publicMetrics": {"tokens": 5, "latency": "1.2s"}
        }))
        .unwrap();
        let StreamEvent::MetricsLog(metrics) = event else {
            panic!("expected a metricsLog event");
        };
        let metrics = metrics.public_metrics.unwrap();
        assert_eq!(metrics["tokens"], json!(5));
        assert_eq!(metrics["latency"], json!("1.2s"));
    }

    #[test]
    fn mistyped_fields_do_not_lose_the_answer() {
        let event: StreamEvent = from_value(json!({
            "eventType": "fulfillment",
            "answer": "llo",
            "sessionId": null,
            "messageId": 42
        }))
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::Fulfillment(FulfillmentEvent::answer("llo"))
        );

        let event: StreamEvent =
            from_value(json!({"eventType": "metricsLog", "publicMetrics": "n/a"})).unwrap();
        assert_eq!(event, StreamEvent::MetricsLog(MetricsLogEvent::default()));
    }

    #[test]
    fn unknown_event_types() {
        let event: StreamEvent =
            from_value(json!({"eventType": "agentTrace", "trace": [1, 2, 3]})).unwrap();
        assert_eq!(event, StreamEvent::Unknown);
    }

    #[test]
    fn missing_event_type_is_an_error() {
        assert!(from_value::<StreamEvent>(json!({"answer": "hi"})).is_err());
    }
}
