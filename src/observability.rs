use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("ondemand_chat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("ondemand_chat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("ondemand_chat.client.request_duration_seconds");

pub(crate) static SESSIONS_CREATED: Counter = Counter::new("ondemand_chat.sessions.created");
pub(crate) static SESSIONS_FAILED: Counter = Counter::new("ondemand_chat.sessions.failed");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("ondemand_chat.stream.events");
pub(crate) static STREAM_SKIPPED: Counter = Counter::new("ondemand_chat.stream.skipped");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("ondemand_chat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("ondemand_chat.stream.bytes");
pub(crate) static STREAM_DURATION: Moments =
    Moments::new("ondemand_chat.stream.duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSIONS_CREATED);
    collector.register_counter(&SESSIONS_FAILED);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_SKIPPED);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_moments(&STREAM_DURATION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biometrics_register() {
        register_biometrics(Collector::new());
    }
}
