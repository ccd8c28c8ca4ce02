use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("flowchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("flowchat.client.request_errors");
pub(crate) static CLIENT_UNAUTHORIZED: Counter = Counter::new("flowchat.client.unauthorized");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("flowchat.client.request_duration_seconds");

pub(crate) static SESSION_LOGINS: Counter = Counter::new("flowchat.session.logins");
pub(crate) static SESSION_TOKEN_REFRESHES: Counter =
    Counter::new("flowchat.session.token_refreshes");
pub(crate) static SESSION_REFRESH_FAILURES: Counter =
    Counter::new("flowchat.session.refresh_failures");
pub(crate) static SESSION_LOGOUTS: Counter = Counter::new("flowchat.session.logouts");
pub(crate) static SESSION_MESSAGES_SENT: Counter = Counter::new("flowchat.session.messages_sent");
pub(crate) static SESSION_STALE_RESPONSES: Counter =
    Counter::new("flowchat.session.stale_responses");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_UNAUTHORIZED);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_LOGINS);
    collector.register_counter(&SESSION_TOKEN_REFRESHES);
    collector.register_counter(&SESSION_REFRESH_FAILURES);
    collector.register_counter(&SESSION_LOGOUTS);
    collector.register_counter(&SESSION_MESSAGES_SENT);
    collector.register_counter(&SESSION_STALE_RESPONSES);
}
