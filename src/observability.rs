use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatline.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatline.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatline.client.request_duration_seconds");

pub(crate) static SEARCH_REQUESTS: Counter = Counter::new("chatline.search.requests");
pub(crate) static SEARCH_REQUEST_ERRORS: Counter = Counter::new("chatline.search.request_errors");
pub(crate) static SEARCH_REQUEST_DURATION: Moments =
    Moments::new("chatline.search.request_duration_seconds");
pub(crate) static SEARCH_DOCUMENTS: Moments = Moments::new("chatline.search.documents");

pub(crate) static SESSION_TURNS: Counter = Counter::new("chatline.session.turns");
pub(crate) static SESSION_FAILURES: Counter = Counter::new("chatline.session.failures");
pub(crate) static SESSION_RETRIEVAL_FALLBACKS: Counter =
    Counter::new("chatline.session.retrieval_fallbacks");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SEARCH_REQUESTS);
    collector.register_counter(&SEARCH_REQUEST_ERRORS);
    collector.register_moments(&SEARCH_REQUEST_DURATION);
    collector.register_moments(&SEARCH_DOCUMENTS);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_FAILURES);
    collector.register_counter(&SESSION_RETRIEVAL_FALLBACKS);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_with_fresh_collector() {
        register_biometrics(Collector::new());
    }
}
