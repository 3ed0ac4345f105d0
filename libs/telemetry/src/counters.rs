use metrics::counter;

pub const PROVIDER_LOAD_TOTAL: &str = "mqc_provider_load_total";
pub const ACQUIRE_TOTAL: &str = "mqc_session_acquire_total";
pub const CLEANUP_FAILURES_TOTAL: &str = "mqc_cleanup_failures_total";

pub fn record_provider_load(provider: &str, outcome: &'static str) {
    counter!(
        PROVIDER_LOAD_TOTAL,
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_acquire(outcome: &'static str, transactional: bool) {
    counter!(
        ACQUIRE_TOTAL,
        "outcome" => outcome,
        "transactional" => if transactional { "true" } else { "false" }
    )
    .increment(1);
}

/// Counts close failures that were suppressed while unwinding.
pub fn record_cleanup_failure(stage: &'static str) {
    counter!(CLEANUP_FAILURES_TOTAL, "stage" => stage).increment(1);
}
