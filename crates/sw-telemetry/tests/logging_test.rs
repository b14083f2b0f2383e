use sw_telemetry::logging;

#[test]
fn test_init_logging_human() {
    // Should not panic; second call is a safe no-op.
    logging::init_logging("test-service", "debug");
    logging::init_logging("test-service", "info");

    tracing::info!(task_id = "abc", "human-readable log line");
}

#[test]
fn test_init_logging_json() {
    // The global subscriber may already be set by another test; this then no-ops.
    logging::init_logging_json("test-service-json", "info");

    tracing::info!(task_id = "abc", "json log line");
}
