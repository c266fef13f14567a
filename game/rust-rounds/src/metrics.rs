use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // Round lifecycle
    pub static ref ROUNDS_RESOLVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "rounds_resolved_total",
        "Rounds resolved, by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref STALE_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "stale_events_total",
        "Events discarded because their round or clock generation was superseded",
        &["kind"]
    )
    .unwrap();

    pub static ref HIGH_SCORE_SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "high_score_submissions_total",
        "Finished runs considered for a leaderboard, by result",
        &["status"]
    )
    .unwrap();

    // Backend client
    pub static ref BACKEND_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "backend_requests_total",
        "Requests made to the trivia backend",
        &["endpoint", "status"]
    )
    .unwrap();

    pub static ref BACKEND_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "backend_request_duration_seconds",
        "Trivia backend request duration in seconds",
        &["endpoint"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // Dev backend HTTP surface
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();
}

/// Render all registered metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Helper: time a backend call and count it by outcome
pub async fn track_backend_request<F, T, E>(endpoint: &str, future: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    BACKEND_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status])
        .inc();

    BACKEND_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(duration);

    result
}

pub fn record_round_resolved(outcome: &str) {
    ROUNDS_RESOLVED_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_stale_event(kind: &str) {
    STALE_EVENTS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn record_high_score_submission(status: &str) {
    HIGH_SCORE_SUBMISSIONS_TOTAL
        .with_label_values(&[status])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_metrics() {
        record_round_resolved("timeout");
        record_stale_event("guess");

        let output = render_metrics().unwrap();
        assert!(output.contains("rounds_resolved_total"));
        assert!(output.contains("stale_events_total"));
    }

    #[tokio::test]
    async fn test_track_backend_request_counts_errors() {
        let before = BACKEND_REQUESTS_TOTAL
            .with_label_values(&["metrics-test", "error"])
            .get();

        let result: Result<(), &str> =
            track_backend_request("metrics-test", async { Err("boom") }).await;

        assert!(result.is_err());
        let after = BACKEND_REQUESTS_TOTAL
            .with_label_values(&["metrics-test", "error"])
            .get();
        assert_eq!(after, before + 1);
    }
}
