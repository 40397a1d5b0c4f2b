use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder.
/// Fails if a recorder is already installed (e.g. a second server in one process).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "proxy_requests_total",
        "Total number of chat completion requests"
    );
    describe_counter!(
        "proxy_fallbacks_total",
        "Retries against a fallback deployment after a 404"
    );
    describe_histogram!(
        "proxy_request_duration_seconds",
        "Time until the Azure response headers were received"
    );
    describe_counter!("proxy_errors_total", "Total number of errors by kind");
    describe_gauge!("proxy_info", "Proxy version information");

    gauge!("proxy_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record a request
pub fn record_request(deployment: &str, stream: bool, used_default: bool) {
    counter!(
        "proxy_requests_total",
        "deployment" => deployment.to_string(),
        "stream" => stream.to_string(),
        "default_deployment" => used_default.to_string(),
    )
    .increment(1);
}

/// Record a fallback attempt
pub fn record_fallback(from: &str, to: &str) {
    counter!(
        "proxy_fallbacks_total",
        "from" => from.to_string(),
        "to" => to.to_string(),
    )
    .increment(1);
}

/// Record request duration
pub fn record_duration(deployment: &str, stream: bool, duration: Duration) {
    histogram!(
        "proxy_request_duration_seconds",
        "deployment" => deployment.to_string(),
        "stream" => stream.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record an error
pub fn record_error(kind: &str) {
    counter!("proxy_errors_total", "kind" => kind.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_metrics() {
        init_metric_descriptions();

        record_request("gpt-4.1-nano", false, false);
        record_fallback("gpt-4.1-nano", "Phi-4");
        record_duration("Phi-4", true, Duration::from_millis(250));
        record_error("backend_unreachable");

        // Without an installed recorder these are no-ops; they must not panic
    }

    #[test]
    fn test_metrics_rendered_by_local_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_error("unauthorized");
        });

        let rendered = handle.render();
        assert!(rendered.contains("proxy_errors_total"));
        assert!(rendered.contains("kind=\"unauthorized\""));
    }
}
