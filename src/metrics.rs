//! Prometheus metrics.
//!
//! With the `metrics` feature (on by default) query timings and 404 outcomes
//! are recorded in the default Prometheus registry. Without it the recording
//! functions are no-ops and [`render`] returns an empty string.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
use std::time::Duration;

#[cfg(feature = "metrics")]
mod registry {
    use once_cell::sync::Lazy;
    use prometheus::{register_histogram_vec, register_int_counter, register_int_counter_vec};
    use prometheus::{HistogramVec, IntCounter, IntCounterVec};

    pub(super) struct HatchMetrics {
        pub queries_total: IntCounterVec,
        pub query_duration: HistogramVec,
        pub not_found_total: IntCounter,
    }

    pub(super) static METRICS: Lazy<Option<HatchMetrics>> = Lazy::new(|| {
        let built = (|| -> Result<HatchMetrics, prometheus::Error> {
            Ok(HatchMetrics {
                queries_total: register_int_counter_vec!(
                    "hatchling_queries_total",
                    "Total queries executed",
                    &["kind"]
                )?,
                query_duration: register_histogram_vec!(
                    "hatchling_query_duration_seconds",
                    "Duration of queries",
                    &["kind"]
                )?,
                not_found_total: register_int_counter!(
                    "hatchling_not_found_total",
                    "Lookups and pages answered with not found"
                )?,
            })
        })();
        match built {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                log::warn!("failed to register metrics: {e}");
                None
            }
        }
    });
}

/// Record one executed query of the given kind (`select`, `count`)
pub fn record_query(kind: &str, elapsed: Duration) {
    #[cfg(feature = "metrics")]
    if let Some(m) = registry::METRICS.as_ref() {
        m.queries_total.with_label_values(&[kind]).inc();
        m.query_duration
            .with_label_values(&[kind])
            .observe(elapsed.as_secs_f64());
    }
    #[cfg(not(feature = "metrics"))]
    let _ = (kind, elapsed);
}

/// Record a not-found outcome
pub fn record_not_found() {
    #[cfg(feature = "metrics")]
    if let Some(m) = registry::METRICS.as_ref() {
        m.not_found_total.inc();
    }
}

/// Text exposition of every registered metric
pub fn render() -> String {
    #[cfg(feature = "metrics")]
    {
        use prometheus::Encoder;

        Lazy::force(&registry::METRICS);
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            log::warn!("failed to encode metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
    #[cfg(not(feature = "metrics"))]
    String::new()
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_series() {
        record_query("select", Duration::from_millis(3));
        record_not_found();
        let text = render();
        assert!(text.contains("hatchling_queries_total{kind=\"select\"}"), "{text}");
        assert!(text.contains("hatchling_query_duration_seconds"), "{text}");
        assert!(text.contains("hatchling_not_found_total"), "{text}");
    }
}
