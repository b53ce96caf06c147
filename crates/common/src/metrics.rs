use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static BUSINESSES_REGISTERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "adbox_businesses_registered_total",
        "Total businesses registered"
    )
    .expect("register businesses_registered_total")
});

pub static BUSINESSES_PURGED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "adbox_businesses_purged_total",
        "Total businesses deleted with all their index entries"
    )
    .expect("register businesses_purged_total")
});

pub static DIRECTORY_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "adbox_directory_lookups_total",
        "Directory lookups by kind (page, category, zip, search)",
        &["kind"]
    )
    .expect("register directory_lookups_total")
});

pub static PAGE_MAPPINGS_FIXED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "adbox_page_mappings_fixed_total",
        "Total business page mappings repaired"
    )
    .expect("register page_mappings_fixed_total")
});

pub static CATEGORY_KEYS_REMOVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "adbox_category_keys_removed_total",
        "Category index keys removed by cleanup"
    )
    .expect("register category_keys_removed_total")
});

pub static CORRUPT_VALUES_HEALED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "adbox_corrupt_values_healed_total",
        "Stored values dropped because they could not be decoded"
    )
    .expect("register corrupt_values_healed_total")
});

pub static REVIEWS_SUBMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "adbox_reviews_submitted_total",
        "Total customer reviews stored"
    )
    .expect("register reviews_submitted_total")
});

pub static ANALYTICS_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "adbox_analytics_events_total",
        "Visitor analytics events recorded by type",
        &["event"]
    )
    .expect("register analytics_events_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_output_lists_touched_counters() {
        BUSINESSES_REGISTERED_TOTAL.inc();
        DIRECTORY_LOOKUPS_TOTAL.with_label_values(&["zip"]).inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, axum::http::StatusCode::OK);
        assert!(body.contains("adbox_businesses_registered_total"));
        assert!(body.contains("adbox_directory_lookups_total"));
    }
}
