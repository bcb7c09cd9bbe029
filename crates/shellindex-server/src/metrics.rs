use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Histogram, HistogramVec, IntCounterVec, IntGauge,
};

pub static OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("shellindex_ops_total", "Requests by operation and outcome", &["op", "outcome"])
        .expect("ops counter registers once")
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("shellindex_op_duration_seconds", "Request durations", &["op"])
        .expect("op duration histogram registers once")
});

pub static DOCUMENTS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("shellindex_documents", "Documents currently indexed")
        .expect("documents gauge registers once")
});

pub static QUERY_PARSE_MICROS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "shellindex_query_parse_micros",
        "Query parse time (µs)",
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .expect("query parse histogram registers once")
});
