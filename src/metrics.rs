use crate::error::ConciergeError;
use crate::otel;
use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;
use std::sync::OnceLock;

pub fn inc_intro_call_success() {
    intro_call_success().add(1, &[])
}

pub fn inc_intro_call_error(error: &ConciergeError) {
    intro_call_error().add(1, &error_attributes(error))
}

pub fn inc_reservation_success() {
    reservation_success().add(1, &[])
}

pub fn inc_reservation_error(error: &ConciergeError) {
    reservation_error().add(1, &error_attributes(error))
}

fn error_attributes(error: &ConciergeError) -> Vec<KeyValue> {
    let kind = match error {
        ConciergeError::HttpRequestFailed(_) => "HttpRequestFailed",
        ConciergeError::InvalidResponse(_) => "InvalidResponse",
        ConciergeError::ApiError(_) => "ApiError",
        ConciergeError::MissingApiKey(_) => "MissingApiKey",
        ConciergeError::NoRestaurantFound(_) => "NoRestaurantFound",
    };
    vec![KeyValue::new("kind", kind.to_string())]
}

fn intro_call_success() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let meter = otel::get_meter();
        meter
            .u64_counter("intro_call_success")
            .with_description("Number of introduction calls dispatched successfully")
            .build()
    })
}

fn intro_call_error() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let meter = otel::get_meter();
        meter
            .u64_counter("intro_call_error")
            .with_description("Number of failed introduction call dispatches")
            .build()
    })
}

fn reservation_success() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let meter = otel::get_meter();
        meter
            .u64_counter("reservation_call_success")
            .with_description("Number of reservation calls that completed dispatch")
            .build()
    })
}

fn reservation_error() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| {
        let meter = otel::get_meter();
        meter
            .u64_counter("reservation_call_error")
            .with_description("Number of failed reservation call attempts")
            .build()
    })
}
