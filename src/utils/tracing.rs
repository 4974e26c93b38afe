//! Span and event helpers shared by services.

use tracing::Span;

/// Span for an outbound HTTP call to a third-party API.
///
/// ```ignore
/// let span = external_http_span!("paystack", "POST", "/transaction/initialize");
/// ```
#[macro_export]
macro_rules! external_http_span {
    ($service:expr, $method:expr, $path:expr) => {
        tracing::info_span!(
            "http.client",
            service.name = $service,
            http.method = $method,
            http.url = $path,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty
        )
    };
}

/// WARN-level event for failed logins, bad webhook signatures and the like.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {
        tracing::warn!(security.event = $event, $($field)*)
    };
}

/// INFO-level record of a state change worth auditing.
#[macro_export]
macro_rules! audit_event {
    ($action:expr, $resource:expr, $($field:tt)*) => {
        tracing::info!(audit.action = $action, audit.resource = $resource, $($field)*)
    };
}

/// Records an HTTP status on the current span and marks it failed on 4xx/5xx.
pub fn record_http_status(status: u16) {
    let span = Span::current();
    span.record("http.status_code", status);
    span.record("otel.status_code", if status >= 400 { "ERROR" } else { "OK" });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_span_is_a_no_op() {
        record_http_status(200);
        record_http_status(502);
    }
}
