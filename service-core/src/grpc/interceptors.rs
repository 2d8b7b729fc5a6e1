//! gRPC interceptors and metadata helpers.
//!
//! - Trace context logging (W3C traceparent) and request-id propagation
//! - `grpc-timeout` decoding for per-request deadlines

use std::time::Duration;

use tonic::metadata::MetadataMap;
use tonic::{Request, Status};

/// gRPC metadata key for W3C traceparent header.
pub const TRACEPARENT_KEY: &str = "traceparent";

/// gRPC metadata key for request ID.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// gRPC metadata key carrying the caller's deadline.
pub const GRPC_TIMEOUT_KEY: &str = "grpc-timeout";

/// Interceptor that logs trace context from incoming requests.
///
/// ```ignore
/// let svc = AdminServiceServer::with_interceptor(service, trace_context_interceptor);
/// ```
#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    if let Some(traceparent) = metadata_str(request.metadata(), TRACEPARENT_KEY) {
        tracing::debug!(traceparent = %traceparent, "Received trace context");
    }

    if let Some(request_id) = metadata_str(request.metadata(), REQUEST_ID_KEY) {
        tracing::Span::current().record("request_id", request_id);
    }

    Ok(request)
}

/// Extract request ID from incoming gRPC request metadata.
pub fn extract_request_id<T>(request: &Request<T>) -> Option<String> {
    metadata_str(request.metadata(), REQUEST_ID_KEY).map(str::to_string)
}

/// Decode the `grpc-timeout` header.
///
/// The wire format is at most eight ASCII digits followed by a unit:
/// `H` hours, `M` minutes, `S` seconds, `m` millis, `u` micros, `n` nanos.
pub fn grpc_timeout(metadata: &MetadataMap) -> Option<Duration> {
    let value = metadata_str(metadata, GRPC_TIMEOUT_KEY)?;
    parse_grpc_timeout(value)
}

fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let duration = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

fn metadata_str<'a>(metadata: &'a MetadataMap, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_request_id() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(REQUEST_ID_KEY, "test-request-123".parse().unwrap());

        assert_eq!(
            extract_request_id(&request),
            Some("test-request-123".to_string())
        );
    }

    #[test]
    fn test_interceptor_passes_through() {
        let request = Request::new(());
        assert!(trace_context_interceptor(request).is_ok());
    }

    #[test]
    fn test_parse_grpc_timeout_units() {
        assert_eq!(parse_grpc_timeout("1H"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_grpc_timeout("2M"), Some(Duration::from_secs(120)));
        assert_eq!(parse_grpc_timeout("5S"), Some(Duration::from_secs(5)));
        assert_eq!(parse_grpc_timeout("250m"), Some(Duration::from_millis(250)));
        assert_eq!(parse_grpc_timeout("10u"), Some(Duration::from_micros(10)));
        assert_eq!(parse_grpc_timeout("99n"), Some(Duration::from_nanos(99)));
    }

    #[test]
    fn test_parse_grpc_timeout_rejects_garbage() {
        assert_eq!(parse_grpc_timeout(""), None);
        assert_eq!(parse_grpc_timeout("S"), None);
        assert_eq!(parse_grpc_timeout("12x"), None);
        assert_eq!(parse_grpc_timeout("-1S"), None);
        assert_eq!(parse_grpc_timeout("123456789S"), None);
    }

    #[test]
    fn test_grpc_timeout_from_metadata() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(GRPC_TIMEOUT_KEY, "1500m".parse().unwrap());
        assert_eq!(
            grpc_timeout(request.metadata()),
            Some(Duration::from_millis(1500))
        );
    }
}
