//! gRPC utilities for micros microservices.
//!
//! - Error conversion between `AppError` and `tonic::Status`
//! - Interceptors for trace context and deadline propagation
//! - Readiness shared with `grpc.health.v1`
//! - Server builder and reflection utilities

pub mod error;
pub mod health;
pub mod interceptors;
pub mod server;

pub use error::{GrpcResult, IntoStatus};
pub use health::{HealthComponents, Readiness};
pub use interceptors::{
    GRPC_TIMEOUT_KEY, REQUEST_ID_KEY, TRACEPARENT_KEY, extract_request_id, grpc_timeout,
    trace_context_interceptor,
};
pub use server::{GrpcServerBuilder, create_reflection_service};

// Re-export commonly used tonic types
pub use tonic::{Code, Request, Response, Status};
