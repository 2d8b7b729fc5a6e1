//! Per-request cancellation scope for HTTP handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use crate::services::RequestContext;
use crate::AppState;

/// Scoped to the in-flight request token and the configured request timeout.
#[axum::async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::from_token(&state.requests)
            .with_timeout(state.config.common.request_timeout()))
    }
}
