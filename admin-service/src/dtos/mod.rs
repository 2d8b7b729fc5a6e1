pub mod admin;
pub mod auth;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error envelope returned by every failing route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = 400)]
    pub status: u16,
    #[schema(example = "Bad Request")]
    pub message: String,
    #[schema(example = "invalid argument: email: Invalid email format")]
    pub detail: String,
}
