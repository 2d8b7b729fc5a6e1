pub mod auth;
pub mod context;

pub use auth::{bearer_token, BearerToken};
