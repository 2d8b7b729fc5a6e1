pub mod admin;
pub mod cognito;
pub mod context;
pub mod database;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod store;

pub use admin::AdminService;
pub use cognito::CognitoAdminAuth;
pub use context::{ContextError, RequestContext};
pub use database::Database;
pub use error::{ProviderError, StoreError};
pub use metrics::{
    get_metrics, init_metrics, record_error, record_grpc_request, record_grpc_request_duration,
};
pub use provider::{AdminAuthProvider, MockAdminAuth};
pub use store::{AdminStore, MemoryAdminStore, TxHook};
