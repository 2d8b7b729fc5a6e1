pub mod admin;
pub mod session;

pub use admin::{Admin, AdminField, NewAdmin, ProviderType};
pub use session::{AdminAuth, AuthResult, ProviderUser};
