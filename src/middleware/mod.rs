pub mod auth;
pub mod response;

pub use auth::{require_auth, AuthSession};
pub use response::{ApiResponse, ApiResult};
