//! 请求中间件与 extractor

pub mod auth;
pub mod extract;
pub mod host;
pub mod rate_limit;

pub use auth::RequireUser;
pub use extract::{ApiJson, ApiPath, ApiQuery};
