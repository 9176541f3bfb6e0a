//! 服务层模块
//!
//! 令牌、密码、限流与测试数据

pub mod auth;
pub mod password;
pub mod rate_limit;
pub mod seeder;

pub use auth::{Claims, JwtService, TokenError, TokenPair, TokenType};
pub use rate_limit::RateLimiter;
