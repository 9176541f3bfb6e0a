//! 环境变量配置加载

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// 默认 access token 密钥（仅开发用）
const DEFAULT_ACCESS_SECRET: &str = "change-me-access";
/// 默认 refresh token 密钥（仅开发用）
const DEFAULT_REFRESH_SECRET: &str = "change-me-refresh";

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// 服务配置
    pub server: ServerConfig,
    /// JWT 配置
    pub jwt: JwtConfig,
    /// 限流配置
    pub rate_limit: RateLimitConfig,
    /// Google OAuth（可选，仅用于 /health 展示）
    pub oauth: OAuthConfig,
    /// bcrypt cost
    pub bcrypt_cost: u32,
    /// 数据快照目录，未设置时只保存在内存
    pub data_dir: Option<PathBuf>,
    /// 静态资源目录（图标等）
    pub static_dir: PathBuf,
    /// 启动时写入测试数据
    pub seed_test_data: bool,
}

/// 监听与请求管线配置
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口（严格模式，绑定失败直接退出）
    pub port: u16,
    /// 允许的 Host 头，空列表表示不限制
    pub allowed_hosts: Vec<String>,
    /// 是否开启 CORS
    pub cors_enabled: bool,
    /// 单个请求超时
    pub request_timeout: Duration,
    /// 请求体上限（字节）
    pub max_body_bytes: usize,
}

/// JWT 配置
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
}

/// 令牌桶限流配置
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// 每秒补充的令牌数
    pub per_second: f64,
    /// 桶容量
    pub burst: f64,
}

/// Google OAuth 配置
#[derive(Clone, Debug, Default)]
pub struct OAuthConfig {
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_url: Option<String>,
}

impl OAuthConfig {
    pub fn from_env() -> Self {
        Self {
            google_client_id: non_empty("GOOGLE_CLIENT_ID"),
            google_client_secret: non_empty("GOOGLE_CLIENT_SECRET"),
            google_redirect_url: non_empty("GOOGLE_REDIRECT_URL"),
        }
    }

    /// client id 与 secret 都配置时才算可用
    pub fn is_configured(&self) -> bool {
        self.google_client_id.is_some() && self.google_client_secret.is_some()
    }
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let bcrypt_cost = parse_bcrypt_cost("BCRYPT_COST");

        Self {
            server: ServerConfig::from_env(),
            jwt: JwtConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            oauth: OAuthConfig::from_env(),
            bcrypt_cost,
            data_dir: non_empty("DATA_DIR").map(PathBuf::from),
            static_dir: non_empty("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            seed_test_data: parse_bool("SEED_TEST_DATA", true),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", 8080),
            allowed_hosts: env::var("ALLOWED_HOSTS")
                .map(|v| parse_host_list(&v))
                .unwrap_or_else(|_| vec!["reppy.io".to_string(), "localhost".to_string()]),
            cors_enabled: parse_bool("CORS_ENABLED", true),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 10)),
            max_body_bytes: parse_or("MAX_BODY_BYTES", 1024 * 1024),
        }
    }

    /// 监听地址 `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_hosts: vec!["reppy.io".to_string(), "localhost".to_string()],
            cors_enabled: true,
            request_timeout: Duration::from_secs(10),
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let access_secret = env::var("JWT_ACCESS_SECRET").unwrap_or_else(|_| {
            warn!("JWT_ACCESS_SECRET not set, using insecure development secret");
            DEFAULT_ACCESS_SECRET.to_string()
        });
        let refresh_secret = env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| {
            warn!("JWT_REFRESH_SECRET not set, using insecure development secret");
            DEFAULT_REFRESH_SECRET.to_string()
        });

        Self {
            access_secret,
            refresh_secret,
            issuer: non_empty("JWT_ISSUER").unwrap_or_else(|| "reppy".to_string()),
            access_ttl: chrono::Duration::seconds(parse_or("ACCESS_TOKEN_TTL_SECS", 15 * 60)),
            refresh_ttl: chrono::Duration::seconds(parse_or(
                "REFRESH_TOKEN_TTL_SECS",
                7 * 24 * 60 * 60,
            )),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: DEFAULT_ACCESS_SECRET.to_string(),
            refresh_secret: DEFAULT_REFRESH_SECRET.to_string(),
            issuer: "reppy".to_string(),
            access_ttl: chrono::Duration::minutes(15),
            refresh_ttl: chrono::Duration::days(7),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            per_second: parse_or("RATE_LIMIT_PER_SEC", 10.0),
            burst: parse_or("RATE_LIMIT_BURST", 20.0),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 10.0,
            burst: 20.0,
        }
    }
}

impl Default for EnvConfig {
    /// 不读取环境变量的默认配置（测试使用）
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            jwt: JwtConfig::default(),
            rate_limit: RateLimitConfig::default(),
            oauth: OAuthConfig::default(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            data_dir: None,
            static_dir: PathBuf::from("public"),
            seed_test_data: true,
        }
    }
}

/// 解析逗号分隔的主机名列表，统一小写
pub fn parse_host_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid value in environment, using default");
            default
        }),
        Err(_) => default,
    }
}

/// bcrypt cost 超出 bcrypt 支持范围时截断
fn parse_bcrypt_cost(key: &str) -> u32 {
    parse_or(key, bcrypt::DEFAULT_COST)
        .clamp(constants::MIN_BCRYPT_COST, constants::MAX_BCRYPT_COST)
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(default)
}

/// 常量
pub mod constants {
    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// 服务名
    pub const SERVICE_NAME: &str = "reppy";

    /// 数据快照文件名
    pub const SNAPSHOT_FILE_NAME: &str = "reppy-db.json";

    /// 限流桶空闲多久后回收（秒）
    pub const RATE_LIMIT_IDLE_SECS: u64 = 10 * 60;

    /// 后台清理任务间隔（秒）
    pub const SWEEP_INTERVAL_SECS: u64 = 60;

    /// bcrypt 允许的最小 cost
    pub const MIN_BCRYPT_COST: u32 = 4;

    /// bcrypt 允许的最大 cost
    pub const MAX_BCRYPT_COST: u32 = 31;
}
