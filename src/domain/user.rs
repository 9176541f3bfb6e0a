//! 用户与用户资料领域模型

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 用户
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    /// bcrypt 哈希，只写入快照，不出现在 API 响应中
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password_hash: String,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API 响应中的用户（不含密码哈希）
#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    pub user_id: i32,
    pub email: String,
    pub username: String,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            username: user.username,
            active: user.active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// 新建用户参数（密码已哈希）
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// 用户更新参数，`None` 表示保持不变
#[derive(Clone, Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// 注册请求
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

/// 更新用户请求
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

/// 用户资料
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub profile_id: i32,
    pub user_id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_inches: Option<i32>,
    pub weight_pounds: Option<i32>,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 用户资料可写字段
///
/// 新建时作为初始值，更新时 `None` 表示保持不变
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_inches: Option<i32>,
    pub weight_pounds: Option<i32>,
    pub profile_picture_url: Option<String>,
}

/// 创建/更新用户资料请求
///
/// `date_of_birth` 以字符串接收，以便返回明确的日期格式错误
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub user_id: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub height_inches: Option<i32>,
    pub weight_pounds: Option<i32>,
    pub profile_picture_url: Option<String>,
}

impl ProfileRequest {
    /// 校验并转换为可写字段
    pub fn into_fields(self) -> Result<ProfileFields, String> {
        let date_of_birth = match self.date_of_birth.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date(raw).ok_or_else(|| {
                "Invalid date format for date_of_birth; use YYYY-MM-DD".to_string()
            })?),
        };

        if let Some(dob) = date_of_birth {
            if dob > Utc::now().date_naive() {
                return Err("date_of_birth cannot be in the future".to_string());
            }
        }
        if matches!(self.height_inches, Some(h) if h <= 0) {
            return Err("height_inches must be positive".to_string());
        }
        if matches!(self.weight_pounds, Some(w) if w <= 0) {
            return Err("weight_pounds must be positive".to_string());
        }

        Ok(ProfileFields {
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            date_of_birth,
            gender: trimmed(self.gender),
            height_inches: self.height_inches,
            weight_pounds: self.weight_pounds,
            profile_picture_url: trimmed(self.profile_picture_url),
        })
    }
}

/// 解析 `YYYY-MM-DD`
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 密码最小长度
pub const MIN_PASSWORD_LEN: usize = 8;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    })
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("username regex is valid"))
}

/// 校验邮箱格式
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_regex().is_match(email)
}

/// 校验用户名：3-32 位字母、数字、`_` `.` `-`
pub fn is_valid_username(username: &str) -> bool {
    username_regex().is_match(username)
}

/// 校验密码强度
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// 邮箱统一小写存储
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
