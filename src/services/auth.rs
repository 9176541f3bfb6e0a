//! JWT 令牌服务
//!
//! 签发与校验 access/refresh 令牌对，并维护注销令牌黑名单

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::JwtConfig;

/// 令牌类型
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub token_type: TokenType,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub iss: String,
}

/// 登录/刷新返回的令牌对
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// 令牌校验错误
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Failed to sign token")]
    Signing,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT 服务
pub struct JwtService {
    config: JwtConfig,
    access: Keys,
    refresh: Keys,
    /// 已注销令牌 (jti -> exp)
    blacklist: RwLock<HashMap<String, i64>>,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            access: Keys::new(&config.access_secret),
            refresh: Keys::new(&config.refresh_secret),
            config,
            blacklist: RwLock::new(HashMap::new()),
        }
    }

    fn keys(&self, token_type: TokenType) -> &Keys {
        match token_type {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    fn sign(&self, user_id: i32, token_type: TokenType) -> Result<String, TokenError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.config.access_ttl,
            TokenType::Refresh => self.config.refresh_ttl,
        };
        let claims = Claims {
            user_id,
            token_type,
            jti: Uuid::new_v4().to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys(token_type).encoding,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            TokenError::Signing
        })
    }

    /// 签发令牌对
    pub fn generate_pair(&self, user_id: i32) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, TokenType::Access)?,
            refresh_token: self.sign(user_id, TokenType::Refresh)?,
        })
    }

    async fn validate(&self, token: &str, token_type: TokenType) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.keys(token_type).decoding, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => {
                    debug!(error = %e, "Token rejected");
                    TokenError::Invalid
                }
            },
        )?;

        let claims = data.claims;
        if claims.token_type != token_type {
            return Err(TokenError::Invalid);
        }
        if self.blacklist.read().await.contains_key(&claims.jti) {
            debug!(jti = %claims.jti, "Blacklisted token presented");
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    pub async fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate(token, TokenType::Access).await
    }

    pub async fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate(token, TokenType::Refresh).await
    }

    /// 注销令牌，直到其过期前都不再可用
    ///
    /// 返回 false 表示令牌已经被注销过
    pub async fn invalidate(&self, claims: &Claims) -> bool {
        self.blacklist
            .write()
            .await
            .insert(claims.jti.clone(), claims.exp)
            .is_none()
    }

    /// 清理已过期的黑名单条目，返回清理数量
    pub async fn sweep(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut blacklist = self.blacklist.write().await;
        let before = blacklist.len();
        blacklist.retain(|_, exp| *exp > now);
        before - blacklist.len()
    }

    pub async fn blacklist_len(&self) -> usize {
        self.blacklist.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig::default())
    }

    #[tokio::test]
    async fn test_generate_and_validate_pair() {
        let jwt = service();
        let pair = jwt.generate_pair(7).unwrap();

        let access = jwt.validate_access(&pair.access_token).await.unwrap();
        assert_eq!(access.user_id, 7);
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(access.iss, "reppy");

        let refresh = jwt.validate_refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_ne!(access.jti, refresh.jti);
    }

    #[tokio::test]
    async fn test_token_types_are_not_interchangeable() {
        let jwt = service();
        let pair = jwt.generate_pair(1).unwrap();
        assert_eq!(
            jwt.validate_access(&pair.refresh_token).await.unwrap_err(),
            TokenError::Invalid
        );
        assert_eq!(
            jwt.validate_refresh(&pair.access_token).await.unwrap_err(),
            TokenError::Invalid
        );
        assert_eq!(
            jwt.validate_access("not.a.jwt").await.unwrap_err(),
            TokenError::Invalid
        );
    }

    #[tokio::test]
    async fn test_expired_token() {
        let jwt = JwtService::new(JwtConfig {
            access_ttl: chrono::Duration::seconds(-120),
            ..JwtConfig::default()
        });
        let pair = jwt.generate_pair(1).unwrap();
        let err = jwt.validate_access(&pair.access_token).await.unwrap_err();
        assert_eq!(err, TokenError::Expired);
        assert_eq!(err.to_string(), "Token has expired");
    }

    #[tokio::test]
    async fn test_wrong_issuer_rejected() {
        let issuer_a = service();
        let issuer_b = JwtService::new(JwtConfig {
            issuer: "someone-else".into(),
            ..JwtConfig::default()
        });
        let pair = issuer_b.generate_pair(1).unwrap();
        assert!(issuer_a.validate_access(&pair.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_and_sweep() {
        let jwt = service();
        let pair = jwt.generate_pair(3).unwrap();
        let claims = jwt.validate_refresh(&pair.refresh_token).await.unwrap();

        assert!(jwt.invalidate(&claims).await);
        assert!(!jwt.invalidate(&claims).await);
        assert_eq!(
            jwt.validate_refresh(&pair.refresh_token).await.unwrap_err(),
            TokenError::Invalid
        );

        // 未过期的条目不会被清理
        assert_eq!(jwt.sweep().await, 0);

        let expired = Claims {
            jti: "old".into(),
            exp: Utc::now().timestamp() - 10,
            ..claims
        };
        jwt.invalidate(&expired).await;
        assert_eq!(jwt.sweep().await, 1);
        assert_eq!(jwt.blacklist_len().await, 1);
    }
}
