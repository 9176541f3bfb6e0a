//! 密码哈希
//!
//! bcrypt 计算量较大，放到阻塞线程池执行

use anyhow::Context;

/// 计算密码哈希
pub async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task panicked")?
        .context("failed to hash password")
}

/// 校验密码，哈希格式错误视为不匹配
pub async fn verify_password(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
        Ok(Ok(matched)) => matched,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Password verification task failed");
            false
        }
    }
}
