//! # アクセストークンの保存
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `auth_token:{token}` | TokenClaims (JSON) | トークンの有効期限まで |

use async_trait::async_trait;
use authcode_domain::auth_token::{AuthToken, TokenClaims};
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::InfraError;

/// アクセストークンのストア
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// トークンとクレームを保存する
    async fn save(
        &self,
        token: &AuthToken,
        claims: &TokenClaims,
        ttl_seconds: u64,
    ) -> Result<(), InfraError>;

    /// トークンのクレームを取得する
    async fn find(&self, token: &AuthToken) -> Result<Option<TokenClaims>, InfraError>;

    /// トークンを失効させる（存在しなくても成功）
    async fn revoke(&self, token: &AuthToken) -> Result<(), InfraError>;
}

/// Redis を使用したトークンストア
pub struct RedisTokenStore {
    conn: ConnectionManager,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(token: &AuthToken) -> String {
        format!("auth_token:{}", token.as_str())
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn save(
        &self,
        token: &AuthToken,
        claims: &TokenClaims,
        ttl_seconds: u64,
    ) -> Result<(), InfraError> {
        let key = Self::key(token);
        let json = serde_json::to_string(claims)?;

        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(&key, json, ttl_seconds).await?;
        Ok(())
    }

    async fn find(&self, token: &AuthToken) -> Result<Option<TokenClaims>, InfraError> {
        let key = Self::key(token);
        let mut conn = self.conn.clone();

        let result: Option<String> = conn.get(&key).await?;
        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: &AuthToken) -> Result<(), InfraError> {
        let key = Self::key(token);
        let mut conn = self.conn.clone();
        let _: () = conn.del(&key).await?;
        Ok(())
    }
}
