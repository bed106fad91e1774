//! # Readiness Probe
//!
//! `/health/ready` から依存先の疎通を確認する。

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::InfraError;

/// 依存先の疎通確認
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// チェック名（Readiness レスポンスの `checks` のキー）
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), InfraError>;
}

/// Redis に `PING` を送る Probe
pub struct RedisReadinessProbe {
    conn: ConnectionManager,
}

impl RedisReadinessProbe {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ReadinessProbe for RedisReadinessProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
