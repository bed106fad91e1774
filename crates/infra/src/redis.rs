//! # Redis 接続管理
//!
//! チャレンジストア・トークンストア・Readiness Probe が共有する
//! `ConnectionManager` を作成する。
//!
//! `ConnectionManager` は切断時に自動で再接続し、clone して複数タスクから
//! 使える。起動時に一度だけ作成し、各ストアに clone を渡す。

use redis::{Client, aio::ConnectionManager};

use crate::InfraError;

/// Redis 接続マネージャを作成する
///
/// `redis_url` は `redis://[[username:]password@]host[:port][/database]`
/// 形式（TLS は `rediss://`）。
pub async fn create_connection_manager(redis_url: &str) -> Result<ConnectionManager, InfraError> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    tracing::debug!("Redis に接続しました");
    Ok(manager)
}
