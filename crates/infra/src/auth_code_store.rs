//! # 認証コードチャレンジの保存
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `auth_code:{recipient}` | AuthCodeChallenge (JSON) | コードの有効期限まで |
//!
//! 送信先ごとに 1 キーのため、再発行は前のチャレンジを上書きする。
//!
//! ## 試行回数の書き戻し
//!
//! 不一致時の書き戻しは [`AuthCodeStore::update_with_attempts_check`] で行う。
//! 読み取り後に消費・再発行・他の不一致で更新されていれば `Conflict` を返し、
//! 消費済みのチャレンジを復活させたり、試行回数の加算を取りこぼしたりしない。
//! Redis 実装は Lua スクリプトで比較と書き込みをアトミックに行う。

use std::sync::LazyLock;

use async_trait::async_trait;
use authcode_domain::{auth_code::AuthCodeChallenge, recipient::Recipient};
use redis::{AsyncCommands, Script, aio::ConnectionManager};

use crate::InfraError;

/// 認証コードチャレンジのストア
#[async_trait]
pub trait AuthCodeStore: Send + Sync {
    /// チャレンジを保存する（同じ送信先の既存チャレンジは上書き）
    async fn save(
        &self,
        challenge: &AuthCodeChallenge,
        ttl_seconds: u64,
    ) -> Result<(), InfraError>;

    /// 楽観的ロック付きでチャレンジを書き戻す
    ///
    /// 保存済みチャレンジの ID と `failed_attempts` が読み取り時と一致する
    /// 場合のみ上書きする。キーが存在しない、または不一致の場合は
    /// `InfraError::Conflict` を返す。
    async fn update_with_attempts_check(
        &self,
        challenge: &AuthCodeChallenge,
        expected_failed_attempts: u32,
        ttl_seconds: u64,
    ) -> Result<(), InfraError>;

    /// 送信先のチャレンジを取得する
    async fn find(&self, recipient: &Recipient) -> Result<Option<AuthCodeChallenge>, InfraError>;

    /// 送信先のチャレンジを取得と同時に削除する
    ///
    /// 取得と削除はアトミックに行う。同じチャレンジを 2 つのリクエストが
    /// 同時に消費しようとした場合、`Some` を受け取るのは一方だけ。
    async fn take(&self, recipient: &Recipient) -> Result<Option<AuthCodeChallenge>, InfraError>;

    /// 送信先のチャレンジを削除する（存在しなくても成功）
    async fn delete(&self, recipient: &Recipient) -> Result<(), InfraError>;
}

/// KEYS[1]: チャレンジのキー
/// ARGV: 期待する ID, 期待する failed_attempts, 新しい値 (JSON), TTL 秒
static UPDATE_WITH_ATTEMPTS_CHECK: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        local current = redis.call('GET', KEYS[1])
        if not current then
            return 0
        end
        local stored = cjson.decode(current)
        if stored.id ~= ARGV[1] or tonumber(stored.failed_attempts) ~= tonumber(ARGV[2]) then
            return 0
        end
        redis.call('SET', KEYS[1], ARGV[3], 'EX', ARGV[4])
        return 1
        ",
    )
});

/// Redis を使用したチャレンジストア
pub struct RedisAuthCodeStore {
    conn: ConnectionManager,
}

impl RedisAuthCodeStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(recipient: &Recipient) -> String {
        format!("auth_code:{}", recipient.as_str())
    }
}

#[async_trait]
impl AuthCodeStore for RedisAuthCodeStore {
    async fn save(
        &self,
        challenge: &AuthCodeChallenge,
        ttl_seconds: u64,
    ) -> Result<(), InfraError> {
        let key = Self::key(challenge.recipient());
        let json = serde_json::to_string(challenge)?;

        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(&key, json, ttl_seconds).await?;
        Ok(())
    }

    async fn update_with_attempts_check(
        &self,
        challenge: &AuthCodeChallenge,
        expected_failed_attempts: u32,
        ttl_seconds: u64,
    ) -> Result<(), InfraError> {
        let key = Self::key(challenge.recipient());
        let json = serde_json::to_string(challenge)?;

        let mut conn = self.conn.clone();
        let updated: i64 = UPDATE_WITH_ATTEMPTS_CHECK
            .key(&key)
            .arg(challenge.id().to_string())
            .arg(expected_failed_attempts)
            .arg(json)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await?;

        if updated == 0 {
            return Err(InfraError::conflict(
                "AuthCodeChallenge",
                challenge.id().to_string(),
            ));
        }
        Ok(())
    }

    async fn find(&self, recipient: &Recipient) -> Result<Option<AuthCodeChallenge>, InfraError> {
        let key = Self::key(recipient);
        let mut conn = self.conn.clone();

        let result: Option<String> = conn.get(&key).await?;
        result
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(InfraError::from)
    }

    async fn take(&self, recipient: &Recipient) -> Result<Option<AuthCodeChallenge>, InfraError> {
        let key = Self::key(recipient);
        let mut conn = self.conn.clone();

        let result: Option<String> = redis::cmd("GETDEL").arg(&key).query_async(&mut conn).await?;
        result
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(InfraError::from)
    }

    async fn delete(&self, recipient: &Recipient) -> Result<(), InfraError> {
        let key = Self::key(recipient);
        let mut conn = self.conn.clone();
        let _: () = conn.del(&key).await?;
        Ok(())
    }
}
