//! # テスト用インメモリ実装
//!
//! サービス層のテストで使用する。`test-utils` feature を有効にすると
//! 他クレートからも利用できる。
//!
//! ```toml
//! [dev-dependencies]
//! authcode-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use authcode_domain::{
    auth_code::{AuthCode, AuthCodeChallenge},
    auth_token::{AuthToken, TokenClaims},
    recipient::Recipient,
};
use chrono::{DateTime, Utc};

use crate::{
    AuthCodeStore,
    CodeGenerator,
    CodeNotifier,
    InfraError,
    ReadinessProbe,
    TokenStore,
};

// ===== InMemoryAuthCodeStore =====

/// TTL は記録するだけで失効はさせない（期限判定はドメイン側で行われる）
#[derive(Clone, Default)]
pub struct InMemoryAuthCodeStore {
    challenges: Arc<Mutex<HashMap<String, (AuthCodeChallenge, u64)>>>,
}

impl InMemoryAuthCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存時に指定された TTL を返す
    pub fn ttl_of(&self, recipient: &Recipient) -> Option<u64> {
        self.challenges
            .lock()
            .unwrap()
            .get(recipient.as_str())
            .map(|(_, ttl)| *ttl)
    }

    pub fn len(&self) -> usize {
        self.challenges.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuthCodeStore for InMemoryAuthCodeStore {
    async fn save(
        &self,
        challenge: &AuthCodeChallenge,
        ttl_seconds: u64,
    ) -> Result<(), InfraError> {
        self.challenges.lock().unwrap().insert(
            challenge.recipient().as_str().to_string(),
            (challenge.clone(), ttl_seconds),
        );
        Ok(())
    }

    async fn update_with_attempts_check(
        &self,
        challenge: &AuthCodeChallenge,
        expected_failed_attempts: u32,
        ttl_seconds: u64,
    ) -> Result<(), InfraError> {
        let mut challenges = self.challenges.lock().unwrap();
        let entry = challenges
            .get_mut(challenge.recipient().as_str())
            .filter(|entry| {
                let stored = &entry.0;
                stored.id() == challenge.id()
                    && stored.failed_attempts() == expected_failed_attempts
            })
            .ok_or_else(|| {
                InfraError::conflict("AuthCodeChallenge", challenge.id().to_string())
            })?;
        *entry = (challenge.clone(), ttl_seconds);
        Ok(())
    }

    async fn find(&self, recipient: &Recipient) -> Result<Option<AuthCodeChallenge>, InfraError> {
        Ok(self
            .challenges
            .lock()
            .unwrap()
            .get(recipient.as_str())
            .map(|(c, _)| c.clone()))
    }

    async fn take(&self, recipient: &Recipient) -> Result<Option<AuthCodeChallenge>, InfraError> {
        Ok(self
            .challenges
            .lock()
            .unwrap()
            .remove(recipient.as_str())
            .map(|(c, _)| c))
    }

    async fn delete(&self, recipient: &Recipient) -> Result<(), InfraError> {
        self.challenges.lock().unwrap().remove(recipient.as_str());
        Ok(())
    }
}

// ===== InMemoryTokenStore =====

#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<Mutex<HashMap<String, TokenClaims>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn save(
        &self,
        token: &AuthToken,
        claims: &TokenClaims,
        _ttl_seconds: u64,
    ) -> Result<(), InfraError> {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.as_str().to_string(), claims.clone());
        Ok(())
    }

    async fn find(&self, token: &AuthToken) -> Result<Option<TokenClaims>, InfraError> {
        Ok(self.tokens.lock().unwrap().get(token.as_str()).cloned())
    }

    async fn revoke(&self, token: &AuthToken) -> Result<(), InfraError> {
        self.tokens.lock().unwrap().remove(token.as_str());
        Ok(())
    }
}

// ===== FixedCodeGenerator =====

/// 常に同じコードを返す生成器
#[derive(Debug, Clone)]
pub struct FixedCodeGenerator {
    code: String,
}

impl FixedCodeGenerator {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self, length: usize) -> Result<AuthCode, InfraError> {
        AuthCode::parse(&self.code, length).map_err(|e| InfraError::unexpected(e.to_string()))
    }
}

// ===== RecordingNotifier =====

/// 送信内容を記録する送信実装
///
/// `fail` を有効にすると送信エラーを返す。
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(Recipient, String)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// 記録済みの (送信先, コード) 一覧
    pub fn sent(&self) -> Vec<(Recipient, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeNotifier for RecordingNotifier {
    async fn send(
        &self,
        recipient: &Recipient,
        code: &AuthCode,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        if self.fail {
            return Err(InfraError::notification("送信に失敗しました"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), code.as_str().to_string()));
        Ok(())
    }
}

// ===== StaticReadinessProbe =====

/// 固定の結果を返す Probe
#[derive(Debug, Clone, Copy)]
pub struct StaticReadinessProbe {
    healthy: bool,
}

impl StaticReadinessProbe {
    pub fn healthy() -> Self {
        Self { healthy: true }
    }

    pub fn unhealthy() -> Self {
        Self { healthy: false }
    }
}

#[async_trait]
impl ReadinessProbe for StaticReadinessProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), InfraError> {
        if self.healthy {
            Ok(())
        } else {
            Err(InfraError::unexpected("PING に応答がありません"))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn challenge(email: &str) -> AuthCodeChallenge {
        AuthCodeChallenge::issue(
            Recipient::parse(email).unwrap(),
            AuthCode::parse("123456", 6).unwrap(),
            Utc::now(),
            TimeDelta::minutes(5),
            3,
        )
    }

    #[tokio::test]
    async fn test_takeは一度だけチャレンジを返す() {
        let store = InMemoryAuthCodeStore::new();
        let challenge = challenge("alice@example.com");
        store.save(&challenge, 300).await.unwrap();

        let first = store.take(challenge.recipient()).await.unwrap();
        let second = store.take(challenge.recipient()).await.unwrap();

        assert_eq!(first.map(|c| c.id()), Some(challenge.id()));
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_試行回数が読み取り時と同じなら書き戻せる() {
        let store = InMemoryAuthCodeStore::new();
        let mut challenge = challenge("alice@example.com");
        store.save(&challenge, 300).await.unwrap();
        let _ = challenge.verify(&AuthCode::parse("000000", 6).unwrap(), Utc::now());

        store
            .update_with_attempts_check(&challenge, 0, 200)
            .await
            .unwrap();

        let stored = store.find(challenge.recipient()).await.unwrap().unwrap();
        assert_eq!(stored.failed_attempts(), 1);
        assert_eq!(store.ttl_of(challenge.recipient()), Some(200));
    }

    #[tokio::test]
    async fn test_消費済みや更新済みのチャレンジへの書き戻しはconflict() {
        let store = InMemoryAuthCodeStore::new();
        let mut challenge = challenge("alice@example.com");
        store.save(&challenge, 300).await.unwrap();
        let _ = challenge.verify(&AuthCode::parse("000000", 6).unwrap(), Utc::now());

        // 他のリクエストが先に試行回数を書き戻した
        store
            .update_with_attempts_check(&challenge, 0, 300)
            .await
            .unwrap();
        let stale = store.update_with_attempts_check(&challenge, 0, 300).await;

        // 他のリクエストが先に消費した
        store.take(challenge.recipient()).await.unwrap();
        let consumed = store.update_with_attempts_check(&challenge, 1, 300).await;

        assert!(stale.is_err_and(|e| e.is_conflict()));
        assert!(consumed.is_err_and(|e| e.is_conflict()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_再発行されたチャレンジへの書き戻しはconflict() {
        let store = InMemoryAuthCodeStore::new();
        let mut old = challenge("alice@example.com");
        store.save(&old, 300).await.unwrap();
        let newer = challenge("alice@example.com");
        store.save(&newer, 300).await.unwrap();
        let _ = old.verify(&AuthCode::parse("000000", 6).unwrap(), Utc::now());

        let result = store.update_with_attempts_check(&old, 0, 300).await;

        assert!(result.is_err_and(|e| e.is_conflict()));
        let stored = store.find(newer.recipient()).await.unwrap().unwrap();
        assert_eq!(stored.id(), newer.id());
        assert_eq!(stored.failed_attempts(), 0);
    }

    #[tokio::test]
    async fn test_同じ送信先への保存は上書きになる() {
        let store = InMemoryAuthCodeStore::new();
        store.save(&challenge("alice@example.com"), 300).await.unwrap();
        let newer = challenge("alice@example.com");

        store.save(&newer, 120).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.ttl_of(newer.recipient()), Some(120));
    }
}
