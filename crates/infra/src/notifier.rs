//! # 認証コードの送信
//!
//! 送信バックエンドは [`CodeNotifier`] トレイトで抽象化する。
//! 現在の実装は [`LogCodeNotifier`]（ログ出力のみ）。

use async_trait::async_trait;
use authcode_domain::{auth_code::AuthCode, recipient::Recipient};
use chrono::{DateTime, Utc};

use crate::InfraError;

/// 認証コード送信トレイト
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    /// 認証コードを送信先に届ける
    async fn send(
        &self,
        recipient: &Recipient,
        code: &AuthCode,
        expires_at: DateTime<Utc>,
    ) -> Result<(), InfraError>;
}

/// ログ出力のみ行う送信実装
///
/// コードの値はログに出さない。
#[derive(Debug, Clone, Default)]
pub struct LogCodeNotifier;

#[async_trait]
impl CodeNotifier for LogCodeNotifier {
    async fn send(
        &self,
        recipient: &Recipient,
        _code: &AuthCode,
        expires_at: DateTime<Utc>,
    ) -> Result<(), InfraError> {
        tracing::info!(
            recipient = %recipient,
            expires_at = %expires_at,
            "Log: 認証コードの送信をスキップ"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sendはエラーを返さない() {
        let recipient = Recipient::parse("alice@example.com").unwrap();
        let code = AuthCode::parse("123456", 6).unwrap();

        let result = LogCodeNotifier.send(&recipient, &code, Utc::now()).await;

        assert!(result.is_ok());
    }
}
