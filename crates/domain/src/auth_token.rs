//! # アクセストークン
//!
//! 認証コードの検証に成功した送信先へ発行する不透明なベアラートークン。
//! トークン自体は情報を持たず、クレームはストア側に保存する。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, recipient::Recipient};

/// トークン生成に使うランダムバイト数
const TOKEN_BYTES: usize = 32;

/// 受け付けるトークン文字列の最大長
const MAX_TOKEN_LENGTH: usize = 128;

/// アクセストークン
///
/// # セキュリティ
///
/// Debug 出力ではトークンの値をマスクする。
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuthToken").field(&"[REDACTED]").finish()
    }
}

impl AuthToken {
    /// 暗号論的乱数から新しいトークンを生成する
    pub fn generate() -> Self {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// クライアントから受け取ったトークン文字列を検証する
    ///
    /// 形式のみを検証し、存在確認はストアで行う。
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let well_formed = !trimmed.is_empty()
            && trimmed.len() <= MAX_TOKEN_LENGTH
            && trimmed
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !well_formed {
            return Err(DomainError::Validation(
                "トークンの形式が不正です".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// トークンに紐づくクレーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub recipient:  Recipient,
    pub issued_at:  DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    pub fn issue(recipient: Recipient, now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            recipient,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    /// `now` 時点で有効か
    ///
    /// ストアの TTL とは独立に判定する。
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_生成したトークンはパースできる() {
        let token = AuthToken::generate();

        let parsed = AuthToken::parse(token.as_str()).unwrap();

        assert_eq!(parsed, token);
        assert_eq!(token.as_str().len(), 43);
    }

    #[rstest]
    fn test_生成したトークンは毎回異なる() {
        assert_ne!(AuthToken::generate(), AuthToken::generate());
    }

    #[rstest]
    #[case("")]
    #[case("has space")]
    #[case("padded==")]
    #[case(&"a".repeat(129))]
    fn test_不正な形式のトークンはバリデーションエラー(#[case] raw: &str) {
        assert!(AuthToken::parse(raw).is_err());
    }

    #[rstest]
    fn test_トークンのdebug出力はマスクされる() {
        let token = AuthToken::parse("secret-token_value").unwrap();

        let debug = format!("{token:?}");

        assert!(!debug.contains("secret-token_value"));
    }

    #[rstest]
    fn test_クレームは期限まで有効() {
        let now = Utc::now();
        let claims = TokenClaims::issue(
            Recipient::parse("alice@example.com").unwrap(),
            now,
            TimeDelta::hours(1),
        );

        assert!(claims.is_active(now));
        assert!(claims.is_active(now + TimeDelta::minutes(59)));
        assert!(!claims.is_active(now + TimeDelta::hours(1)));
    }
}
