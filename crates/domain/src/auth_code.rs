//! # 認証コード
//!
//! メールで送るワンタイム認証コードと、その検証状態を持つチャレンジ。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`AuthCode`] | 認証コード | 数字のみのワンタイムコード |
//! | [`AuthCodeChallenge`] | チャレンジ | 発行済みコードと試行回数・有効期限 |
//! | [`ChallengeError`] | 検証失敗 | 期限切れ・試行回数超過・不一致 |
//!
//! ## 不変条件
//!
//! - 1 つの送信先に有効なチャレンジは高々 1 つ（ストアのキーが送信先）
//! - `failed_attempts` が `max_attempts` に達したチャレンジは二度と成功しない
//! - 有効期限を過ぎたチャレンジは正しいコードでも成功しない

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::{DomainError, recipient::Recipient};

/// 認証コードの桁数として許容する範囲
pub const CODE_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 4..=9;

/// 認証コード
///
/// # セキュリティ
///
/// Debug 出力ではコードの値をマスクする。比較は定数時間で行う。
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthCode(String);

impl std::fmt::Debug for AuthCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AuthCode").field(&"[REDACTED]").finish()
    }
}

impl AuthCode {
    /// 入力文字列を `length` 桁の認証コードとして検証する
    pub fn parse(raw: &str, length: usize) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.len() != length || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::Validation(format!(
                "認証コードは {length} 桁の数字で入力してください"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 定数時間で比較する
    pub fn matches(&self, other: &AuthCode) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// チャレンジの検証失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("認証コードの有効期限が切れています")]
    Expired,

    #[error("認証コードの試行回数が上限に達しました")]
    AttemptsExhausted,

    #[error("認証コードが一致しません（残り {remaining} 回）")]
    Mismatch { remaining: u32 },
}

/// 発行済みの認証コードとその検証状態
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCodeChallenge {
    id:              Uuid,
    recipient:       Recipient,
    code:            AuthCode,
    created_at:      DateTime<Utc>,
    expires_at:      DateTime<Utc>,
    failed_attempts: u32,
    max_attempts:    u32,
}

impl AuthCodeChallenge {
    /// 新しいチャレンジを発行する
    pub fn issue(
        recipient: Recipient,
        code: AuthCode,
        now: DateTime<Utc>,
        ttl: TimeDelta,
        max_attempts: u32,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            recipient,
            code,
            created_at: now,
            expires_at: now + ttl,
            failed_attempts: 0,
            max_attempts,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn code(&self) -> &AuthCode {
        &self.code
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// 入力コードを検証する
    ///
    /// 不一致の場合は `failed_attempts` を加算する。呼び出し側は
    /// 加算後の状態をストアへ書き戻す必要がある。
    pub fn verify(&mut self, input: &AuthCode, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        if now >= self.expires_at {
            return Err(ChallengeError::Expired);
        }
        if self.failed_attempts >= self.max_attempts {
            return Err(ChallengeError::AttemptsExhausted);
        }
        if self.code.matches(input) {
            return Ok(());
        }

        self.failed_attempts += 1;
        match self.max_attempts.saturating_sub(self.failed_attempts) {
            0 => Err(ChallengeError::AttemptsExhausted),
            remaining => Err(ChallengeError::Mismatch { remaining }),
        }
    }

    /// 有効期限までの残り秒数（最小 1 秒）
    ///
    /// 不一致時の書き戻しで TTL を延ばさないために使う。
    pub fn remaining_ttl_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.expires_at - now).num_seconds().max(1)).unwrap_or(1)
    }

    /// 再送可能になるまでの待ち時間
    ///
    /// 発行から `interval` 以上経過していれば `None`。
    pub fn resend_wait(&self, now: DateTime<Utc>, interval: TimeDelta) -> Option<TimeDelta> {
        let elapsed = now - self.created_at;
        (elapsed < interval).then(|| interval - elapsed)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    fn code(raw: &str) -> AuthCode {
        AuthCode::parse(raw, 6).unwrap()
    }

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-15T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[fixture]
    fn challenge(now: DateTime<Utc>) -> AuthCodeChallenge {
        AuthCodeChallenge::issue(
            Recipient::parse("alice@example.com").unwrap(),
            code("123456"),
            now,
            TimeDelta::minutes(5),
            3,
        )
    }

    #[rstest]
    #[case("123456")]
    #[case(" 000001 ")]
    fn test_桁数が一致する数字はパースできる(#[case] raw: &str) {
        assert!(AuthCode::parse(raw, 6).is_ok());
    }

    #[rstest]
    #[case("12345")]
    #[case("1234567")]
    #[case("12a456")]
    #[case("")]
    fn test_桁数違いや数字以外はバリデーションエラー(#[case] raw: &str) {
        assert!(matches!(
            AuthCode::parse(raw, 6),
            Err(DomainError::Validation(_))
        ));
    }

    #[rstest]
    fn test_認証コードのdebug出力はマスクされる() {
        let debug = format!("{:?}", code("987654"));

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("987654"));
    }

    #[rstest]
    fn test_一致するコードで検証に成功する(mut challenge: AuthCodeChallenge, now: DateTime<Utc>) {
        assert_eq!(challenge.verify(&code("123456"), now), Ok(()));
        assert_eq!(challenge.failed_attempts(), 0);
    }

    #[rstest]
    fn test_不一致で残り回数が減る(mut challenge: AuthCodeChallenge, now: DateTime<Utc>) {
        assert_eq!(
            challenge.verify(&code("000000"), now),
            Err(ChallengeError::Mismatch { remaining: 2 })
        );
        assert_eq!(
            challenge.verify(&code("000000"), now),
            Err(ChallengeError::Mismatch { remaining: 1 })
        );
        assert_eq!(challenge.failed_attempts(), 2);
    }

    #[rstest]
    fn test_最後の不一致で試行回数超過になる(
        mut challenge: AuthCodeChallenge,
        now: DateTime<Utc>,
    ) {
        let _ = challenge.verify(&code("000000"), now);
        let _ = challenge.verify(&code("000000"), now);

        assert_eq!(
            challenge.verify(&code("000000"), now),
            Err(ChallengeError::AttemptsExhausted)
        );
    }

    #[rstest]
    fn test_試行回数超過後は正しいコードでも失敗する(
        mut challenge: AuthCodeChallenge,
        now: DateTime<Utc>,
    ) {
        for _ in 0..3 {
            let _ = challenge.verify(&code("000000"), now);
        }

        assert_eq!(
            challenge.verify(&code("123456"), now),
            Err(ChallengeError::AttemptsExhausted)
        );
    }

    #[rstest]
    fn test_有効期限ちょうどで期限切れになる(
        mut challenge: AuthCodeChallenge,
        now: DateTime<Utc>,
    ) {
        let at_expiry = now + TimeDelta::minutes(5);

        assert_eq!(
            challenge.verify(&code("123456"), at_expiry),
            Err(ChallengeError::Expired)
        );
    }

    #[rstest]
    fn test_残りttlは期限までの秒数で最小1秒(challenge: AuthCodeChallenge, now: DateTime<Utc>) {
        assert_eq!(challenge.remaining_ttl_seconds(now), 300);
        assert_eq!(
            challenge.remaining_ttl_seconds(now + TimeDelta::minutes(10)),
            1
        );
    }

    #[rstest]
    fn test_再送間隔内は待ち時間を返す(challenge: AuthCodeChallenge, now: DateTime<Utc>) {
        let wait = challenge.resend_wait(now + TimeDelta::seconds(10), TimeDelta::seconds(30));

        assert_eq!(wait, Some(TimeDelta::seconds(20)));
    }

    #[rstest]
    fn test_再送間隔を過ぎればnone(challenge: AuthCodeChallenge, now: DateTime<Utc>) {
        let wait = challenge.resend_wait(now + TimeDelta::seconds(30), TimeDelta::seconds(30));

        assert_eq!(wait, None);
    }

    #[rstest]
    fn test_jsonで往復しても状態が保たれる(mut challenge: AuthCodeChallenge, now: DateTime<Utc>) {
        let _ = challenge.verify(&code("000000"), now);

        let json = serde_json::to_string(&challenge).unwrap();
        let restored: AuthCodeChallenge = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id(), challenge.id());
        assert_eq!(restored.failed_attempts(), 1);
        assert!(restored.code().matches(&code("123456")));
    }
}
