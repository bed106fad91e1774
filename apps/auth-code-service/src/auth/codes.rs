//! # 認証コードの発行
//!
//! ```text
//! email ──▶ 再発行間隔チェック ──▶ 生成 ──▶ 保存（TTL 付き）──▶ 送信
//!                                              ▲                 │ 失敗
//!                                              └──── 削除 ◀──────┘
//! ```
//!
//! 送信に失敗したチャレンジは削除し、再発行間隔の対象にしない。

use std::sync::Arc;

use authcode_domain::{auth_code::AuthCodeChallenge, recipient::Recipient};
use serde::{Deserialize, Serialize};

use crate::{deps::AuthDeps, error::AuthCodeError};

#[derive(Debug, Deserialize)]
pub struct RequestAuthCodeRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RequestAuthCodeResponse {
    /// コードの有効期限（秒）
    pub expires_in: u64,
}

/// 認証コードを発行して送信する
pub async fn request_auth_code(
    deps: Arc<AuthDeps>,
    request: RequestAuthCodeRequest,
) -> Result<RequestAuthCodeResponse, AuthCodeError> {
    let recipient = Recipient::parse(&request.email)?;
    let settings = &deps.settings;
    let now = deps.clock.now();

    if let Some(existing) = deps.code_store.find(&recipient).await?
        && let Some(wait) = existing.resend_wait(now, settings.resend_interval())
    {
        let retry_after_seconds = u64::try_from(wait.num_seconds()).unwrap_or(0).max(1);
        tracing::info!(
            recipient = %recipient,
            retry_after_seconds,
            "再発行間隔内のリクエストを拒否しました"
        );
        return Err(AuthCodeError::ResendTooSoon {
            retry_after_seconds,
        });
    }

    let code = deps.code_generator.generate(settings.code_length)?;
    let challenge = AuthCodeChallenge::issue(
        recipient,
        code,
        now,
        settings.code_ttl(),
        settings.max_attempts,
    );
    deps.code_store
        .save(&challenge, u64::from(settings.code_ttl_seconds))
        .await?;

    if let Err(e) = deps
        .notifier
        .send(challenge.recipient(), challenge.code(), challenge.expires_at())
        .await
    {
        if let Err(cleanup) = deps.code_store.delete(challenge.recipient()).await {
            tracing::warn!(error = %cleanup, "送信失敗後のチャレンジ削除に失敗しました");
        }
        return Err(e.into());
    }

    tracing::info!(
        recipient = %challenge.recipient(),
        challenge_id = %challenge.id(),
        "認証コードを発行しました"
    );

    Ok(RequestAuthCodeResponse {
        expires_in: u64::from(settings.code_ttl_seconds),
    })
}

#[cfg(test)]
mod tests {
    use authcode_infra::mock::RecordingNotifier;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        config::AuthCodeSettings,
        test_utils::{FIXED_CODE, TestDeps},
    };

    fn request(email: &str) -> RequestAuthCodeRequest {
        RequestAuthCodeRequest {
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_コードを発行して送信する() {
        // Given
        let t = TestDeps::default();

        // When
        let response = request_auth_code(t.deps.clone(), request("Alice@Example.com"))
            .await
            .unwrap();

        // Then
        let alice = Recipient::parse("alice@example.com").unwrap();
        assert_eq!(response.expires_in, 300);
        assert_eq!(t.notifier.sent(), vec![(alice.clone(), FIXED_CODE.to_string())]);
        assert_eq!(t.code_store.ttl_of(&alice), Some(300));
    }

    #[tokio::test]
    async fn test_不正なメールアドレスはinvalid_request() {
        let t = TestDeps::default();

        let result = request_auth_code(t.deps.clone(), request("not-an-email")).await;

        assert!(matches!(result, Err(AuthCodeError::InvalidRequest(_))));
        assert!(t.code_store.is_empty());
    }

    #[tokio::test]
    async fn test_再発行間隔内はresend_too_soon() {
        // Given: 10 秒前に発行済み
        let t = TestDeps::default();
        request_auth_code(t.deps.clone(), request("alice@example.com"))
            .await
            .unwrap();
        t.clock.advance(TimeDelta::seconds(10));

        // When
        let result = request_auth_code(t.deps.clone(), request("alice@example.com")).await;

        // Then
        assert!(matches!(
            result,
            Err(AuthCodeError::ResendTooSoon {
                retry_after_seconds: 20
            })
        ));
        assert_eq!(t.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_再発行間隔を過ぎれば上書き発行できる() {
        let t = TestDeps::default();
        request_auth_code(t.deps.clone(), request("alice@example.com"))
            .await
            .unwrap();
        t.clock.advance(TimeDelta::seconds(30));

        let result = request_auth_code(t.deps.clone(), request("alice@example.com")).await;

        assert!(result.is_ok());
        assert_eq!(t.notifier.sent().len(), 2);
        assert_eq!(t.code_store.len(), 1);
    }

    #[tokio::test]
    async fn test_送信失敗時はチャレンジを残さない() {
        let t = TestDeps::with(AuthCodeSettings::default(), RecordingNotifier::failing());

        let result = request_auth_code(t.deps.clone(), request("alice@example.com")).await;

        assert!(matches!(result, Err(AuthCodeError::Infra(_))));
        assert!(t.code_store.is_empty());
    }
}
