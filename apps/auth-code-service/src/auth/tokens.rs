//! # 認証コードの検証とアクセストークン
//!
//! ## get_auth_token
//!
//! ```text
//! (email, code) ──▶ チャレンジ取得 ──▶ verify
//!                                      ├─ Expired           → 削除 → 401 code-expired
//!                                      ├─ AttemptsExhausted → 削除 → 429 too-many-attempts
//!                                      ├─ Mismatch          → 試行回数を書き戻し → 401
//!                                      │    （読み取り後に更新されていれば読み直して再検証）
//!                                      └─ Ok → take（アトミックに消費）→ トークン発行
//! ```
//!
//! 存在しない送信先と不一致は同じ `AuthenticationFailed` を返し、
//! 送信先の有無を応答から区別できないようにする。

use std::{fmt, sync::Arc};

use authcode_domain::{
    auth_code::{AuthCode, AuthCodeChallenge, ChallengeError},
    auth_token::{AuthToken, TokenClaims},
    recipient::Recipient,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{deps::AuthDeps, error::AuthCodeError};

/// 認証コード検証リクエスト
#[derive(Deserialize)]
pub struct VerifyAuthCodeRequest {
    pub email: String,
    pub code:  String,
}

impl fmt::Debug for VerifyAuthCodeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyAuthCodeRequest")
            .field("email", &self.email)
            .field("code", &"[REDACTED]")
            .finish()
    }
}

/// アクセストークン発行レスポンス
#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    /// 常に `"Bearer"`
    pub token_type:   &'static str,
    /// トークンの有効期限（秒）
    pub expires_in:   u64,
}

/// トークンを 1 つ受け取るリクエスト（照会・失効で共用）
#[derive(Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct IntrospectResponse {
    pub active:     bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email:      Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl IntrospectResponse {
    fn inactive() -> Self {
        Self {
            active:     false,
            email:      None,
            expires_at: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

/// 認証コードを検証し、アクセストークンを発行する
///
/// 成功したチャレンジは削除されるため、同じコードは一度しか使えない。
pub async fn get_auth_token(
    deps: Arc<AuthDeps>,
    request: VerifyAuthCodeRequest,
) -> Result<AuthTokenResponse, AuthCodeError> {
    let recipient = Recipient::parse(&request.email)?;
    let input = AuthCode::parse(&request.code, deps.settings.code_length)?;
    let now = deps.clock.now();

    let challenge = verify_challenge(&deps, &recipient, &input, now).await?;

    // 並行リクエストで先に消費されていれば、ここで None（または別チャレンジ）になる
    let consumed = deps.code_store.take(&recipient).await?;
    if consumed.map(|c| c.id()) != Some(challenge.id()) {
        tracing::warn!(recipient = %recipient, "チャレンジは既に消費されています");
        return Err(AuthCodeError::AuthenticationFailed);
    }

    let token = AuthToken::generate();
    let claims = TokenClaims::issue(recipient, now, deps.settings.token_ttl());
    deps.token_store
        .save(&token, &claims, u64::from(deps.settings.token_ttl_seconds))
        .await?;

    tracing::info!(
        recipient = %claims.recipient,
        challenge_id = %challenge.id(),
        "アクセストークンを発行しました"
    );

    Ok(AuthTokenResponse {
        access_token: token.as_str().to_string(),
        token_type:   "Bearer",
        expires_in:   u64::from(deps.settings.token_ttl_seconds),
    })
}

/// 保存済みチャレンジに対して入力コードを検証する
///
/// 不一致の書き戻しが競合した場合は、最新のチャレンジを読み直して検証し直す。
/// 読み直しは他のリクエストの更新が成功した場合に限られる。
async fn verify_challenge(
    deps: &AuthDeps,
    recipient: &Recipient,
    input: &AuthCode,
    now: DateTime<Utc>,
) -> Result<AuthCodeChallenge, AuthCodeError> {
    loop {
        let Some(mut challenge) = deps.code_store.find(recipient).await? else {
            tracing::info!(recipient = %recipient, "チャレンジが存在しません");
            return Err(AuthCodeError::AuthenticationFailed);
        };
        let read_failed_attempts = challenge.failed_attempts();

        match challenge.verify(input, now) {
            Ok(()) => return Ok(challenge),
            Err(ChallengeError::Expired) => {
                deps.code_store.delete(recipient).await?;
                tracing::info!(recipient = %recipient, "期限切れのチャレンジを削除しました");
                return Err(AuthCodeError::CodeExpired);
            }
            Err(ChallengeError::AttemptsExhausted) => {
                deps.code_store.delete(recipient).await?;
                tracing::warn!(recipient = %recipient, "試行回数の上限に達したチャレンジを削除しました");
                return Err(AuthCodeError::TooManyAttempts);
            }
            Err(ChallengeError::Mismatch { remaining }) => {
                match deps
                    .code_store
                    .update_with_attempts_check(
                        &challenge,
                        read_failed_attempts,
                        challenge.remaining_ttl_seconds(now),
                    )
                    .await
                {
                    Ok(()) => {
                        tracing::info!(recipient = %recipient, remaining, "認証コードが一致しません");
                        return Err(AuthCodeError::AuthenticationFailed);
                    }
                    Err(e) if e.is_conflict() => {
                        tracing::debug!(recipient = %recipient, "チャレンジが更新されていたため読み直します");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}

/// トークンの有効性を照会する
///
/// 存在しない・期限切れのトークンはエラーではなく `active: false` を返す。
pub async fn introspect_auth_token(
    deps: Arc<AuthDeps>,
    request: TokenRequest,
) -> Result<IntrospectResponse, AuthCodeError> {
    let token = AuthToken::parse(&request.token)?;
    let now = deps.clock.now();

    let response = match deps.token_store.find(&token).await? {
        Some(claims) if claims.is_active(now) => IntrospectResponse {
            active:     true,
            email:      Some(claims.recipient.as_str().to_string()),
            expires_at: Some(claims.expires_at),
        },
        _ => IntrospectResponse::inactive(),
    };
    Ok(response)
}

/// トークンを失効させる
///
/// 未知のトークンでも成功する（冪等）。
pub async fn revoke_auth_token(
    deps: Arc<AuthDeps>,
    request: TokenRequest,
) -> Result<RevokeResponse, AuthCodeError> {
    let token = AuthToken::parse(&request.token)?;
    deps.token_store.revoke(&token).await?;
    tracing::info!("アクセストークンを失効させました");
    Ok(RevokeResponse { revoked: true })
}
