//! # Auth Code Service エラー定義
//!
//! ビジネス関数が返すエラーと、HTTP レスポンス（RFC 9457）への変換を定義する。

use authcode_domain::DomainError;
use authcode_infra::InfraError;
use authcode_shared::ErrorResponse;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Auth Code Service で発生するエラー
#[derive(Debug, Error)]
pub enum AuthCodeError {
    /// 入力が値オブジェクトのルールを満たさない
    #[error("リクエストが不正です: {0}")]
    InvalidRequest(String),

    /// チャレンジが存在しない、またはコードが一致しない
    #[error("認証に失敗しました")]
    AuthenticationFailed,

    #[error("認証コードの有効期限が切れています")]
    CodeExpired,

    #[error("認証コードの試行回数が上限に達しました")]
    TooManyAttempts,

    /// 再発行間隔内の再リクエスト
    #[error("認証コードの再発行は {retry_after_seconds} 秒後に可能です")]
    ResendTooSoon { retry_after_seconds: u64 },

    /// Redis・通知などインフラ層のエラー
    #[error("インフラエラー: {0}")]
    Infra(#[from] InfraError),
}

impl From<DomainError> for AuthCodeError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::InvalidRequest(msg),
        }
    }
}

impl IntoResponse for AuthCodeError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AuthCodeError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::validation_error(msg.clone()),
            ),
            AuthCodeError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(
                    "authentication-failed",
                    "Authentication Failed",
                    401,
                    "認証に失敗しました",
                ),
            ),
            AuthCodeError::CodeExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(
                    "code-expired",
                    "Code Expired",
                    401,
                    "認証コードの有効期限が切れています。再発行してください",
                ),
            ),
            AuthCodeError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new(
                    "too-many-attempts",
                    "Too Many Attempts",
                    429,
                    "認証コードの試行回数が上限に達しました。再発行してください",
                ),
            ),
            AuthCodeError::ResendTooSoon {
                retry_after_seconds,
            } => {
                let body = ErrorResponse::too_many_requests(self.to_string());
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(*retry_after_seconds));
                return response;
            }
            AuthCodeError::Infra(e) => {
                tracing::error!(
                    error = %e,
                    span_trace = %e.span_trace(),
                    "インフラエラーが発生しました"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn into_parts(err: AuthCodeError) -> (StatusCode, Option<String>, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, retry_after, serde_json::from_slice(&bytes).unwrap())
    }

    #[rstest]
    #[case(AuthCodeError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST, "validation-error")]
    #[case(AuthCodeError::AuthenticationFailed, StatusCode::UNAUTHORIZED, "authentication-failed")]
    #[case(AuthCodeError::CodeExpired, StatusCode::UNAUTHORIZED, "code-expired")]
    #[case(AuthCodeError::TooManyAttempts, StatusCode::TOO_MANY_REQUESTS, "too-many-attempts")]
    #[case(
        AuthCodeError::Infra(InfraError::unexpected("boom")),
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal-error"
    )]
    #[tokio::test]
    async fn test_エラー種別ごとのステータスとtype(
        #[case] err: AuthCodeError,
        #[case] expected_status: StatusCode,
        #[case] expected_suffix: &str,
    ) {
        let (status, _, body) = into_parts(err).await;

        assert_eq!(status, expected_status);
        assert_eq!(body.status, expected_status.as_u16());
        assert!(body.error_type.ends_with(expected_suffix));
    }

    #[tokio::test]
    async fn test_再発行間隔エラーはretry_afterヘッダを付ける() {
        let err = AuthCodeError::ResendTooSoon {
            retry_after_seconds: 17,
        };

        let (status, retry_after, body) = into_parts(err).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(retry_after.as_deref(), Some("17"));
        assert!(body.detail.contains("17"));
    }

    #[tokio::test]
    async fn test_インフラエラーの詳細はレスポンスに含めない() {
        let err = AuthCodeError::Infra(InfraError::unexpected("redis://secret@host"));

        let (_, _, body) = into_parts(err).await;

        assert!(!body.detail.contains("secret"));
    }

    #[test]
    fn test_ドメインエラーはinvalid_requestに変換される() {
        let err: AuthCodeError = DomainError::Validation("メールアドレスが不正です".into()).into();

        assert!(matches!(err, AuthCodeError::InvalidRequest(msg) if msg == "メールアドレスが不正です"));
    }
}
