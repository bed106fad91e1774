//! # 認証コード検証ハンドラ
//!
//! 依存の解決・ハンドラの生成・公開を 1 か所で行う合成単位。
//!
//! ```text
//! DependencyResolver ──resolve()──▶ AuthDeps
//!                                      │
//!            BasicHandler::new("verify_auth_code", deps, get_auth_token)
//!                                      │
//!                                      ▼
//!                           VerifyAuthCodeHandler
//! ```
//!
//! 依存の解決は [`compose`] の呼び出しごとに一度だけ行い、
//! 以降のリクエストはすべて同じ依存を共有する。

use std::sync::Arc;

use super::BasicHandler;
use crate::{
    auth::{AuthTokenResponse, VerifyAuthCodeRequest, get_auth_token},
    deps::{AuthDeps, DependencyResolver},
    error::AuthCodeError,
};

/// 認証コードを検証してアクセストークンを返すハンドラ
pub type VerifyAuthCodeHandler =
    BasicHandler<AuthDeps, VerifyAuthCodeRequest, AuthTokenResponse, AuthCodeError>;

/// 解決済みの依存から検証ハンドラを生成する
pub fn verify_auth_code(deps: Arc<AuthDeps>) -> VerifyAuthCodeHandler {
    BasicHandler::new("verify_auth_code", deps, get_auth_token)
}

/// 依存を解決して検証ハンドラを生成する
///
/// 解決に失敗した場合はハンドラを生成せず、解決のエラーをそのまま返す。
pub async fn compose<R>(resolver: &R) -> Result<VerifyAuthCodeHandler, R::Error>
where
    R: DependencyResolver<Deps = AuthDeps>,
{
    let deps = resolver.resolve().await?;
    tracing::debug!("検証ハンドラの依存を解決しました");
    Ok(verify_auth_code(Arc::new(deps)))
}
