//! # アプリケーション構築
//!
//! 依存の解決とルーター構築を担当する。
//! `main.rs` は設定読み込みとサーバー起動に集中する。

use std::sync::Arc;

use authcode_shared::{
    canonical_log::CanonicalLogLineLayer,
    observability::{MakeRequestUuidV7, make_request_span},
};
use axum::{Router, routing::get};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    deps::{AuthDeps, DependencyResolver},
    handler::{
        ReadinessState,
        VerifyAuthCodeHandler,
        health_check,
        introspect_auth_token,
        readiness_check,
        request_auth_code,
        revoke_auth_token,
        verify_auth_code,
    },
};

/// 依存を一度だけ解決し、ルーターを構築する
pub async fn init_app<R>(resolver: &R) -> Result<Router, R::Error>
where
    R: DependencyResolver<Deps = AuthDeps>,
{
    let verify_handler = verify_auth_code::compose(resolver).await?;
    Ok(build_app(verify_handler))
}

/// 検証ハンドラが保持する依存を他のハンドラと共有してルーターを構築する
pub fn build_app(verify_handler: VerifyAuthCodeHandler) -> Router {
    let deps = Arc::clone(verify_handler.deps());
    let readiness_state = Arc::new(ReadinessState {
        probes: vec![Arc::clone(&deps.readiness)],
    });

    Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .route("/auth/codes", request_auth_code(Arc::clone(&deps)).into_route())
        .route("/auth/verify-code", verify_handler.into_route())
        .route(
            "/auth/tokens/introspect",
            introspect_auth_token(Arc::clone(&deps)).into_route(),
        )
        .route(
            "/auth/tokens/revoke",
            revoke_auth_token(deps).into_route(),
        )
        // レイヤーは下から上の順に適用される（最後に追加したものが最外）
        // SetRequestId → Trace → CanonicalLogLine → PropagateRequestId → handler
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CanonicalLogLineLayer)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
