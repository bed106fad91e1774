//! # 汎用リクエストハンドラ
//!
//! 依存の束とビジネス関数から HTTP ハンドラを組み立てる。
//!
//! ```text
//! POST body (JSON) ──▶ Req ──▶ business_fn(Arc<D>, Req) ──▶ Result<Res, E>
//!                                                           ├─ Ok  → 200 + JSON
//!                                                           └─ Err → E::into_response()
//! ```
//!
//! ハンドラは入力のデコードとレスポンスへの変換だけを担い、
//! 業務ルールはビジネス関数に閉じる。

use std::{fmt::Display, future::Future, pin::Pin, sync::Arc};

use authcode_shared::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{MethodRouter, post},
};
use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use tracing::Instrument;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type BusinessFn<D, Req, Res, E> =
    Arc<dyn Fn(Arc<D>, Req) -> BoxFuture<Result<Res, E>> + Send + Sync>;

/// 依存の束とビジネス関数を保持するハンドラ
///
/// 生成は失敗しない。依存の解決は生成前に済ませておく。
pub struct BasicHandler<D, Req, Res, E> {
    name:        &'static str,
    deps:        Arc<D>,
    business_fn: BusinessFn<D, Req, Res, E>,
}

impl<D, Req, Res, E> Clone for BasicHandler<D, Req, Res, E> {
    fn clone(&self) -> Self {
        Self {
            name:        self.name,
            deps:        Arc::clone(&self.deps),
            business_fn: Arc::clone(&self.business_fn),
        }
    }
}

impl<D, Req, Res, E> BasicHandler<D, Req, Res, E>
where
    D: Send + Sync + 'static,
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
    E: IntoResponse + Display + Send + 'static,
{
    /// ハンドラを生成する
    ///
    /// `name` はスパンとログの `operation` に使われる。
    pub fn new<F, Fut>(name: &'static str, deps: Arc<D>, business_fn: F) -> Self
    where
        F: Fn(Arc<D>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, E>> + Send + 'static,
    {
        let business_fn: BusinessFn<D, Req, Res, E> =
            Arc::new(move |deps: Arc<D>, request: Req| -> BoxFuture<Result<Res, E>> {
                Box::pin(business_fn(deps, request))
            });

        Self {
            name,
            deps,
            business_fn,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// ハンドラが保持する依存の束
    pub fn deps(&self) -> &Arc<D> {
        &self.deps
    }

    /// リクエストボディを処理してレスポンスを返す
    ///
    /// - デコード失敗: 400（ビジネス関数は呼ばない）
    /// - `Ok`: 200 + JSON
    /// - `Err`: エラー型のレスポンス変換に委ねる
    pub async fn handle(&self, body: Bytes) -> Response {
        let span = tracing::info_span!("handler", operation = self.name);

        async {
            let request: Req = match serde_json::from_slice(&body) {
                Ok(request) => request,
                Err(e) => {
                    tracing::debug!(error = %e, "リクエストボディのデコードに失敗しました");
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorResponse::bad_request(format!(
                            "リクエストボディが不正です: {e}"
                        ))),
                    )
                        .into_response();
                }
            };

            match (self.business_fn)(Arc::clone(&self.deps), request).await {
                Ok(response) => (StatusCode::OK, Json(response)).into_response(),
                Err(err) => {
                    tracing::debug!(error = %err, "ビジネス関数がエラーを返しました");
                    err.into_response()
                }
            }
        }
        .instrument(span)
        .await
    }

    /// POST ルートに変換する
    pub fn into_route<S>(self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        post(move |body: Bytes| {
            let handler = self.clone();
            async move { handler.handle(body).await }
        })
    }
}
