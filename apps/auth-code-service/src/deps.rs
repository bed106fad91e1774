//! # 依存コンポーネント
//!
//! ビジネス関数が必要とする依存を [`AuthDeps`] に束ね、
//! [`DependencyResolver`] で一度だけ構築する。
//!
//! ```text
//! DependencyResolver::resolve() ──▶ AuthDeps ──▶ Arc<AuthDeps> ──▶ 各ハンドラ
//! ```
//!
//! ハンドラの構築前に依存を確定させるため、解決の失敗は起動時のエラーになる。

use std::sync::Arc;

use async_trait::async_trait;
use authcode_domain::clock::{Clock, SystemClock};
use authcode_infra::{
    AuthCodeStore,
    CodeGenerator,
    CodeNotifier,
    InfraError,
    LogCodeNotifier,
    RandomCodeGenerator,
    ReadinessProbe,
    RedisAuthCodeStore,
    RedisReadinessProbe,
    RedisTokenStore,
    TokenStore,
    redis::create_connection_manager,
};
use thiserror::Error;

use crate::config::{AuthCodeConfig, AuthCodeSettings};

/// ビジネス関数が参照する依存の束
///
/// 構築後は読み取り専用。ハンドラ間で `Arc` を共有する。
pub struct AuthDeps {
    pub settings:       AuthCodeSettings,
    pub code_store:     Arc<dyn AuthCodeStore>,
    pub token_store:    Arc<dyn TokenStore>,
    pub code_generator: Arc<dyn CodeGenerator>,
    pub notifier:       Arc<dyn CodeNotifier>,
    pub readiness:      Arc<dyn ReadinessProbe>,
    pub clock:          Arc<dyn Clock>,
}

/// 依存の解決
///
/// 合成時に一度だけ呼ばれる。
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    type Deps: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn resolve(&self) -> Result<Self::Deps, Self::Error>;
}

/// 依存解決エラー
#[derive(Debug, Error)]
pub enum DepsError {
    #[error("Redis への接続に失敗しました: {0}")]
    Redis(#[source] InfraError),
}

/// Redis と本番実装で [`AuthDeps`] を組み立てる
pub struct RedisAuthDepsResolver {
    redis_url: String,
    settings:  AuthCodeSettings,
}

impl RedisAuthDepsResolver {
    pub fn new(config: &AuthCodeConfig) -> Self {
        Self {
            redis_url: config.redis_url.clone(),
            settings:  config.settings.clone(),
        }
    }
}

#[async_trait]
impl DependencyResolver for RedisAuthDepsResolver {
    type Deps = AuthDeps;
    type Error = DepsError;

    async fn resolve(&self) -> Result<AuthDeps, DepsError> {
        let conn = create_connection_manager(&self.redis_url)
            .await
            .map_err(DepsError::Redis)?;
        tracing::info!("Redis に接続しました");

        Ok(AuthDeps {
            settings:       self.settings.clone(),
            code_store:     Arc::new(RedisAuthCodeStore::new(conn.clone())),
            token_store:    Arc::new(RedisTokenStore::new(conn.clone())),
            code_generator: Arc::new(RandomCodeGenerator),
            notifier:       Arc::new(LogCodeNotifier),
            readiness:      Arc::new(RedisReadinessProbe::new(conn)),
            clock:          Arc::new(SystemClock),
        })
    }
}
