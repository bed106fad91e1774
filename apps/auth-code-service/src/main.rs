//! # Auth Code Service サーバー
//!
//! ## 環境変数
//!
//! 設定項目は [`authcode_service::config`] を参照。ログ出力は `LOG_FORMAT`
//! （`json` / `pretty`）と `RUST_LOG` で制御する。
//!
//! ## 起動方法
//!
//! ```bash
//! AUTH_CODE_PORT=13010 REDIS_URL=redis://localhost:16379 cargo run -p authcode-service
//! ```

use std::net::SocketAddr;

use anyhow::Context as _;
use authcode_service::{app::init_app, config::AuthCodeConfig, deps::RedisAuthDepsResolver};
use authcode_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルがあれば読み込む（本番では環境変数を直接設定）
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("auth-code-service");
    init_tracing(tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = "auth-code-service").entered();

    let config = AuthCodeConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Auth Code Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let resolver = RedisAuthDepsResolver::new(&config);
    let app = init_app(&resolver)
        .await
        .context("依存コンポーネントの初期化に失敗しました")?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Auth Code Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
