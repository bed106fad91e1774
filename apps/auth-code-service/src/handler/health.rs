//! # ヘルスチェックハンドラ
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（依存先の疎通を確認）
//!
//! レスポンス型は [`authcode_shared::HealthResponse`] / [`authcode_shared::ReadinessResponse`] を参照。

use std::{collections::HashMap, sync::Arc, time::Duration};

use authcode_infra::ReadinessProbe;
use authcode_shared::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// 1 Probe あたりのタイムアウト
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness Check 用の State
pub struct ReadinessState {
    pub probes: Vec<Arc<dyn ReadinessProbe>>,
}

/// 全 Probe OK → 200、1 つでも失敗 → 503
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
    let mut checks = HashMap::new();
    for probe in &state.probes {
        checks.insert(probe.name().to_string(), check(probe.as_ref()).await);
    }

    let response = ReadinessResponse::from_checks(checks);
    let http_status = match response.status {
        ReadinessStatus::Ready => StatusCode::OK,
        ReadinessStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };

    (http_status, Json(response))
}

async fn check(probe: &dyn ReadinessProbe) -> CheckStatus {
    match tokio::time::timeout(PROBE_TIMEOUT, probe.ping()).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(probe = probe.name(), error = %e, "readiness check failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!(probe = probe.name(), "readiness check timed out");
            CheckStatus::Error
        }
    }
}
