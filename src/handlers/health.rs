//! 健康检查处理器

use crate::{db, middleware::AppState};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// 记录进程启动时间（main 中调用一次）
pub fn set_start_time() {
    let _ = START_TIME.set(Instant::now());
}

/// 进程运行时长（秒）
pub fn get_uptime() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// 存活检查
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": get_uptime(),
    }))
}

/// 就绪检查（含数据库连通性）
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match db::health_check(&state.db).await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ready"}))),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "not_ready", "reason": "database unavailable"})),
            )
        }
    }
}
