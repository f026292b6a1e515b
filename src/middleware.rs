//! HTTP 中间件
//! 请求追踪、服务间 API Key 鉴权、审计捕获

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::middleware::AuthContext,
    auth::remote::SuperAdminValidator,
    config::AppConfig,
    error::AppError,
    models::audit::AuditEntry,
    services::{AuditService, AuthService, TenantService},
};
use crate::auth::jwt::TokenCodec;

/// 未配置 API Key 允许列表时接受的内置开发密钥。
/// 仅为本地开发保留；配置任意允许列表后即失效（生产加固项）。
pub const DEV_FALLBACK_API_KEY: &str = "media-dev-local-api-key";

/// 应用状态
///
/// AppState 内部使用 Arc 包装服务,这样:
/// 1. 多个请求可以共享服务实例
/// 2. 服务可以包含内部的可变状态(如果需要)
/// 3. Clone 成本低廉(Arc 是指针拷贝)
///
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: sqlx::PgPool,
    pub token_codec: Arc<TokenCodec>,
    pub auth_service: Arc<AuthService>,
    pub tenant_service: Arc<TenantService>,
    pub audit_service: Arc<AuditService>,
    pub superadmin_validator: Arc<dyn SuperAdminValidator>,
}

// ==================== 请求追踪 ====================

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        let status_class = match status {
            200..=299 => "2xx",
            400..=499 => "4xx",
            500..=599 => "5xx",
            _ => "other",
        };
        metrics::counter!("http_requests_total", "status" => status_class).increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        // 在响应头中添加 trace_id
        if let Ok(value) = trace_id.parse() {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = request_id.parse() {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// 获取客户端 IP 地址
/// trust_proxy 开启时优先读代理头
pub fn get_client_ip(headers: &HeaderMap, trust_proxy: bool) -> Option<String> {
    if trust_proxy {
        // X-Forwarded-For 可能包含多个 IP，取第一个
        if let Some(forwarded) = headers.get("x-forwarded-for") {
            if let Ok(forwarded_str) = forwarded.to_str() {
                if let Some(first_ip) = forwarded_str.split(',').next() {
                    let trimmed = first_ip.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }

        if let Some(real_ip) = headers.get("x-real-ip") {
            if let Ok(ip_str) = real_ip.to_str() {
                return Some(ip_str.to_string());
            }
        }
    }

    None
}

// ==================== 服务间 API Key 鉴权 ====================

/// 服务间 API Key 鉴权中间件。
/// 在任何按用户授权之前检查 X-API-Key；机器客户端的粗粒度信任
/// 边界。未配置允许列表时仅接受内置开发密钥。
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingApiKey)?;

    check_api_key(provided, state.config.security.api_keys.as_deref())?;

    Ok(next.run(req).await)
}

/// 校验 API Key。允许列表为空或缺失时回落到内置开发密钥。
fn check_api_key(provided: &str, allow_list: Option<&[String]>) -> Result<(), AppError> {
    match allow_list {
        Some(keys) if !keys.is_empty() => {
            if keys.iter().any(|k| k == provided) {
                Ok(())
            } else {
                Err(AppError::InvalidApiKey)
            }
        }
        _ => {
            if provided == DEV_FALLBACK_API_KEY {
                tracing::warn!("Accepted built-in development API key");
                Ok(())
            } else {
                Err(AppError::InvalidApiKey)
            }
        }
    }
}

// ==================== 审计捕获 ====================

/// 审计捕获中间件（最外层业务中间件）。
///
/// 缓冲并复原请求体，放行请求，再通过显式重组响应来镜像响应体
/// ——字节始终同步转发给客户端，仅额外镜像到审计缓冲。条目在
/// 响应构造完成后异步落库，不占用客户端关键路径。
pub async fn audit_capture_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_string();

    if is_excluded_path(&path, &state.config.audit.excluded_path_prefixes) {
        return Ok(next.run(req).await);
    }

    let method = req.method().to_string();
    let detail = req.uri().query().map(|q| q.to_string());
    let source_ip = get_client_ip(req.headers(), state.config.security.trust_proxy);
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    // 缓冲请求体并复原，下游处理器照常读取
    let (parts, body) = req.into_parts();
    let request_bytes = to_bytes(body, state.config.audit.max_body_bytes)
        .await
        .map_err(|_| AppError::BadRequest("request body too large".to_string()))?;
    let req = Request::from_parts(parts, Body::from(request_bytes.clone()));

    let response = next.run(req).await;

    // 执行者身份由认证中间件镜像到响应扩展；公开端点没有，记空
    let actor_id = response.extensions().get::<AuthContext>().map(|c| c.user_id);

    // 镜像响应体；自身产出的响应均为有界 JSON
    let (parts, body) = response.into_parts();
    let response_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // 无法镜像则放弃本条审计，但必须保全客户端响应
            tracing::warn!(error = %e, "Failed to buffer response body; audit entry dropped");
            return Ok(Response::from_parts(parts, Body::empty()));
        }
    };
    let response = Response::from_parts(parts, Body::from(response_bytes.clone()));

    let entry = build_audit_entry(
        actor_id,
        &method,
        &path,
        detail,
        &request_bytes,
        &response_bytes,
        source_ip,
        user_agent,
        state.config.audit.max_body_bytes,
    );

    // 响应已构造完毕，写入彻底移出关键路径
    state.audit_service.record_entry_detached(entry);

    Ok(response)
}

/// 路径是否不记审计
fn is_excluded_path(path: &str, prefixes: &[String]) -> bool {
    path == "/" || prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

/// 从路径推导实体类型：跳过 api 前缀与版本段，取第一个业务段
fn entity_type_from_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .find(|s| {
            *s != "api" && !(s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit()))
        })
        .unwrap_or("root")
        .to_string()
}

/// 捕获的字节转为存储值：JSON 原样存，非 JSON 存文本，超限存占位
fn capture_body(bytes: &[u8], max_bytes: usize) -> Option<serde_json::Value> {
    if bytes.is_empty() {
        return None;
    }

    if bytes.len() > max_bytes {
        return Some(serde_json::json!({ "_truncated": true, "bytes": bytes.len() }));
    }

    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_audit_entry(
    actor_id: Option<Uuid>,
    method: &str,
    path: &str,
    detail: Option<String>,
    request_bytes: &[u8],
    response_bytes: &[u8],
    source_ip: Option<String>,
    user_agent: Option<String>,
    max_body_bytes: usize,
) -> AuditEntry {
    AuditEntry {
        id: Uuid::new_v4(),
        actor_id,
        entity_type: entity_type_from_path(path),
        action: format!("{} {}", method, path),
        detail,
        old_value: capture_body(request_bytes, max_body_bytes),
        new_value: capture_body(response_bytes, max_body_bytes),
        source_ip,
        user_agent,
        occurred_at: chrono::Utc::now(),
    }
}
