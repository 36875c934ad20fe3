use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `healthy`；收到退出信号后为 `draining`
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "og-backend")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "探活端点。优雅退出期间返回 503 + draining，负载均衡据此摘除实例，在途请求继续完成。",
    responses(
        (status = 200, description = "服务健康", body = HealthResponse),
        (status = 503, description = "正在排空", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = if state.shutdown.is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "healthy")
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::features::image::ImageService;
    use crate::shutdown::{ShutdownManager, ShutdownReason};

    fn state(shutdown: ShutdownManager) -> AppState {
        let image = ImageService::from_config(&AppConfig::default()).expect("image service");
        AppState::new(image, shutdown)
    }

    #[tokio::test]
    async fn healthy_while_serving() {
        let (code, Json(body)) = health_check(State(state(ShutdownManager::new()))).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.service, "og-backend");
    }

    #[tokio::test]
    async fn draining_after_shutdown_signal() {
        let shutdown = ShutdownManager::new();
        let app_state = state(shutdown.clone());
        shutdown.trigger_shutdown(ShutdownReason::Terminate);
        let (code, Json(body)) = health_check(State(app_state)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "draining");
    }
}
