//! 路由与中间件装配。

use axum::{Json, Router, routing::get};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;

use crate::config::AppConfig;
use crate::features::{health::health_check, image};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 压缩策略：明确排除不该压缩的响应。
///
/// SVG / HTML / JSON 等文本压缩收益明显；PNG 等位图本身已压缩，再压缩只浪费 CPU。
/// 保留默认的最小大小阈值（32B）。
pub fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 规范化挂载前缀：空串或 `/` 表示挂在根路径下。
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// 组装完整应用。
///
/// 中间件由内到外：panic 兜底 → request_id → 压缩。
/// panic 兜底位于 request_id 之内，错误页日志仍能关联到 request_id。
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let api_router = image::create_image_router();
    let doc = ApiDoc::openapi();

    let router = Router::<AppState>::new()
        .route("/health", get(health_check))
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move { Json(doc) }
            }),
        );
    let router = match normalize_prefix(&config.api.prefix) {
        Some(prefix) => router.nest(&prefix, api_router),
        None => router.merge(api_router),
    };

    router
        .with_state(state)
        .layer(CatchPanicLayer::custom(image::failure::panic_response))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
}

#[cfg(test)]
mod tests {
    use super::{compression_predicate, normalize_prefix};
    use axum::body::Body;
    use axum::http::{Response as HttpResponse, header};
    use tower_http::compression::predicate::Predicate;

    fn should_compress_for(ct: &str) -> bool {
        // 超过 SizeAbove 默认阈值
        let body_bytes = vec![b'x'; 2048];
        let resp = HttpResponse::builder()
            .header(header::CONTENT_TYPE, ct)
            .body(Body::from(body_bytes))
            .unwrap();
        compression_predicate().should_compress(&resp)
    }

    #[test]
    fn svg_and_html_are_compressed() {
        assert!(should_compress_for("image/svg+xml"));
        assert!(should_compress_for("text/html"));
    }

    #[test]
    fn raster_images_are_not() {
        assert!(!should_compress_for("image/png"));
        assert!(!should_compress_for("application/octet-stream"));
    }

    #[test]
    fn prefix_normalization() {
        assert_eq!(normalize_prefix("/api"), Some("/api".to_string()));
        assert_eq!(normalize_prefix("api/"), Some("/api".to_string()));
        assert_eq!(normalize_prefix("/"), None);
        assert_eq!(normalize_prefix(""), None);
    }
}
