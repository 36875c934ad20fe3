use utoipa::OpenApi;
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};

/// 为 OpenAPI 文档提供“业务接口前缀”Servers 配置。
///
/// - 图片接口默认挂在 `/api` 下（对应 `config.api.prefix` / `APP_API__PREFIX`）。
/// - `/health` 不带前缀，因此额外提供 `/` 作为备用 server。
struct ApiServers;

impl utoipa::Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some("对应 config.api.prefix")),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（/health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::image::handler::render_image,
    ),
    components(schemas(
        crate::features::health::HealthResponse,
        crate::features::image::FileType,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "Image",
            description = "按布局生成 Open Graph 风格图片（svg/png）。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "OG Image API",
        version = env!("CARGO_PKG_VERSION"),
        description = "按需布局图片服务（Axum + utoipa）。除 /health 外，接口实际挂载在 `config.api.prefix`（默认 /api）下，paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;
