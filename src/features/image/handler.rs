use std::convert::Infallible;

use axum::{
    Router,
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
    response::Response,
    routing::get,
};

use super::types::QueryParams;
use crate::{error::AppError, state::AppState};

/// 查询串提取器：重复键聚合为数组。
///
/// 解码失败不在提取阶段拒绝，而是交给管线统一转换为错误页。
pub struct ImageQuery(pub Result<QueryParams, AppError>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ImageQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let parsed = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| QueryParams::from_pairs(pairs))
            .map_err(|rejection| AppError::Validation(rejection.body_text()));
        Ok(Self(parsed))
    }
}

#[utoipa::path(
    get,
    path = "/image",
    summary = "按布局生成图片",
    description = "根据布局名与布局参数生成 SVG，可选栅格化为 PNG。成功响应带一年期 immutable 缓存头；任何失败均返回 500 HTML 错误页。",
    params(
        ("layoutName" = String, Query, description = "布局名（大小写不敏感），如 simple / document / banner"),
        ("fileType" = Option<String>, Query, description = "输出格式：svg|png；缺省时返回 SVG 正文"),
    ),
    responses(
        (status = 200, description = "生成成功（image/svg+xml 或 image/png）", content_type = "image/svg+xml", body = String),
        (status = 500, description = "参数非法、布局不存在或渲染失败", content_type = "text/html", body = String)
    ),
    tag = "Image"
)]
pub async fn render_image(
    State(state): State<AppState>,
    ImageQuery(query): ImageQuery,
) -> Response {
    match query {
        Ok(query) => state.image.handle(&query).await,
        Err(err) => state.image.fail(&err),
    }
}

pub fn create_image_router() -> Router<AppState> {
    Router::new().route("/image", get(render_image))
}
