use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};

use super::types::{FileType, RenderedImage};
use crate::error::AppError;

/// 成功响应固定的缓存策略：同一组参数的输出永不变化。
pub const CACHE_CONTROL_IMMUTABLE: &str =
    "public, immutable, no-transform, s-maxage=31536000, max-age=31536000";

/// 计算成功响应的 Content-Type。
///
/// `svg` 对应 `image/svg+xml`，其余格式按标签原样透传为 `image/<tag>`；
/// 未指定格式时使用 `absent_tag`。
pub fn content_type_for(file_type: Option<FileType>, absent_tag: &str) -> String {
    match file_type {
        Some(FileType::Svg) => "image/svg+xml".to_string(),
        Some(other) => format!("image/{}", other.tag()),
        None => format!("image/{absent_tag}"),
    }
}

/// 封装成功响应：200 + Content-Type + 固定 Cache-Control，正文一次写出。
pub fn frame(
    image: RenderedImage,
    file_type: Option<FileType>,
    absent_tag: &str,
) -> Result<Response, AppError> {
    let content_type = HeaderValue::from_str(&content_type_for(file_type, absent_tag))
        .map_err(|e| AppError::Internal(format!("invalid content type: {e}")))?;

    let mut res = Response::new(Body::from(image.into_bytes()));
    *res.status_mut() = StatusCode::OK;
    let headers = res.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_IMMUTABLE),
    );
    Ok(res)
}
