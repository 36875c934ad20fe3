//! 失败兜底：任何渲染管线错误都转换为同一形态的 500 HTML 页面。

use std::any::Any;

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};

use super::sanitize::Sanitizer;
use crate::error::AppError;
use crate::request_id::current_request_id;

/// 错误页内容类型
pub const ERROR_CONTENT_TYPE: &str = "text/html";

/// 拼装错误页；`escaped` 必须已转义。
pub fn error_page(escaped: &str) -> String {
    format!("<h1>Internal Error</h1><pre><code>{escaped}</code></pre>")
}

/// 记录原始错误并返回 500 HTML 页面。
///
/// 未转义的错误文本只出现在日志中。
pub fn failure_response(err: &AppError, sanitizer: &dyn Sanitizer) -> Response {
    let request_id = current_request_id().unwrap_or_default();
    if err.is_client_input() {
        tracing::warn!(
            code = err.stable_code(),
            request_id = %request_id,
            "image request rejected: {}",
            err
        );
    } else {
        tracing::error!(
            code = err.stable_code(),
            request_id = %request_id,
            "image request failed: {}",
            err
        );
    }

    let body = error_page(&sanitizer.escape(&err.to_string()));
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(ERROR_CONTENT_TYPE),
    );
    res
}

/// 供 `CatchPanicLayer::custom` 使用：panic 同样走错误页。
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    let err = AppError::Internal(format!("request handler panicked: {detail}"));
    failure_response(&err, &super::sanitize::HtmlSanitizer)
}
