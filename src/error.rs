use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::features::image::failure;
use crate::features::image::sanitize::HtmlSanitizer;

/// 应用统一错误类型
///
/// 渲染管线中的任何失败都归入这里，由失败兜底统一转换为 500 HTML 错误页；
/// 不同变体只影响消息文本与日志中的错误码，不影响响应形态。
#[derive(Error, Debug)]
pub enum AppError {
    /// 请求参数校验错误（缺失 / 类型不符 / 取值非法）
    #[error("Invalid request: {0}")]
    Validation(String),

    /// 布局不存在
    #[error("Unknown layout \"{name}\"{}", available_hint(.available))]
    LayoutNotFound {
        name: String,
        /// 可用布局名，用于错误提示
        available: Vec<String>,
    },

    /// 布局参数未通过该布局的配置校验
    #[error("Invalid config for layout \"{layout}\": {message}")]
    ConfigValidation { layout: String, message: String },

    /// SVG 生成失败
    #[error("Failed to render SVG: {0}")]
    Render(String),

    /// SVG 栅格化失败
    #[error("Failed to rasterize SVG: {0}")]
    Raster(String),

    /// 其它未分类错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 稳定的错误码，仅用于日志检索。
    pub fn stable_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::LayoutNotFound { .. } => "LAYOUT_NOT_FOUND",
            AppError::ConfigValidation { .. } => "CONFIG_INVALID",
            AppError::Render(_) => "RENDER_FAILED",
            AppError::Raster(_) => "RASTER_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为调用方输入导致的错误（非系统故障）
    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::LayoutNotFound { .. }
                | AppError::ConfigValidation { .. }
        )
    }
}

fn available_hint(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        failure::failure_response(&self, &HtmlSanitizer)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking render task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn messages_carry_the_offending_value() {
        let e = AppError::LayoutNotFound {
            name: "nope".into(),
            available: vec![],
        };
        assert_eq!(e.to_string(), "Unknown layout \"nope\"");

        let e = AppError::LayoutNotFound {
            name: "nope".into(),
            available: vec!["a".into(), "b".into()],
        };
        assert_eq!(e.to_string(), "Unknown layout \"nope\" (available: a, b)");

        let e = AppError::ConfigValidation {
            layout: "simple".into(),
            message: "\"title\" is required".into(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid config for layout \"simple\": \"title\" is required"
        );
    }

    #[test]
    fn client_input_errors_are_distinguishable() {
        assert!(AppError::Validation("x".into()).is_client_input());
        assert!(
            AppError::LayoutNotFound {
                name: "x".into(),
                available: vec![],
            }
            .is_client_input()
        );
        assert!(!AppError::Raster("x".into()).is_client_input());
        assert_eq!(AppError::Render("x".into()).stable_code(), "RENDER_FAILED");
    }
}
