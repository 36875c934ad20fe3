use std::sync::Arc;
use std::time::Instant;

use axum::response::Response;
use tokio::sync::Semaphore;

use super::failure::failure_response;
use super::framer::frame;
use super::layouts::{BuiltinLayouts, LayoutRegistry};
use super::raster::{Rasterizer, ResvgRasterizer};
use super::renderer::{TemplateRenderer, VectorRenderer};
use super::sanitize::{HtmlSanitizer, Sanitizer};
use super::types::{FileType, QueryParams, RenderRequest, RenderedImage};
use crate::config::AppConfig;
use crate::error::AppError;

/// 图片渲染管线：校验 → 解析布局 → 生成 SVG → （可选）栅格化 → 封装响应。
///
/// 各协作者均为无状态的共享只读对象，请求之间互不影响。
#[derive(Clone)]
pub struct ImageService {
    registry: Arc<dyn LayoutRegistry>,
    renderer: Arc<dyn VectorRenderer>,
    rasterizer: Arc<dyn Rasterizer>,
    sanitizer: Arc<dyn Sanitizer>,
    /// 控制并发栅格化的信号量（CPU 密集型）
    render_semaphore: Arc<Semaphore>,
    absent_file_type_tag: String,
}

impl ImageService {
    pub fn new(
        registry: Arc<dyn LayoutRegistry>,
        renderer: Arc<dyn VectorRenderer>,
        rasterizer: Arc<dyn Rasterizer>,
        sanitizer: Arc<dyn Sanitizer>,
        max_parallel: usize,
        absent_file_type_tag: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            renderer,
            rasterizer,
            sanitizer,
            render_semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
            absent_file_type_tag: absent_file_type_tag.into(),
        }
    }

    /// 按配置组装内置实现
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let image = &config.image;
        Ok(Self::new(
            Arc::new(BuiltinLayouts::new()),
            Arc::new(TemplateRenderer::new()?),
            Arc::new(ResvgRasterizer::new(image)),
            Arc::new(HtmlSanitizer),
            image.effective_parallelism(),
            image.absent_file_type_tag.clone(),
        ))
    }

    /// 执行完整管线；任何一步失败都直接返回，不做局部恢复。
    pub async fn render(&self, query: &QueryParams) -> Result<Response, AppError> {
        let t0 = Instant::now();
        let request = RenderRequest::from_query(query)?;
        let resolved = self
            .registry
            .resolve(&request.layout_name, &request.extra_params)?;
        let svg = self.renderer.render(&resolved)?;

        let image = match request.file_type {
            Some(FileType::Png) => RenderedImage::Raster(self.rasterize(svg).await?),
            Some(FileType::Svg) | None => RenderedImage::Svg(svg),
        };

        tracing::debug!(
            layout = %request.layout_name,
            file_type = request.file_type.map(FileType::tag).unwrap_or("-"),
            "image rendered in {:?}",
            t0.elapsed()
        );
        frame(image, request.file_type, &self.absent_file_type_tag)
    }

    /// 栅格化移出 tokio worker，并受信号量限流。
    async fn rasterize(&self, svg: String) -> Result<Vec<u8>, AppError> {
        let _permit = self
            .render_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("failed to acquire render permit: {e}")))?;
        let rasterizer = self.rasterizer.clone();
        tokio::task::spawn_blocking(move || rasterizer.to_raster(&svg)).await?
    }

    /// 管线的唯一结果边界：成功原样返回，失败转换为错误页。
    pub async fn handle(&self, query: &QueryParams) -> Response {
        match self.render(query).await {
            Ok(res) => res,
            Err(err) => self.fail(&err),
        }
    }

    pub fn fail(&self, err: &AppError) -> Response {
        failure_response(err, self.sanitizer.as_ref())
    }
}
