use resvg::usvg::{self, Options as UsvgOptions, fontdb};
use resvg::{
    render,
    tiny_skia::{Pixmap, Transform},
};
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::config::ImageRenderConfig;
use crate::error::AppError;

/// 栅格化器：SVG 文本 → 位图字节（PNG）。
pub trait Rasterizer: Send + Sync {
    fn to_raster(&self, svg: &str) -> Result<Vec<u8>, AppError>;
}

/// 单边像素上限，防止超大画布占满内存
const MAX_DIMENSION: u32 = 8192;

// 全局字体数据库单例（首次初始化所用的字体目录生效）
static GLOBAL_FONT_DB: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

/// 初始化全局字体数据库：系统字体 + 自定义字体目录下的 ttf/otf
fn init_global_font_db(fonts_dir: &Path) -> Arc<fontdb::Database> {
    let mut font_db = fontdb::Database::new();
    font_db.load_system_fonts();

    if let Ok(entries) = fs::read_dir(fonts_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let is_font = path.is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("ttf") | Some("otf")
                );
            if is_font && let Err(e) = font_db.load_font_file(&path) {
                tracing::error!("加载字体文件失败 '{}': {}", path.display(), e);
            }
        }
    }
    tracing::info!("字体数据库已加载: {} faces", font_db.len());

    Arc::new(font_db)
}

/// 获取全局字体数据库
pub fn get_global_font_db(fonts_dir: &Path) -> Arc<fontdb::Database> {
    GLOBAL_FONT_DB
        .get_or_init(|| init_global_font_db(fonts_dir))
        .clone()
}

/// 基于 resvg 的 PNG 栅格化器
pub struct ResvgRasterizer {
    font_db: Arc<fontdb::Database>,
    font_family: String,
    optimize_speed: bool,
}

impl ResvgRasterizer {
    pub fn new(config: &ImageRenderConfig) -> Self {
        Self {
            font_db: get_global_font_db(Path::new(&config.fonts_dir)),
            font_family: config.default_font_family.clone(),
            optimize_speed: config.optimize_speed,
        }
    }
}

impl Rasterizer for ResvgRasterizer {
    fn to_raster(&self, svg: &str) -> Result<Vec<u8>, AppError> {
        // 分段计时，定位瓶颈
        let t0 = std::time::Instant::now();

        let speed = self.optimize_speed;
        let opts = UsvgOptions {
            fontdb: self.font_db.clone(),
            font_family: self.font_family.clone(),
            font_size: 16.0,
            languages: vec!["en".to_string()],
            shape_rendering: if speed {
                usvg::ShapeRendering::OptimizeSpeed
            } else {
                usvg::ShapeRendering::GeometricPrecision
            },
            text_rendering: if speed {
                usvg::TextRendering::OptimizeSpeed
            } else {
                usvg::TextRendering::OptimizeLegibility
            },
            image_rendering: if speed {
                usvg::ImageRendering::OptimizeSpeed
            } else {
                usvg::ImageRendering::OptimizeQuality
            },
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| AppError::Raster(format!("failed to parse SVG: {e}")))?;
        let t_parse = t0.elapsed();

        let size = tree.size().to_int_size();
        let (w, h) = (size.width(), size.height());
        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(AppError::Raster(format!(
                "canvas {w}x{h} exceeds the {MAX_DIMENSION}px limit"
            )));
        }
        let mut pixmap = Pixmap::new(w, h)
            .ok_or_else(|| AppError::Raster(format!("failed to create {w}x{h} pixmap")))?;

        render(&tree, Transform::default(), &mut pixmap.as_mut());
        let t_raster = t0.elapsed();

        let mut out = Vec::with_capacity((w * h) as usize);
        {
            let mut encoder = png::Encoder::new(&mut out, w, h);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            if self.optimize_speed {
                encoder.set_compression(png::Compression::Fast);
                encoder.set_filter(png::FilterType::NoFilter);
            } else {
                encoder.set_compression(png::Compression::Default);
                encoder.set_filter(png::FilterType::Paeth);
            }
            let mut writer = encoder
                .write_header()
                .map_err(|e| AppError::Raster(format!("PNG write_header error: {e}")))?;
            writer
                .write_image_data(pixmap.data())
                .map_err(|e| AppError::Raster(format!("PNG write_image_data error: {e}")))?;
            writer
                .finish()
                .map_err(|e| AppError::Raster(format!("PNG finish error: {e}")))?;
        }
        let t_encode = t0.elapsed();

        tracing::debug!(
            "PNG渲染内部分段: 解析={:?}, 栅格化={:?}, 编码={:?}, 总计={:?}",
            t_parse,
            t_raster - t_parse,
            t_encode - t_raster,
            t_encode
        );

        Ok(out)
    }
}
