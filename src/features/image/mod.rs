//! 按需图片生成：布局名 + 参数 → SVG / PNG。

pub mod failure;
pub mod framer;
pub mod handler;
pub mod layouts;
pub mod raster;
pub mod renderer;
pub mod sanitize;
pub mod service;
pub mod types;

pub use handler::create_image_router;
pub use layouts::{BuiltinLayouts, LayoutRegistry, ResolvedLayout};
pub use raster::{Rasterizer, ResvgRasterizer};
pub use renderer::{TemplateRenderer, VectorRenderer};
pub use sanitize::{HtmlSanitizer, Sanitizer};
pub use service::ImageService;
pub use types::{FileType, QueryParams, QueryValue, RenderRequest, RenderedImage};
