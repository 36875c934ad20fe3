//! 布局注册表：布局名 + 原始参数 → 布局定义 + 校验后的配置。
//!
//! 对渲染管线而言，布局与配置都是不透明值：管线只负责把解析结果原样交给渲染器。

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::features::image::types::QueryParams;

mod builtin;
pub mod schema;
pub(crate) mod text;

pub use builtin::{BUILTIN_TEMPLATES, BuiltinLayout, BuiltinLayouts};

/// 画布尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// 布局定义（模板 + 画布）
pub trait Layout: Send + Sync + fmt::Debug {
    /// 注册名（小写）
    fn name(&self) -> &str;
    /// 渲染所用模板名
    fn template_name(&self) -> &str;
    fn canvas(&self) -> Canvas;
}

/// 校验后的布局配置
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LayoutConfig(Map<String, Value>);

impl LayoutConfig {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// 单次请求内持有的解析结果，不缓存、不共享。
#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    pub layout: Arc<dyn Layout>,
    pub config: LayoutConfig,
}

/// 布局注册表
///
/// 实现必须是纯函数：相同输入得到等价输出，不在调用之间保留状态。
pub trait LayoutRegistry: Send + Sync {
    /// 布局不存在时返回 [`AppError::LayoutNotFound`]，参数不合法时返回 [`AppError::ConfigValidation`]。
    fn resolve(&self, name: &str, params: &QueryParams) -> Result<ResolvedLayout, AppError>;
}
