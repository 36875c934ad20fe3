use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::image::ImageService;
use crate::shutdown::ShutdownManager;

/// 聚合的应用共享状态（只读，请求间共享）
#[derive(Clone)]
pub struct AppState {
    pub image: Arc<ImageService>,
    /// 健康检查据此判断是否处于排空阶段
    pub shutdown: ShutdownManager,
}

impl AppState {
    pub fn new(image: ImageService, shutdown: ShutdownManager) -> Self {
        Self {
            image: Arc::new(image),
            shutdown,
        }
    }

    pub fn from_config(config: &AppConfig, shutdown: ShutdownManager) -> Result<Self, AppError> {
        Ok(Self::new(ImageService::from_config(config)?, shutdown))
    }
}
