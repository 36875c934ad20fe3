use std::fs;
use std::path::Path;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::image::{BuiltinLayouts, TemplateRenderer, raster::get_global_font_db};

/// 执行启动检查
///
/// 1. 检查字体目录（缺失只告警，系统字体仍可用）
/// 2. 编译内置布局模板（语法错误阻断启动）
/// 3. 预热字体数据库，降低首个 PNG 请求的长尾延迟
pub async fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    check_fonts_dir(&config.fonts_path());

    TemplateRenderer::new()?;
    tracing::info!(
        "✅ 内置布局: {}",
        BuiltinLayouts::new().names().join(", ")
    );

    let fonts_dir = config.fonts_path();
    let t_prewarm = std::time::Instant::now();
    match tokio::task::spawn_blocking(move || get_global_font_db(&fonts_dir)).await {
        Ok(db) => tracing::info!(
            "字体数据库预热完成: {} faces, {}ms",
            db.len(),
            t_prewarm.elapsed().as_millis()
        ),
        Err(e) => tracing::warn!("字体数据库预热任务失败: {}", e),
    }

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

fn check_fonts_dir(dir: &Path) {
    let count = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| {
                    matches!(
                        e.path().extension().and_then(|x| x.to_str()),
                        Some("ttf") | Some("otf")
                    )
                })
                .count()
        })
        .unwrap_or(0);
    if count == 0 {
        tracing::warn!("📁 字体目录 {:?} 中没有可用字体，将只使用系统字体", dir);
    } else {
        tracing::info!("✅ 字体目录 {:?}: {} 个字体文件", dir, count);
    }
}
