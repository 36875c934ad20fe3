/// 健康检查
pub mod health;
/// 按需图片生成
pub mod image;
