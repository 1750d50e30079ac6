//! 应用通用错误

use super::CatalogError;

/// 应用通用错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 曲目目录错误
    #[error("曲目目录错误: {0}")]
    Catalog(#[from] CatalogError),

    /// JSON 序列化错误
    #[error("JSON 序列化失败: {0}")]
    Serde(#[from] serde_json::Error),
}
