//! 曲目目录错误

use std::path::PathBuf;

use crate::domain::TrackId;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// 目录必须至少包含一首曲目
    #[error("曲目目录为空")]
    Empty,

    #[error("曲目 ID 重复: {0}")]
    DuplicateId(TrackId),

    /// 查询了配置中不存在的 ID（属于程序不变量被破坏）
    #[error("曲目不存在: {0}")]
    NotFound(TrackId),

    #[error("读取曲目目录失败({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("解析曲目目录失败: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        assert_eq!(CatalogError::Empty.to_string(), "曲目目录为空");
        assert_eq!(
            CatalogError::NotFound(TrackId(7)).to_string(),
            "曲目不存在: 7"
        );
    }

    #[test]
    fn test_parse_error_from_toml() {
        let err = toml::from_str::<toml::Value>("tracks = [").unwrap_err();
        let err = CatalogError::from(err);
        assert!(err.to_string().contains("解析曲目目录失败"));
    }
}
