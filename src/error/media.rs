//! 媒体引擎内部错误

use reqwest::StatusCode;

/// 媒体引擎错误类型
///
/// 跨越适配器边界时会被转换为 `MediaErrorInfo`。
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// 打开音频文件失败
    #[error("打开音频文件失败({uri}): {source}")]
    OpenFile {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    /// 解码音频失败
    #[error("解码音频失败({uri}): {message}")]
    Decode { uri: String, message: String },

    /// HTTP 请求错误
    #[error("下载音频失败({uri}): {source}")]
    Http {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP 状态码错误
    #[error("下载音频失败({uri}): HTTP {status}")]
    Status { uri: String, status: StatusCode },

    /// 写入临时文件失败
    #[error("写入临时文件失败({uri}): {source}")]
    Write {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    /// 音频输出流创建失败
    #[error("创建音频输出流失败: {0}")]
    OutputStream(String),

    /// Seek 失败
    #[error("Seek 失败: {0}")]
    Seek(String),
}

impl MediaError {
    /// 判断下载阶段的错误是否值得重试
    pub fn is_retryable(&self) -> bool {
        match self {
            MediaError::Http { .. } | MediaError::Write { .. } => true,
            MediaError::Status { status, .. } => {
                *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        let err = MediaError::Status {
            uri: "http://x/a.mp3".to_owned(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        assert!(err.is_retryable());

        let err = MediaError::Status {
            uri: "http://x/a.mp3".to_owned(),
            status: StatusCode::NOT_FOUND,
        };
        assert!(!err.is_retryable());

        let err = MediaError::Decode {
            uri: "/a.mp3".to_owned(),
            message: "unsupported".to_owned(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_open_file_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件未找到");
        let err = MediaError::OpenFile {
            uri: "/audio/a.mp3".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("/audio/a.mp3"));
        assert!(err.to_string().contains("文件未找到"));
    }
}
