//! 后端访问错误类型定义。

/// 后端访问错误。
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// HTTP 请求错误
    #[error("http error: {0}")]
    Http(String),

    /// 响应体解析错误
    #[error("decode error: {0}")]
    Decode(String),

    /// IO 错误（写入连接）
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置错误（非法基址等）
    #[error("config error: {0}")]
    Config(String),
}
