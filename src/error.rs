//! 错误类型模块
//!
//! 四类错误对应四个退出码，stderr 上的 `error_type` 字段由它们派生

use std::io;

/// 请求器错误
#[derive(Debug, thiserror::Error)]
pub enum RequesterError {
    /// 输入错误：stdin 不可读、JSON 格式错误、URL 无法解析
    #[error("{0}")]
    Input(String),
    /// 配置错误：配置文件缺失或格式错误
    #[error("{0}")]
    Config(String),
    /// 网络错误：TCP 连接、代理握手、TLS 握手、HTTP 解析、body 读取失败
    #[error("{0}")]
    Network(String),
    /// 超时错误：连接或读取超过期限
    #[error("{0}")]
    Timeout(String),
}

impl RequesterError {
    /// 按错误文本区分超时与一般网络错误
    /// 对应 Go 版本对 `timeout`/`deadline` 子串的判断
    pub fn network(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let lower = msg.to_lowercase();
        if lower.contains("timeout") || lower.contains("deadline") || lower.contains("timed out") {
            RequesterError::Timeout(msg)
        } else {
            RequesterError::Network(msg)
        }
    }

    /// stderr JSON 中的 `error_type` 字段
    pub fn error_type(&self) -> &'static str {
        match self {
            RequesterError::Input(_) => "INPUT_ERROR",
            RequesterError::Config(_) => "CONFIG_ERROR",
            RequesterError::Network(_) => "NETWORK_ERROR",
            RequesterError::Timeout(_) => "TIMEOUT_ERROR",
        }
    }

    /// 进程退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            RequesterError::Input(_) => 1,
            RequesterError::Network(_) => 2,
            RequesterError::Timeout(_) => 3,
            RequesterError::Config(_) => 4,
        }
    }
}

impl From<io::Error> for RequesterError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                RequesterError::Timeout(format!("timeout: {}", err))
            }
            _ => RequesterError::network(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RequesterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(RequesterError::Input("x".into()).exit_code(), 1);
        assert_eq!(RequesterError::Network("x".into()).exit_code(), 2);
        assert_eq!(RequesterError::Timeout("x".into()).exit_code(), 3);
        assert_eq!(RequesterError::Config("x".into()).exit_code(), 4);
    }

    #[test]
    fn test_network_classifies_timeout_text() {
        assert!(matches!(
            RequesterError::network("read deadline exceeded"),
            RequesterError::Timeout(_)
        ));
        assert!(matches!(
            RequesterError::network("connection timeout"),
            RequesterError::Timeout(_)
        ));
        assert!(matches!(
            RequesterError::network("connection refused"),
            RequesterError::Network(_)
        ));
    }

    #[test]
    fn test_io_timeout_mapping() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "read timed out");
        assert!(matches!(RequesterError::from(err), RequesterError::Timeout(_)));

        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(RequesterError::from(err), RequesterError::Network(_)));
    }
}
