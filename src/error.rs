//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。
//! 按恢复语义划分：唯一键冲突与连接/池错误按块恢复，
//! 数据源与配置错误对整个运行是致命的。

use tokio_postgres::error::SqlState;

/// 语料加载器的结果类型
pub type Result<T> = std::result::Result<T, EtlError>;

/// 语料加载错误类型
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析错误
    #[error("JSON解析错误: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML 配置解析错误
    #[error("TOML解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    /// 数据库错误（未分类的底层错误，视为致命）
    #[error("数据库错误: {0}")]
    Db(#[from] tokio_postgres::Error),

    /// 唯一键冲突（按块恢复：回滚后该块计 0 条）
    #[error("唯一键冲突: 表 {table}")]
    UniqueViolation { table: String },

    /// 连接错误（按块恢复：触发一次直连回退）
    #[error("连接错误: {0}")]
    Connection(String),

    /// 连接池错误（按块恢复：触发一次直连回退）
    #[error("连接池错误: {0}")]
    Pool(String),

    /// 数据源错误（致命：偏移量簿记无法恢复）
    #[error("数据源错误: {0}")]
    Source(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 日志错误（仅在启用 logging feature 时可用）
    #[cfg(feature = "logging")]
    #[error("日志错误: {0}")]
    Log(#[from] crate::logging::LogError),

    /// 其他错误
    #[error("未知错误: {0}")]
    Other(String),
}

impl EtlError {
    /// 创建一个配置错误
    pub fn config<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        {
            crate::logging::ensure_logger_initialized();
            tracing::error!("配置错误: {}", message);
        }
        Self::Config(message)
    }

    /// 创建一个数据源错误
    pub fn source<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        {
            crate::logging::ensure_logger_initialized();
            tracing::error!("数据源错误: {}", message);
        }
        Self::Source(message)
    }

    /// 创建一个连接错误
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection(message.into())
    }

    /// 创建一个连接池错误
    pub fn pool<S: Into<String>>(message: S) -> Self {
        Self::Pool(message.into())
    }

    /// 创建一个其他类型错误
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }

    /// 将底层 PostgreSQL 错误归类为本库的错误语义
    ///
    /// SQLSTATE 23505（唯一键冲突）映射为 `UniqueViolation`，
    /// 连接已关闭映射为 `Connection`，其余保持原样（致命）。
    pub fn from_db(err: tokio_postgres::Error, table: &str) -> Self {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            return Self::UniqueViolation { table: table.to_string() };
        }
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Db(err)
    }

    /// 检查是否为唯一键冲突
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, EtlError::UniqueViolation { .. })
    }

    /// 检查是否为连接类错误（连接或连接池）
    pub fn is_connection_error(&self) -> bool {
        matches!(self, EtlError::Connection(_) | EtlError::Pool(_))
    }

    /// 检查是否为数据源错误
    pub fn is_source_error(&self) -> bool {
        matches!(self, EtlError::Source(_))
    }

    /// 检查是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(self, EtlError::Config(_))
    }

    /// 检查该错误是否可以按块恢复（运行继续，该块计 0 条）
    pub fn is_chunk_recoverable(&self) -> bool {
        self.is_unique_violation() || self.is_connection_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let config_err = EtlError::config("缺少数据库配置");
        assert!(config_err.is_config_error());

        let source_err = EtlError::source("目录不存在");
        assert!(source_err.is_source_error());

        let conn_err = EtlError::connection("connection refused");
        assert!(conn_err.is_connection_error());
        assert!(conn_err.is_chunk_recoverable());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: EtlError = io_err.into();
        assert!(matches!(err, EtlError::Io(_)));
        assert!(!err.is_chunk_recoverable());
    }

    #[test]
    fn test_unique_violation_recoverable() {
        let err = EtlError::UniqueViolation { table: "artigos".to_string() };
        assert!(err.is_unique_violation());
        assert!(err.is_chunk_recoverable());

        let display = format!("{}", err);
        assert!(display.contains("artigos"));
    }

    #[test]
    fn test_pool_error_recoverable() {
        let err = EtlError::pool("pool exhausted");
        assert!(err.is_connection_error());
        assert!(err.is_chunk_recoverable());
        assert!(!err.is_unique_violation());
    }
}
