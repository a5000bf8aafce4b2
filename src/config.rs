//! 配置管理模块
//!
//! 提供统一的配置文件读取和管理功能。连接信息在这里显式构造并
//! 注入到存储层，不使用模块级全局连接串。

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 语料数据源配置
    #[serde(default)]
    pub source: SourceConfig,
    /// PostgreSQL 配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 加载配置
    #[serde(default)]
    pub load: LoadConfig,
    /// 基准测试配置
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用控制台输出
    pub enable_stdout: bool,
    /// 日志输出目录
    pub log_dir: String,
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

/// 语料数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 论文 JSON 文件目录
    pub paper_dir: String,
}

/// PostgreSQL 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 主机地址
    pub host: String,
    /// 端口号
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 数据库名
    pub database: String,
    /// 目标表名
    pub table_name: String,
    /// 连接池最小连接数
    pub pool_min_size: usize,
    /// 连接池最大连接数
    pub pool_max_size: usize,
    /// 是否启用连接池（关闭时每个块直连）
    pub use_pool: bool,
}

/// 加载策略名称（single 或 parallel）
const STRATEGY_NAMES: [&str; 2] = ["single", "parallel"];

/// 加载配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// 加载策略: "single" | "parallel"
    pub strategy: String,
    /// 本次运行最多加载的记录总数（0 表示加载整个数据源）
    pub total_records: usize,
    /// 每个切片从数据源拉取的记录数
    pub slice_size: usize,
    /// 起始偏移量
    pub start_offset: usize,
    /// 每个插入块的记录数（过小时自动调优）
    pub chunk_size: usize,
    /// 并行插入的最大并发数
    pub max_concurrency: usize,
    /// 是否使用 COPY 批量写入（false 时使用多行 INSERT 跳过冲突）
    pub use_bulk_copy: bool,
}

/// 基准测试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// 是否启用基准测试（对比两种策略）
    pub enabled: bool,
    /// 要扫描的切片大小列表
    pub slice_sizes: Vec<usize>,
    /// 内存采样间隔（毫秒）
    pub sample_interval_ms: u64,
    /// 结果 JSON 报告输出路径
    pub report_path: String,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从字符串加载配置
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EtlError::config(format!("配置序列化失败: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        match self.log.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(EtlError::config(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }

        // 验证加载策略
        if !STRATEGY_NAMES.contains(&self.load.strategy.as_str()) {
            return Err(EtlError::config(format!(
                "无效的加载策略: {}（可选: single, parallel）",
                self.load.strategy
            )));
        }

        // 验证并发数与切片大小
        if self.load.max_concurrency == 0 {
            return Err(EtlError::config("最大并发数不能为0"));
        }
        if self.load.slice_size == 0 {
            return Err(EtlError::config("切片大小不能为0"));
        }

        // 验证连接池边界
        if self.database.use_pool
            && (self.database.pool_max_size == 0
                || self.database.pool_min_size > self.database.pool_max_size)
        {
            return Err(EtlError::config(format!(
                "无效的连接池配置: min={}, max={}",
                self.database.pool_min_size, self.database.pool_max_size
            )));
        }

        if self.benchmark.enabled && self.benchmark.slice_sizes.is_empty() {
            return Err(EtlError::config("基准测试未配置任何切片大小"));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// 构造 tokio-postgres 连接串
    pub fn conninfo(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.username, self.password
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            source: SourceConfig::default(),
            database: DatabaseConfig::default(),
            load: LoadConfig::default(),
            benchmark: BenchmarkConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
            log_dir: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { paper_dir: "papers".to_string() }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "etldb".to_string(),
            table_name: "artigos".to_string(),
            pool_min_size: 1,
            pool_max_size: 5,
            use_pool: true,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            strategy: "parallel".to_string(),
            total_records: 0,
            slice_size: 10_000,
            start_offset: 0,
            chunk_size: 5_000,
            max_concurrency: 4,
            use_bulk_copy: true,
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            slice_sizes: vec![10_000, 20_000],
            sample_interval_ms: 200,
            report_path: "benchmark_report.json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // 测试无效日志级别
        config.log.level = "invalid".to_string();
        assert!(config.validate().is_err());

        // 测试并发数为0
        config.log.level = "info".to_string();
        config.load.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_strategy() {
        let mut config = Config::default();
        config.load.strategy = "reflection".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_pool_bounds() {
        let mut config = Config::default();
        config.database.pool_min_size = 10;
        config.database.pool_max_size = 5;
        assert!(config.validate().is_err());

        // 关闭连接池后不再校验边界
        config.database.use_pool = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed_config: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.log.level, parsed_config.log.level);
        assert_eq!(
            config.database.table_name,
            parsed_config.database.table_name
        );
        assert_eq!(config.load.chunk_size, parsed_config.load.chunk_size);
    }

    #[test]
    fn test_conninfo() {
        let config = DatabaseConfig::default();
        let conninfo = config.conninfo();
        assert!(conninfo.contains("host=localhost"));
        assert!(conninfo.contains("port=5432"));
        assert!(conninfo.contains("dbname=etldb"));
    }
}
