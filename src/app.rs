//! CLI 应用入口逻辑
//!
//! 读取配置、初始化日志、组装数据源与存储，按配置执行一次
//! 加载或完整的基准测试对比。

use crate::bench::{BenchmarkRunner, write_report};
use crate::config::Config;
use crate::db::{ChunkStorage, InsertMode, PgStorage, TableAdmin};
use crate::error::Result;
use crate::loader::{BatchOrchestrator, LoadOptions};
use crate::paper::{JsonDirSource, RecordSource};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// 运行应用
///
/// 配置路径取第一个命令行参数，缺省为 `config.toml`；
/// 文件不存在时使用默认配置。
pub async fn run() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = if Path::new(&config_path).exists() {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    #[cfg(feature = "logging")]
    {
        let level =
            config.log.level.parse::<tracing::Level>().map_err(|_| {
                crate::error::EtlError::config(format!(
                    "无法解析日志级别: {}",
                    config.log.level
                ))
            })?;
        crate::logging::init_logging(
            crate::logging::LogConfig::new()
                .level(level)
                .enable_stdout(config.log.enable_stdout)
                .log_dir(config.log.log_dir.as_str()),
        )?;
    }

    tracing::info!("配置加载完成: {}", config_path);

    let source: Arc<dyn RecordSource> =
        Arc::new(JsonDirSource::new(&config.source.paper_dir)?);
    let storage = Arc::new(PgStorage::connect(&config.database)?);
    let table = config.database.table_name.clone();

    storage.ensure_table(&table).await?;

    let mode = if config.load.use_bulk_copy {
        InsertMode::BulkCopy
    } else {
        InsertMode::BatchedInsert
    };

    // total_records 为 0 表示加载整个数据源
    let total_records = if config.load.total_records == 0 {
        source.total().await?
    } else {
        config.load.total_records
    };

    if config.benchmark.enabled {
        let runner = BenchmarkRunner::new(
            Arc::clone(&source),
            Arc::clone(&storage),
            &table,
            config.load.chunk_size,
            config.load.max_concurrency,
            mode,
            Duration::from_millis(config.benchmark.sample_interval_ms),
        );
        let results =
            runner.run_comparison(&config.benchmark.slice_sizes).await?;
        if !config.benchmark.report_path.is_empty() {
            write_report(&results, &config.benchmark.report_path)?;
        }
        return Ok(());
    }

    let options = LoadOptions {
        table,
        total_records,
        slice_size: config.load.slice_size,
        start_offset: config.load.start_offset,
        chunk_size: config.load.chunk_size,
        mode,
    };
    let orchestrator = BatchOrchestrator::new(
        source,
        storage as Arc<dyn ChunkStorage>,
        options,
    );

    let summary = match config.load.strategy.as_str() {
        "single" => orchestrator.run_single_transaction_load().await?,
        _ => {
            orchestrator
                .run_parallel_load(config.load.max_concurrency)
                .await?
        }
    };

    tracing::info!("运行结束: {}", summary);
    Ok(())
}
