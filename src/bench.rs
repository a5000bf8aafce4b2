//! 加载策略基准测试模块
//!
//! 对同一数据源按多个切片大小分别运行单事务和并行分块两种
//! 策略，轮次之间清空目标表，记录吞吐、单行延迟和进程内存
//! 峰值，结果可序列化为 JSON 报告。不负责绘图。

use crate::db::{ChunkStorage, InsertMode, TableAdmin};
use crate::error::{EtlError, Result};
use crate::loader::{
    BatchOrchestrator, LoadOptions, LoadStrategy, RunSummary,
};
use crate::paper::RecordSource;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{ProcessesToUpdate, System};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 单轮基准测试结果
#[derive(Debug, Clone, serde::Serialize)]
pub struct BenchmarkResult {
    /// 策略名（single / parallel）
    pub strategy: String,
    /// 本轮的切片大小
    pub slice_size: usize,
    /// 运行汇总
    pub summary: RunSummary,
    /// 吞吐（行/秒）
    pub records_per_second: f64,
    /// 平均单行耗时（毫秒）
    pub millis_per_record: f64,
    /// 各切片解析耗时合计（秒）
    pub parse_seconds: f64,
    /// 各切片插入耗时合计（秒）
    pub insert_seconds: f64,
    /// 本轮进程内存峰值（字节）
    pub peak_memory_bytes: u64,
}

/// 可取消的周期性内存采样任务
///
/// 每个采样周期刷新一次当前进程的 RSS 并记录峰值。`stop`
/// 发送停止信号后等待任务退出，峰值只在任务汇合后读取。
pub struct MemorySampler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<u64>,
}

impl MemorySampler {
    /// 启动采样任务
    pub fn start(interval: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let pid = match sysinfo::get_current_pid() {
                Ok(pid) => pid,
                Err(e) => {
                    tracing::warn!("无法获取当前进程 PID: {}", e);
                    return 0;
                }
            };
            let mut system = System::new();
            let mut ticker = tokio::time::interval(interval);
            let mut peak = 0u64;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        system.refresh_processes(
                            ProcessesToUpdate::Some(&[pid]),
                            true,
                        );
                        if let Some(process) = system.process(pid) {
                            peak = peak.max(process.memory());
                        }
                    }
                    result = rx.changed() => {
                        // 停止信号或发送端被丢弃都结束采样
                        let _ = result;
                        break;
                    }
                }
            }

            peak
        });

        Self { shutdown, handle }
    }

    /// 停止采样并返回观察到的内存峰值（字节）
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown.send(true);
        self.handle.await.unwrap_or_else(|e| {
            tracing::warn!("内存采样任务异常退出: {}", e);
            0
        })
    }
}

/// 基准测试执行器
///
/// 对每个切片大小跑完整的单事务与并行两轮，轮次之间清空
/// 目标表保证可比性。
pub struct BenchmarkRunner<S> {
    source: Arc<dyn RecordSource>,
    storage: Arc<S>,
    table: String,
    /// 并行轮次的参数
    chunk_size: usize,
    max_concurrency: usize,
    mode: InsertMode,
    sample_interval: Duration,
}

impl<S> BenchmarkRunner<S>
where
    S: ChunkStorage + TableAdmin + 'static,
{
    /// 创建新的基准测试执行器
    pub fn new(
        source: Arc<dyn RecordSource>,
        storage: Arc<S>,
        table: impl Into<String>,
        chunk_size: usize,
        max_concurrency: usize,
        mode: InsertMode,
        sample_interval: Duration,
    ) -> Self {
        Self {
            source,
            storage,
            table: table.into(),
            chunk_size,
            max_concurrency,
            mode,
            sample_interval,
        }
    }

    /// 对每个切片大小依次运行两种策略
    pub async fn run_comparison(
        &self,
        slice_sizes: &[usize],
    ) -> Result<Vec<BenchmarkResult>> {
        let total_records = self.source.total().await?;
        let mut results = Vec::new();

        for &slice_size in slice_sizes {
            tracing::info!("基准测试: slice_size = {}", slice_size);

            for strategy in [
                LoadStrategy::SingleTransaction,
                LoadStrategy::ParallelChunked {
                    max_concurrency: self.max_concurrency,
                },
            ] {
                let result = self
                    .run_once(strategy, slice_size, total_records)
                    .await?;
                tracing::info!(
                    "策略 {} / 切片 {}: {:.0} 行/秒, 内存峰值 {:.1} MB",
                    result.strategy,
                    slice_size,
                    result.records_per_second,
                    result.peak_memory_bytes as f64 / 1024.0 / 1024.0
                );
                results.push(result);
            }
        }

        Ok(results)
    }

    /// 跑一轮：清表、采样、加载、汇合采样后汇总
    async fn run_once(
        &self,
        strategy: LoadStrategy,
        slice_size: usize,
        total_records: usize,
    ) -> Result<BenchmarkResult> {
        self.storage.truncate_table(&self.table).await?;

        let options = LoadOptions {
            table: self.table.clone(),
            total_records,
            slice_size,
            start_offset: 0,
            chunk_size: self.chunk_size,
            mode: self.mode,
        };
        let orchestrator = BatchOrchestrator::new(
            Arc::clone(&self.source),
            Arc::clone(&self.storage) as Arc<dyn ChunkStorage>,
            options,
        );

        let sampler = MemorySampler::start(self.sample_interval);
        let run_result = orchestrator.run(strategy).await;
        // 先汇合采样任务再汇总，保证峰值覆盖整个运行
        let peak_memory_bytes = sampler.stop().await;
        let summary = run_result?;

        Ok(BenchmarkResult {
            strategy: strategy_name(&strategy).to_string(),
            slice_size,
            records_per_second: summary.records_per_second(),
            millis_per_record: summary.millis_per_record(),
            parse_seconds: summary.total_parse_duration().as_secs_f64(),
            insert_seconds: summary.total_insert_duration().as_secs_f64(),
            peak_memory_bytes,
            summary,
        })
    }
}

/// 策略在报告中的名称
fn strategy_name(strategy: &LoadStrategy) -> &'static str {
    match strategy {
        LoadStrategy::SingleTransaction => "single",
        LoadStrategy::ParallelChunked { .. } => "parallel",
    }
}

/// 把基准测试结果写为 JSON 报告文件
pub fn write_report(
    results: &[BenchmarkResult],
    path: &str,
) -> Result<()> {
    let json = serde_json::to_string_pretty(results)
        .map_err(|e| EtlError::other(format!("报告序列化失败: {}", e)))?;
    std::fs::write(path, json)?;
    tracing::info!("基准测试报告已写入: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sampler_stops() {
        let sampler = MemorySampler::start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let peak = sampler.stop().await;
        // 进程 RSS 必然非零（除非平台不支持采样）
        let _ = peak;
    }

    #[test]
    fn test_strategy_name() {
        assert_eq!(strategy_name(&LoadStrategy::SingleTransaction), "single");
        assert_eq!(
            strategy_name(&LoadStrategy::ParallelChunked {
                max_concurrency: 4
            }),
            "parallel"
        );
    }
}
