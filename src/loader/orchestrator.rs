//! 批量加载编排器
//!
//! 驱动整个数据集的外层循环：按偏移量逐切片拉取、解析为
//! 规范化行、交给单事务或并行分块路径插入、累计指标。切片
//! 之间严格串行（偏移量推进依赖上一个切片的实际记录数），
//! 切片内部的块按并发上限并行。空切片是正常结束信号；数据
//! 源层面的错误是致命的，直接向上传播。

use crate::db::{ChunkStorage, InsertMode};
use crate::error::Result;
use crate::loader::chunk::{Chunk, plan_chunks};
use crate::loader::parallel::ParallelLoader;
use crate::loader::types::{
    InsertOutcome, LoadStrategy, RunSummary, SliceMetrics,
};
use crate::loader::worker::ChunkWorker;
use crate::paper::{Paper, PaperRow, RecordSource};
use std::sync::Arc;
use std::time::Instant;

/// 一次加载运行的参数
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// 目标表名
    pub table: String,
    /// 最多加载的记录总数
    pub total_records: usize,
    /// 每个切片的记录数
    pub slice_size: usize,
    /// 数据源起始偏移量
    pub start_offset: usize,
    /// 每个插入块的请求大小（过小时自动调优）
    pub chunk_size: usize,
    /// 并行路径的插入模式
    pub mode: InsertMode,
}

/// 批量加载编排器
///
/// 数据源与存储在构造时注入；运行级指标由编排器独占持有，
/// 只在每个切片的汇合点之后更新。
pub struct BatchOrchestrator {
    source: Arc<dyn RecordSource>,
    storage: Arc<dyn ChunkStorage>,
    options: LoadOptions,
}

impl BatchOrchestrator {
    /// 创建新的编排器
    pub fn new(
        source: Arc<dyn RecordSource>,
        storage: Arc<dyn ChunkStorage>,
        options: LoadOptions,
    ) -> Self {
        Self { source, storage, options }
    }

    /// 运行参数
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// 并行分块加载
    pub async fn run_parallel_load(
        &self,
        max_concurrency: usize,
    ) -> Result<RunSummary> {
        self.run(LoadStrategy::ParallelChunked { max_concurrency }).await
    }

    /// 单事务基线加载（无内部并发，用于对比）
    pub async fn run_single_transaction_load(&self) -> Result<RunSummary> {
        self.run(LoadStrategy::SingleTransaction).await
    }

    /// 按给定策略执行一次完整加载
    pub async fn run(&self, strategy: LoadStrategy) -> Result<RunSummary> {
        let run_start = Instant::now();
        let mut summary = RunSummary::default();
        let mut offset = self.options.start_offset;
        let mut processed = 0usize;
        let mut slice_index = 0usize;

        // 单事务基线沿用 COPY；并行路径的模式由配置决定
        let mode = match strategy {
            LoadStrategy::SingleTransaction => InsertMode::BulkCopy,
            LoadStrategy::ParallelChunked { .. } => self.options.mode,
        };
        let worker = Arc::new(ChunkWorker::new(
            Arc::clone(&self.storage),
            &self.options.table,
            mode,
        ));

        tracing::info!(
            "开始加载: 表 {}, 策略 {:?}, 切片 {}, 起始偏移 {}",
            self.options.table,
            strategy,
            self.options.slice_size,
            self.options.start_offset
        );

        loop {
            let remaining =
                self.options.total_records.saturating_sub(processed);
            if remaining == 0 {
                tracing::info!("已达到记录总数上限，加载结束");
                break;
            }
            let want = self.options.slice_size.min(remaining);

            let slice_start = Instant::now();
            let papers = self.source.fetch_slice(offset, want).await?;
            if papers.is_empty() {
                tracing::info!("数据源耗尽，加载结束");
                break;
            }
            let record_count = papers.len();

            // 解析阶段：领域记录 -> 规范化行，只做一次
            let parse_start = Instant::now();
            let rows: Vec<PaperRow> =
                papers.into_iter().map(Paper::into_row).collect();
            let parse_duration = parse_start.elapsed();

            // 插入阶段
            let insert_start = Instant::now();
            let outcomes =
                self.insert_slice(&strategy, &worker, rows).await;
            let insert_duration = insert_start.elapsed();

            let metrics = fold_outcomes(
                slice_index,
                offset,
                record_count,
                parse_duration,
                insert_duration,
                slice_start.elapsed(),
                &outcomes,
            );
            tracing::info!(
                "切片 {} 完成: {} 条记录, 插入 {} 行, 解析 {:?}, 插入 {:?}",
                slice_index + 1,
                record_count,
                metrics.inserted,
                parse_duration,
                insert_duration
            );
            summary.absorb(metrics);

            offset += record_count;
            processed += record_count;
            slice_index += 1;
        }

        summary.total_duration = run_start.elapsed();
        tracing::info!("加载完成: {}", summary);
        Ok(summary)
    }

    /// 把一个切片的行交给所选插入路径
    async fn insert_slice(
        &self,
        strategy: &LoadStrategy,
        worker: &Arc<ChunkWorker>,
        rows: Vec<PaperRow>,
    ) -> Vec<InsertOutcome> {
        match strategy {
            LoadStrategy::SingleTransaction => {
                // 整个切片作为一个块，复用同一套结果归类
                let chunk = Chunk { index: 0, total: 1, rows };
                vec![worker.insert_chunk(&chunk).await]
            }
            LoadStrategy::ParallelChunked { max_concurrency } => {
                let chunks = plan_chunks(rows, self.options.chunk_size);
                let loader =
                    ParallelLoader::new(Arc::clone(worker), *max_concurrency);
                loader.load_chunks(chunks).await
            }
        }
    }
}

/// 把一个切片的全部块结果折叠为切片指标
#[allow(clippy::too_many_arguments)]
fn fold_outcomes(
    slice_index: usize,
    offset: usize,
    record_count: usize,
    parse_duration: std::time::Duration,
    insert_duration: std::time::Duration,
    slice_duration: std::time::Duration,
    outcomes: &[InsertOutcome],
) -> SliceMetrics {
    SliceMetrics {
        slice_index,
        offset,
        record_count,
        inserted: outcomes.iter().map(|o| o.inserted).sum(),
        total_chunks: outcomes.len(),
        successful_chunks: outcomes.iter().filter(|o| o.is_success()).count(),
        duplicate_chunks: outcomes
            .iter()
            .filter(|o| o.skipped_duplicates)
            .count(),
        failed_chunks: outcomes.iter().filter(|o| o.error.is_some()).count(),
        parse_duration,
        insert_duration,
        slice_duration,
    }
}
