//! 并发协调器
//!
//! 每个块立即派生一个任务，但同一时刻最多 N 个任务持有许可
//! 进入插入阶段：许可在工作器调用前获取、返回后立即释放，
//! 持有时长等于一次完整的插入操作。单个块的失败（包括任务
//! panic）不影响兄弟块，协调器总是收齐全部块的结果。

use crate::loader::chunk::Chunk;
use crate::loader::types::{ChunkErrorKind, InsertOutcome};
use crate::loader::worker::ChunkWorker;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// 并行块加载器
pub struct ParallelLoader {
    worker: Arc<ChunkWorker>,
    max_concurrency: usize,
}

impl ParallelLoader {
    /// 创建新的并行加载器
    ///
    /// `max_concurrency` 为 0 时提升为 1。
    pub fn new(worker: Arc<ChunkWorker>, max_concurrency: usize) -> Self {
        Self { worker, max_concurrency: max_concurrency.max(1) }
    }

    /// 并行插入所有块，返回每个块的结果
    ///
    /// 不保证结果顺序与块顺序一致（块之间键空间不相交，
    /// 完成顺序不影响正确性）；结果数量恒等于块数。
    pub async fn load_chunks(&self, chunks: Vec<Chunk>) -> Vec<InsertOutcome> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let total_chunks = chunks.len();
        let start = Instant::now();

        tracing::info!(
            "开始并行插入: {} 块, 并发上限 {}",
            total_chunks,
            self.max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let mut handles = Vec::with_capacity(total_chunks);
        for chunk in chunks {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                // 许可只覆盖插入本身
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        // 信号量不会被关闭；保险归类为存储失败
                        return InsertOutcome::failed(
                            chunk.index,
                            ChunkErrorKind::Storage,
                        );
                    }
                };
                let outcome = worker.insert_chunk(&chunk).await;
                drop(permit);
                outcome
            }));
        }

        let mut outcomes = Vec::with_capacity(total_chunks);
        for (spawn_index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!(
                        "块任务 {} panic: {}",
                        spawn_index + 1,
                        e
                    );
                    outcomes.push(InsertOutcome::failed(
                        spawn_index,
                        ChunkErrorKind::Panicked,
                    ));
                }
            }
        }

        let inserted: u64 = outcomes.iter().map(|o| o.inserted).sum();
        let successful = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(
            "并行插入完成: {} 行, {}/{} 块成功, 耗时 {:?}",
            inserted,
            successful,
            total_chunks,
            start.elapsed()
        );

        outcomes
    }
}
