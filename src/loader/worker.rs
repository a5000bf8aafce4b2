//! 块插入工作器
//!
//! 一次调用消费一个块：通过存储接口在一个事务里写入，并把
//! 结果归类为 `InsertOutcome`。错误从不向上抛——重复主键和
//! 存储失败都折算成 0 条的结果，运行继续。

use crate::db::{ChunkStorage, InsertMode};
use crate::loader::chunk::Chunk;
use crate::loader::types::{ChunkErrorKind, InsertOutcome};
use std::sync::Arc;
use std::time::Instant;

/// 块插入工作器
///
/// 表名与插入模式在构造时固定，可被多个并发任务共享。
pub struct ChunkWorker {
    storage: Arc<dyn ChunkStorage>,
    table: String,
    mode: InsertMode,
}

impl ChunkWorker {
    /// 创建新的工作器
    pub fn new(
        storage: Arc<dyn ChunkStorage>,
        table: impl Into<String>,
        mode: InsertMode,
    ) -> Self {
        Self { storage, table: table.into(), mode }
    }

    /// 目标表名
    pub fn table(&self) -> &str {
        &self.table
    }

    /// 插入一个块并归类结果
    ///
    /// 重复主键：记一条日志，返回 0 条 + `skipped_duplicates`；
    /// 其他错误：记一条日志，返回 0 条 + 错误归类。
    pub async fn insert_chunk(&self, chunk: &Chunk) -> InsertOutcome {
        let start = Instant::now();

        match self
            .storage
            .insert_rows(&self.table, &chunk.rows, self.mode)
            .await
        {
            Ok(inserted) => {
                tracing::debug!(
                    "块 {} 插入完成: {} 行, 耗时 {:?}",
                    chunk.label(),
                    inserted,
                    start.elapsed()
                );
                InsertOutcome::success(chunk.index, inserted)
            }
            Err(e) if e.is_unique_violation() => {
                tracing::info!("块 {} 因重复主键被跳过", chunk.label());
                InsertOutcome::duplicates(chunk.index)
            }
            Err(e) if e.is_connection_error() => {
                tracing::error!("块 {} 连接失败: {}", chunk.label(), e);
                InsertOutcome::failed(chunk.index, ChunkErrorKind::Connection)
            }
            Err(e) => {
                tracing::error!("块 {} 插入失败: {}", chunk.label(), e);
                InsertOutcome::failed(chunk.index, ChunkErrorKind::Storage)
            }
        }
    }
}
