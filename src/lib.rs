//! 研究论文 JSON 语料的 PostgreSQL 批量加载与并行分块插入基准库
//!
//! 核心是并行分块插入引擎：把切片拆分为块、用计数信号量限制
//! 同时在插入中的块数、按块归类失败（重复主键按块跳过、运行
//! 继续）、汇总每切片的解析/插入耗时。单事务 COPY 路径作为
//! 基线对比保留。

// 核心模块
pub mod error;
pub mod loader;
pub mod paper;

// 外围模块
pub mod app;
pub mod bench;
pub mod config;
pub mod db;

#[cfg(feature = "logging")]
pub mod logging;

/// 常用类型的统一导出
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::db::{ChunkStorage, InsertMode, PgStorage, TableAdmin};
    pub use crate::error::{EtlError, Result};
    pub use crate::loader::{
        BatchOrchestrator, Chunk, ChunkWorker, InsertOutcome, LoadOptions,
        LoadStrategy, ParallelLoader, RunSummary, SliceMetrics, plan_chunks,
    };
    pub use crate::paper::{
        JsonDirSource, MemorySource, Paper, PaperRow, RecordSource,
    };
}
