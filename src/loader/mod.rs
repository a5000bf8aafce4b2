//! 批量加载核心模块
//!
//! 提供分块规划、块插入工作器、并发协调和切片编排

pub mod chunk;
pub mod orchestrator;
pub mod parallel;
pub mod types;
pub mod worker;

// 重新导出核心类型和函数
pub use chunk::{Chunk, effective_chunk_size, plan_chunks};
pub use orchestrator::{BatchOrchestrator, LoadOptions};
pub use parallel::ParallelLoader;
pub use types::{
    ChunkErrorKind, InsertOutcome, LoadStrategy, RunSummary, SliceMetrics,
};
pub use worker::ChunkWorker;
