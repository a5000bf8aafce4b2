//! 分块规划模块
//!
//! 把一个切片的规范化行按块大小切分为有序、连续、不重叠的块。
//! 纯函数：相同输入永远得到相同的分块方案。

use crate::paper::PaperRow;

/// 自动调优的触发阈值：请求的块小于该值才考虑调优
const SMALL_CHUNK_THRESHOLD: usize = 1000;
/// 自动调优的触发阈值：数据量大于该值才考虑调优
const LARGE_SET_THRESHOLD: usize = 10_000;
/// 调优目标的块数上限
const MAX_PLANNED_CHUNKS: usize = 20;
/// 调优目标的块数下限
const MIN_PLANNED_CHUNKS: usize = 4;
/// 调优时每块的目标行数
const TARGET_ROWS_PER_CHUNK: usize = 5000;
/// 调优后每块的行数下限
const MIN_CHUNK_ROWS: usize = 1000;

/// 一个插入块：一次插入操作消费的连续行片段
///
/// `index` / `total` 只用于日志和指标，不影响正确性。
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 块序号（从 0 开始）
    pub index: usize,
    /// 本切片的块总数
    pub total: usize,
    /// 块内的行
    pub rows: Vec<PaperRow>,
}

impl Chunk {
    /// 用于日志的 "第几块/共几块" 标签
    pub fn label(&self) -> String {
        format!("{}/{}", self.index + 1, self.total)
    }
}

/// 计算实际生效的块大小
///
/// 请求的块过小而数据量很大时，按目标块数（4~20 块）重算，
/// 避免大量小块的调度开销；重算结果不低于行数下限。
pub fn effective_chunk_size(total_rows: usize, requested: usize) -> usize {
    let requested = requested.max(1);

    if requested < SMALL_CHUNK_THRESHOLD && total_rows > LARGE_SET_THRESHOLD {
        let optimal_chunks = (total_rows / TARGET_ROWS_PER_CHUNK)
            .clamp(MIN_PLANNED_CHUNKS, MAX_PLANNED_CHUNKS);
        return (total_rows / optimal_chunks).max(MIN_CHUNK_ROWS);
    }

    requested
}

/// 把一批行切分为有序的块
///
/// 保证：所有块拼接起来恰好是输入（顺序保持，无丢失、无重复）；
/// 空输入得到空块表；块大小覆盖全部行时得到单块。
pub fn plan_chunks(rows: Vec<PaperRow>, requested_size: usize) -> Vec<Chunk> {
    if rows.is_empty() {
        return Vec::new();
    }

    let total_rows = rows.len();
    let chunk_size = effective_chunk_size(total_rows, requested_size);
    let total = total_rows.div_ceil(chunk_size);

    if chunk_size != requested_size {
        tracing::debug!(
            "块大小自动调优: 请求 {} -> 实际 {}（共 {} 行，{} 块）",
            requested_size,
            chunk_size,
            total_rows,
            total
        );
    }

    let mut chunks = Vec::with_capacity(total);
    let mut rows = rows;

    let mut index = 0;
    while !rows.is_empty() {
        let rest = rows.split_off(chunk_size.min(rows.len()));
        chunks.push(Chunk { index, total, rows });
        rows = rest;
        index += 1;
    }

    chunks
}
