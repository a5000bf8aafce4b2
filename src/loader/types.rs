//! 加载流程的结果与指标类型

use std::time::Duration;

/// 加载策略
///
/// 显式的枚举选择，带类型化的并发参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// 单事务基线：整个切片一个事务，无内部并发
    SingleTransaction,
    /// 并行分块：切片拆块后在并发上限内并行插入
    ParallelChunked {
        /// 同时在插入中的块数上限
        max_concurrency: usize,
    },
}

/// 块失败的归类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkErrorKind {
    /// 连接或连接池错误（直连回退也失败后）
    Connection,
    /// 其他存储层错误
    Storage,
    /// 工作任务 panic
    Panicked,
}

/// 单个块的插入结果
///
/// 创建后不再修改，由 orchestrator 统一汇总。
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    /// 块序号
    pub chunk_index: usize,
    /// 实际插入的行数
    pub inserted: u64,
    /// 是否因重复主键而跳过（预期内的可恢复情况）
    pub skipped_duplicates: bool,
    /// 失败原因（重复主键不算失败）
    pub error: Option<ChunkErrorKind>,
}

impl InsertOutcome {
    /// 成功插入
    pub fn success(chunk_index: usize, inserted: u64) -> Self {
        Self { chunk_index, inserted, skipped_duplicates: false, error: None }
    }

    /// 整块因重复主键被跳过
    pub fn duplicates(chunk_index: usize) -> Self {
        Self {
            chunk_index,
            inserted: 0,
            skipped_duplicates: true,
            error: None,
        }
    }

    /// 块失败（运行继续，该块计 0 条）
    pub fn failed(chunk_index: usize, kind: ChunkErrorKind) -> Self {
        Self {
            chunk_index,
            inserted: 0,
            skipped_duplicates: false,
            error: Some(kind),
        }
    }

    /// 是否算成功块（有实际插入）
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.inserted > 0
    }
}

/// 单个切片的指标
#[derive(Debug, Clone, serde::Serialize)]
pub struct SliceMetrics {
    /// 切片序号（从 0 开始）
    pub slice_index: usize,
    /// 该切片在数据源中的起始偏移量
    pub offset: usize,
    /// 从数据源实际取得的记录数
    pub record_count: usize,
    /// 实际插入的行数
    pub inserted: u64,
    /// 切片拆出的块数
    pub total_chunks: usize,
    /// 有实际插入的块数
    pub successful_chunks: usize,
    /// 因重复主键整块跳过的块数
    pub duplicate_chunks: usize,
    /// 失败的块数
    pub failed_chunks: usize,
    /// 解析耗时（切片 -> 规范化行）
    pub parse_duration: Duration,
    /// 插入耗时（coordinator / worker 路径）
    pub insert_duration: Duration,
    /// 切片总耗时
    pub slice_duration: Duration,
}

/// 一次完整运行的汇总
///
/// 由 orchestrator 独占持有，只在每个切片的汇合点之后更新，
/// 工作任务从不直接写它。
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunSummary {
    /// 实际插入的总行数
    pub total_inserted: u64,
    /// 从数据源取得的总记录数
    pub total_records: usize,
    /// 处理的块总数
    pub total_chunks: usize,
    /// 有实际插入的块数
    pub successful_chunks: usize,
    /// 因重复主键跳过的块数
    pub duplicate_chunks: usize,
    /// 失败的块数
    pub failed_chunks: usize,
    /// 运行总耗时
    pub total_duration: Duration,
    /// 按顺序的每切片指标
    pub slices: Vec<SliceMetrics>,
}

impl RunSummary {
    /// 把一个切片的指标并入汇总
    pub fn absorb(&mut self, slice: SliceMetrics) {
        self.total_inserted += slice.inserted;
        self.total_records += slice.record_count;
        self.total_chunks += slice.total_chunks;
        self.successful_chunks += slice.successful_chunks;
        self.duplicate_chunks += slice.duplicate_chunks;
        self.failed_chunks += slice.failed_chunks;
        self.slices.push(slice);
    }

    /// 每秒插入行数
    pub fn records_per_second(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs > 0.0 { self.total_inserted as f64 / secs } else { 0.0 }
    }

    /// 平均每行耗时（毫秒）
    pub fn millis_per_record(&self) -> f64 {
        if self.total_inserted > 0 {
            self.total_duration.as_secs_f64() * 1000.0
                / self.total_inserted as f64
        } else {
            0.0
        }
    }

    /// 所有切片的解析耗时合计
    pub fn total_parse_duration(&self) -> Duration {
        self.slices.iter().map(|s| s.parse_duration).sum()
    }

    /// 所有切片的插入耗时合计
    pub fn total_insert_duration(&self) -> Duration {
        self.slices.iter().map(|s| s.insert_duration).sum()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "插入 {} 条 / 读取 {} 条, {}/{} 块成功",
            self.total_inserted,
            self.total_records,
            self.successful_chunks,
            self.total_chunks
        )?;

        if self.duplicate_chunks > 0 {
            write!(f, ", {} 块因重复跳过", self.duplicate_chunks)?;
        }
        if self.failed_chunks > 0 {
            write!(f, ", {} 块失败", self.failed_chunks)?;
        }

        write!(
            f,
            ", 耗时: {:.2}s, 速度: {:.0} 行/秒",
            self.total_duration.as_secs_f64(),
            self.records_per_second()
        )
    }
}
