//! 数据库存储模块
//!
//! 提供统一的块写入接口和 PostgreSQL 实现

pub mod postgres;

use crate::error::Result;
use crate::paper::PaperRow;
use async_trait::async_trait;

pub use postgres::PgStorage;

/// 插入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// COPY 协议流式写入，吞吐最高，不做逐行冲突处理：
    /// 出现重复主键时整块中止
    BulkCopy,
    /// 多行参数化 INSERT，带 ON CONFLICT DO NOTHING，
    /// 重复主键被静默跳过
    BatchedInsert,
}

/// 表管理接口（建表 / 清空），供 CLI 和基准测试使用
#[async_trait]
pub trait TableAdmin: Send + Sync {
    /// 创建目标表（不存在时）
    async fn ensure_table(&self, table: &str) -> Result<()>;

    /// 清空目标表
    async fn truncate_table(&self, table: &str) -> Result<()>;
}

/// 块写入接口
///
/// 一次调用对应一个事务：成功即已提交，失败即已回滚。
/// 实现必须在 N 个并发调用下安全。
#[async_trait]
pub trait ChunkStorage: Send + Sync {
    /// 把一批规范化行写入指定表，返回实际插入的行数
    ///
    /// # Errors
    ///
    /// 重复主键返回 `EtlError::UniqueViolation`（按块恢复），
    /// 连接失败返回 `EtlError::Connection` / `EtlError::Pool`，
    /// 其余数据库错误原样向上传播。
    async fn insert_rows(
        &self,
        table: &str,
        rows: &[PaperRow],
        mode: InsertMode,
    ) -> Result<u64>;
}
