//! 论文记录模块
//!
//! 提供论文记录类型、JSON 提取和分页数据源

pub mod extract;
pub mod source;
pub mod types;

// 重新导出核心类型和函数
pub use extract::paper_from_json;
pub use source::{JsonDirSource, MemorySource, RecordSource};
pub use types::{Paper, PaperRow, ROW_COLUMNS};
