//! 论文数据源模块
//!
//! 数据源按 (offset, count) 分页产出论文记录：`offset` 越界时返回
//! 空切片（正常结束信号，不是错误），文件不可读或 JSON 损坏时
//! 返回致命的数据源错误。

use crate::error::{EtlError, Result};
use crate::paper::extract::paper_from_json;
use crate::paper::types::Paper;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 论文数据源接口
///
/// 一条记录对应一篇论文。实现必须保证同一 offset 的重复读取
/// 返回相同的记录序列（orchestrator 依赖这一点推进偏移量）。
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// 拉取一个切片
    ///
    /// 返回从 `offset` 开始、最多 `count` 条的有序记录。
    /// `offset >= total` 时返回空序列。
    async fn fetch_slice(&self, offset: usize, count: usize)
    -> Result<Vec<Paper>>;

    /// 数据源中的记录总数
    async fn total(&self) -> Result<usize>;
}

/// 目录数据源：扫描目录中的论文 JSON 文件
///
/// 构造时收集一次文件清单（按文件名排序保证顺序稳定），
/// 之后的分页读取基于该清单。
#[derive(Debug)]
pub struct JsonDirSource {
    /// 扫描到的 JSON 文件清单
    files: Vec<PathBuf>,
}

impl JsonDirSource {
    /// 扫描目录并构造数据源
    ///
    /// 仅收集扩展名为 `.json` 的普通文件，忽略子目录。
    ///
    /// # Errors
    ///
    /// 目录不存在或不可读时返回 `EtlError::Source`。
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(EtlError::source(format!(
                "论文目录不存在: {}",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            {
                files.push(path);
            }
        }

        // 排序保证多次运行的偏移量语义一致
        files.sort();

        tracing::debug!("论文目录扫描完成，共 {} 个 JSON 文件", files.len());

        Ok(Self { files })
    }

    /// 清单中的文件数量
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl RecordSource for JsonDirSource {
    async fn fetch_slice(
        &self,
        offset: usize,
        count: usize,
    ) -> Result<Vec<Paper>> {
        if offset >= self.files.len() {
            return Ok(Vec::new());
        }

        let end = (offset + count).min(self.files.len());
        let mut papers = Vec::with_capacity(end - offset);

        for path in &self.files[offset..end] {
            let data = tokio::fs::read(path).await.map_err(|e| {
                EtlError::source(format!(
                    "读取论文文件失败: {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let paper = paper_from_json(&data).map_err(|e| {
                EtlError::source(format!(
                    "论文文件损坏: {}: {}",
                    path.display(),
                    e
                ))
            })?;
            papers.push(paper);
        }

        tracing::trace!(
            "拉取切片完成: offset={}, count={}, 实际 {} 条",
            offset,
            count,
            papers.len()
        );

        Ok(papers)
    }

    async fn total(&self) -> Result<usize> {
        Ok(self.files.len())
    }
}

/// 内存数据源：基于现成的记录列表
///
/// 用于合成数据运行和测试。
pub struct MemorySource {
    papers: Vec<Paper>,
}

impl MemorySource {
    /// 从记录列表构造
    pub fn new(papers: Vec<Paper>) -> Self {
        Self { papers }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_slice(
        &self,
        offset: usize,
        count: usize,
    ) -> Result<Vec<Paper>> {
        if offset >= self.papers.len() {
            return Ok(Vec::new());
        }
        let end = (offset + count).min(self.papers.len());
        Ok(self.papers[offset..end].to_vec())
    }

    async fn total(&self) -> Result<usize> {
        Ok(self.papers.len())
    }
}
