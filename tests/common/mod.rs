//! 集成测试公共模块

use async_trait::async_trait;
use paper_etl::db::{ChunkStorage, InsertMode, TableAdmin};
use paper_etl::error::{EtlError, Result};
use paper_etl::paper::{Paper, PaperRow};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// 构造一批测试论文记录
#[allow(dead_code)]
pub fn sample_papers(start: usize, count: usize) -> Vec<Paper> {
    (start..start + count)
        .map(|i| Paper {
            paper_id: format!("paper_{:06}", i),
            title: Some(format!("测试论文 {}", i)),
            section: Some("Introduction".to_string()),
            text: Some(format!("正文内容 {}", i)),
        })
        .collect()
}

/// 构造一批规范化测试行
#[allow(dead_code)]
pub fn sample_rows(start: usize, count: usize) -> Vec<PaperRow> {
    sample_papers(start, count)
        .into_iter()
        .map(Paper::into_row)
        .collect()
}

/// 在临时目录中写入一个论文 JSON 文件
#[allow(dead_code)]
pub fn create_paper_file(
    dir: &TempDir,
    filename: &str,
    paper_id: &str,
) -> std::path::PathBuf {
    let content = format!(
        r#"{{
            "paper_id": "{paper_id}",
            "metadata": {{ "title": "Title of {paper_id}" }},
            "body_text": [
                {{ "section": "Introduction", "text": "First paragraph." }},
                {{ "section": "Methods", "text": "Second paragraph." }}
            ]
        }}"#
    );
    let file_path = dir.path().join(filename);
    std::fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// 内存存储：测试用的 `ChunkStorage` 实现
///
/// 以 `paper_id` 为主键模拟数据库的冲突语义：
/// - `BulkCopy` 模式下任意重复键使整批失败（唯一键冲突）
/// - `BatchedInsert` 模式下重复键被静默跳过
///
/// 同时用原子计数器记录并发高水位，供并发上限测试断言。
#[allow(dead_code)]
pub struct MemoryStorage {
    rows: Mutex<HashMap<String, PaperRow>>,
    /// 每次插入的人为延迟，用于制造真实的并发重叠
    insert_delay: Option<Duration>,
    /// 含有该主键的批次会直接失败（模拟毒块）
    fail_key: Option<String>,
    active: AtomicUsize,
    high_water: AtomicUsize,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            insert_delay: None,
            fail_key: None,
            active: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    pub fn with_fail_key(mut self, key: impl Into<String>) -> Self {
        self.fail_key = Some(key.into());
        self
    }

    /// 预置已存在的行（模拟表中已有数据）
    pub fn preload(&self, rows: Vec<PaperRow>) {
        let mut map = self.rows.lock().unwrap();
        for row in rows {
            map.insert(row.paper_id.clone(), row);
        }
    }

    /// 存储中当前的行数
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// 观察到的最大并发插入数
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// insert_rows 被调用的总次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn do_insert(
        &self,
        table: &str,
        rows: &[PaperRow],
        mode: InsertMode,
    ) -> Result<u64> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(fail_key) = &self.fail_key {
            if rows.iter().any(|r| &r.paper_id == fail_key) {
                return Err(EtlError::other("storage failure injected"));
            }
        }

        let mut map = self.rows.lock().unwrap();
        match mode {
            InsertMode::BulkCopy => {
                if rows.iter().any(|r| map.contains_key(&r.paper_id)) {
                    return Err(EtlError::UniqueViolation {
                        table: table.to_string(),
                    });
                }
                for row in rows {
                    map.insert(row.paper_id.clone(), row.clone());
                }
                Ok(rows.len() as u64)
            }
            InsertMode::BatchedInsert => {
                let mut inserted = 0u64;
                for row in rows {
                    if !map.contains_key(&row.paper_id) {
                        map.insert(row.paper_id.clone(), row.clone());
                        inserted += 1;
                    }
                }
                Ok(inserted)
            }
        }
    }
}

#[async_trait]
impl ChunkStorage for MemoryStorage {
    async fn insert_rows(
        &self,
        table: &str,
        rows: &[PaperRow],
        mode: InsertMode,
    ) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(current, Ordering::SeqCst);

        let result = self.do_insert(table, rows, mode).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl TableAdmin for MemoryStorage {
    async fn ensure_table(&self, _table: &str) -> Result<()> {
        Ok(())
    }

    async fn truncate_table(&self, _table: &str) -> Result<()> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }
}
