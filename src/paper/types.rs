//! 论文记录类型定义

use chrono::NaiveDateTime;

/// 单篇论文记录，由数据源产出，核心流程只读
///
/// `paper_id` 是全局唯一键，落库时作为主键使用。
#[derive(Debug, Clone, serde::Serialize)]
pub struct Paper {
    /// 论文唯一标识
    pub paper_id: String,
    /// 标题
    pub title: Option<String>,
    /// 正文第一段的章节名
    pub section: Option<String>,
    /// 正文全文（各段落拼接）
    pub text: Option<String>,
}

/// 规范化后的落库行
///
/// 与 `Paper` 的区别：`text` 字段在这里统一改名为 `content`
/// 列，并补上 `created_at` 时间戳。该转换在切片解析阶段
/// 执行一次，之后各插入块直接复用。
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaperRow {
    /// 论文唯一标识（主键）
    pub paper_id: String,
    /// 标题
    pub title: Option<String>,
    /// 章节名
    pub section: Option<String>,
    /// 正文内容
    pub content: Option<String>,
    /// 入库时间
    pub created_at: NaiveDateTime,
}

/// 落库行的列名，顺序与 COPY / INSERT 语句一致
pub const ROW_COLUMNS: [&str; 5] =
    ["paper_id", "title", "section", "content", "created_at"];

impl Paper {
    /// 转换为规范化落库行（text → content 改名发生在这里）
    pub fn into_row(self) -> PaperRow {
        PaperRow {
            paper_id: self.paper_id,
            title: self.title,
            section: self.section,
            content: self.text,
            created_at: chrono::Local::now().naive_local(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_row_renames_text() {
        let paper = Paper {
            paper_id: "abc123".to_string(),
            title: Some("标题".to_string()),
            section: Some("Introduction".to_string()),
            text: Some("body".to_string()),
        };

        let row = paper.into_row();
        assert_eq!(row.paper_id, "abc123");
        assert_eq!(row.content.as_deref(), Some("body"));
        assert_eq!(row.section.as_deref(), Some("Introduction"));
    }

    #[test]
    fn test_row_columns_order() {
        assert_eq!(ROW_COLUMNS[0], "paper_id");
        assert_eq!(ROW_COLUMNS[4], "created_at");
    }
}
