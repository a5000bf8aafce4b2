//! 论文 JSON 提取模块
//!
//! 把单个论文 JSON 文件（CORD-19 风格结构）提取为一条 `Paper`
//! 记录：`paper_id`、元数据标题、第一段的章节名、正文各段拼接。
//! 纯函数，无任何 IO。

use crate::error::{EtlError, Result};
use crate::paper::types::Paper;
use serde::Deserialize;

/// 论文 JSON 的顶层结构（只取需要的字段）
#[derive(Debug, Deserialize)]
struct RawArticle {
    paper_id: String,
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    body_text: Vec<RawParagraph>,
}

/// 元数据结构
#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    title: Option<String>,
}

/// 正文段落结构
#[derive(Debug, Deserialize)]
struct RawParagraph {
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    text: String,
}

/// 从 JSON 字节提取一条论文记录
///
/// # Errors
///
/// JSON 不合法或缺少 `paper_id` 时返回 `EtlError::Json` /
/// `EtlError::Source`，对整个运行是致命的。
pub fn paper_from_json(data: &[u8]) -> Result<Paper> {
    let article: RawArticle = serde_json::from_slice(data)?;

    if article.paper_id.is_empty() {
        return Err(EtlError::source("论文记录缺少 paper_id"));
    }

    // 空标题视为缺失
    let title = article.metadata.title.filter(|t| !t.is_empty());

    let section = article
        .body_text
        .first()
        .and_then(|p| p.section.clone())
        .filter(|s| !s.is_empty());

    // 正文各段拼接为单一字段
    let text = if article.body_text.is_empty() {
        None
    } else {
        let joined = article
            .body_text
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Some(joined)
    };

    Ok(Paper { paper_id: article.paper_id, title, section, text })
}
