// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 标签-值提取
//!
//! 目标站点把字段名和字段值都渲染成 `<label>` 元素，二者只靠先后位置区分，
//! 因此"值"就是匹配标签之后文档顺序中的下一个 `<label>`。

use scraper::{ElementRef, Html, Node, Selector};
use tracing::warn;

use crate::domain::models::project_record::NOT_AVAILABLE;

/// 查找标签对应的值
///
/// 按三级策略依次尝试，首个命中即返回：
/// 1. 标签自身文本区分大小写地包含 `label_text`
/// 2. 标签自身文本不区分大小写地包含 `label_text`
/// 3. 线性扫描所有标签的完整文本（不区分大小写）
///
/// # 返回值
///
/// 下一个 `<label>` 去除首尾空白后的文本；未命中时返回 `"N/A"`
pub fn lookup(document: &Html, label_text: &str) -> String {
    let selector = match Selector::parse("label") {
        Ok(selector) => selector,
        Err(e) => {
            warn!("Error extracting {}: {}", label_text, e);
            return NOT_AVAILABLE.to_string();
        }
    };
    let labels: Vec<ElementRef<'_>> = document.select(&selector).collect();

    find_value(&labels, label_text).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// 按顺序尝试多个候选标签，返回第一个非 `"N/A"` 的值
pub fn lookup_first(document: &Html, label_texts: &[&str]) -> String {
    label_texts
        .iter()
        .map(|label| lookup(document, label))
        .find(|value| value != NOT_AVAILABLE)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn find_value(labels: &[ElementRef<'_>], label_text: &str) -> Option<String> {
    let needle = label_text.to_lowercase();

    let exact = labels
        .iter()
        .position(|label| own_string(label).is_some_and(|s| s.contains(label_text)));
    if let Some(value) = exact.and_then(|i| value_after(labels, i)) {
        return Some(value);
    }

    let relaxed = labels.iter().position(|label| {
        own_string(label).is_some_and(|s| s.to_lowercase().contains(&needle))
    });
    if let Some(value) = relaxed.and_then(|i| value_after(labels, i)) {
        return Some(value);
    }

    labels
        .iter()
        .enumerate()
        .filter(|(_, label)| full_text(label).to_lowercase().contains(&needle))
        .find_map(|(i, _)| value_after(labels, i))
}

/// 元素的唯一文本内容
///
/// 只有当元素（或其单子节点链）恰好包含一个文本节点时才有值，
/// 混合内容返回 `None`
fn own_string(element: &ElementRef<'_>) -> Option<String> {
    let mut node = **element;
    loop {
        let mut children = node.children();
        let only = children.next()?;
        if children.next().is_some() {
            return None;
        }
        match only.value() {
            Node::Text(text) => {
                let text: &str = text;
                return Some(text.to_string());
            }
            Node::Element(_) => node = only,
            _ => return None,
        }
    }
}

fn full_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

fn value_after(labels: &[ElementRef<'_>], index: usize) -> Option<String> {
    labels
        .get(index + 1)
        .map(|next| full_text(next).trim().to_string())
        .filter(|value| !value.is_empty())
}
