// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;

/// 元素定位器
///
/// 覆盖目标站点用到的几种定位方式，由会话实现转换为具体查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// 文本包含指定内容的 `<a>`
    LinkText(String),
    /// `href` 包含指定内容的 `<a>`
    LinkHref(String),
    /// `<li>` 直接子元素中文本包含指定内容的 `<a>`
    ListItemLinkText(String),
    /// 文本包含任一指定内容的 `<label>`
    LabelText(Vec<String>),
    /// 指定标签名的任意元素
    Tag(String),
}

impl Locator {
    pub fn link_text(text: impl Into<String>) -> Self {
        Locator::LinkText(text.into())
    }

    pub fn link_href(fragment: impl Into<String>) -> Self {
        Locator::LinkHref(fragment.into())
    }

    pub fn list_item_link_text(text: impl Into<String>) -> Self {
        Locator::ListItemLinkText(text.into())
    }

    pub fn label_text<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Locator::LabelText(texts.into_iter().map(Into::into).collect())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Locator::Tag(name.into())
    }

    /// 转换为 XPath 表达式
    pub fn to_xpath(&self) -> String {
        match self {
            Locator::LinkText(text) => format!("//a[contains(text(), {})]", xpath_literal(text)),
            Locator::LinkHref(fragment) => {
                format!("//a[contains(@href, {})]", xpath_literal(fragment))
            }
            Locator::ListItemLinkText(text) => {
                format!("//li/a[contains(text(), {})]", xpath_literal(text))
            }
            Locator::LabelText(texts) if texts.is_empty() => "//label".to_string(),
            Locator::LabelText(texts) => {
                let predicates = texts
                    .iter()
                    .map(|t| format!("contains(text(), {})", xpath_literal(t)))
                    .collect::<Vec<_>>()
                    .join(" or ");
                format!("//label[{}]", predicates)
            }
            Locator::Tag(name) => format!("//{}", name),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xpath())
    }
}

/// XPath 1.0 没有转义语法，同时含两种引号时只能用 concat() 拼接
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{}\"", value)
    } else if !value.contains('\'') {
        format!("'{}'", value)
    } else {
        let parts = value
            .split('"')
            .map(|part| format!("\"{}\"", part))
            .collect::<Vec<_>>()
            .join(", '\"', ");
        format!("concat({})", parts)
    }
}
