// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::engines::locator::Locator;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 页面导航失败
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    /// 等待超时
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },
    /// 元素未找到
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    /// 页面脚本执行失败
    #[error("Script evaluation failed: {0}")]
    Script(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, EngineError::Timeout { .. })
    }
}

/// 浏览器会话特质
///
/// 一个会话对应一个独立的浏览器实例和一个页面。会话只在单个任务的
/// 单次尝试中使用，用完必须调用 [`BrowserSession::quit`] 释放。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 导航到指定URL，DOM解析完成即返回
    async fn navigate(&self, url: &str) -> Result<(), EngineError>;

    /// 当前页面中匹配定位器的元素数量
    async fn count(&self, locator: &Locator) -> Result<usize, EngineError>;

    /// 第一个匹配元素是否可点击（存在、可见且未禁用）
    async fn is_clickable(&self, locator: &Locator) -> Result<bool, EngineError>;

    /// 通过脚本点击第一个匹配元素，绕过遮挡层
    async fn click(&self, locator: &Locator) -> Result<(), EngineError>;

    /// 读取第 `index` 个匹配元素的属性，属性缺失或为空时返回 `None`
    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>, EngineError>;

    /// 滚动到页面底部以触发懒加载
    async fn scroll_to_bottom(&self) -> Result<(), EngineError>;

    /// 当前渲染后的页面HTML
    async fn page_source(&self) -> Result<String, EngineError>;

    /// 关闭会话并释放浏览器资源
    async fn quit(&mut self) -> Result<(), EngineError>;
}

/// 会话工厂特质
///
/// 每次调用 [`SessionFactory::create`] 都返回一个全新的、互不共享的会话
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// 创建新会话
    async fn create(&self) -> Result<Box<dyn BrowserSession>, EngineError>;

    /// 工厂名称
    fn name(&self) -> &'static str;
}
