// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use rera_scraper::engines::locator::Locator;
use rera_scraper::engines::traits::{BrowserSession, EngineError, SessionFactory};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 模拟站点中的一个页面
#[derive(Clone, Default)]
pub struct MockPage {
    pub html: String,
    /// 点击任意可点击元素后切换到的页面内容
    pub after_click: Option<String>,
    /// 滚动到底部后切换到的页面内容
    pub after_scroll: Option<String>,
    /// 前 N 次导航失败
    pub fail_first: usize,
    /// 每次导航都失败
    pub unreachable: bool,
    /// 导航时使任务崩溃
    pub crashes: bool,
}

impl MockPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn crashing() -> Self {
        Self {
            crashes: true,
            ..Default::default()
        }
    }

    pub fn with_click(mut self, html: impl Into<String>) -> Self {
        self.after_click = Some(html.into());
        self
    }

    pub fn with_scroll(mut self, html: impl Into<String>) -> Self {
        self.after_scroll = Some(html.into());
        self
    }

    pub fn failing_first(mut self, attempts: usize) -> Self {
        self.fail_first = attempts;
        self
    }
}

/// 内存中的模拟站点，同时充当会话工厂
///
/// 记录会话的创建和关闭次数，以及每个URL的导航次数
#[derive(Default)]
pub struct MockSite {
    state: Arc<SiteState>,
}

#[derive(Default)]
struct SiteState {
    pages: Mutex<HashMap<String, MockPage>>,
    navigations: Mutex<HashMap<String, usize>>,
    created: AtomicUsize,
    closed: AtomicUsize,
    open: AtomicUsize,
    peak_open: AtomicUsize,
    launch_fails: AtomicBool,
}

impl MockSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_page(&self, url: impl Into<String>, page: MockPage) {
        self.state.pages.lock().unwrap().insert(url.into(), page);
    }

    pub fn fail_launches(&self) {
        self.state.launch_fails.store(true, Ordering::SeqCst);
    }

    pub fn sessions_created(&self) -> usize {
        self.state.created.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// 同时打开的会话数峰值
    pub fn peak_open_sessions(&self) -> usize {
        self.state.peak_open.load(Ordering::SeqCst)
    }

    pub fn navigations(&self, url: &str) -> usize {
        self.state
            .navigations
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn factory(self: &Arc<Self>) -> Arc<dyn SessionFactory> {
        self.clone()
    }
}

impl SiteState {
    fn page(&self, url: &str) -> Option<MockPage> {
        self.pages.lock().unwrap().get(url).cloned()
    }

    fn record_navigation(&self, url: &str) -> usize {
        let mut navigations = self.navigations.lock().unwrap();
        let count = navigations.entry(url.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

#[async_trait]
impl SessionFactory for MockSite {
    async fn create(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        if self.state.launch_fails.load(Ordering::SeqCst) {
            return Err(EngineError::Launch("chrome not found".to_string()));
        }
        self.state.created.fetch_add(1, Ordering::SeqCst);
        let open = self.state.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak_open.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            site: self.state.clone(),
            loaded: Mutex::new(None),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

struct LoadedPage {
    page: MockPage,
    html: String,
}

pub struct MockSession {
    site: Arc<SiteState>,
    loaded: Mutex<Option<LoadedPage>>,
}

impl MockSession {
    fn current_html(&self) -> Result<String, EngineError> {
        self.loaded
            .lock()
            .unwrap()
            .as_ref()
            .map(|loaded| loaded.html.clone())
            .ok_or_else(|| EngineError::Other("no page loaded".to_string()))
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        let visit = self.site.record_navigation(url);
        if self.site.page(url).is_some_and(|page| page.crashes) {
            panic!("renderer crashed on {}", url);
        }
        let page = self
            .site
            .page(url)
            .filter(|page| !page.unreachable && visit > page.fail_first)
            .ok_or_else(|| EngineError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            })?;

        let html = page.html.clone();
        *self.loaded.lock().unwrap() = Some(LoadedPage { page, html });
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize, EngineError> {
        let html = self.current_html()?;
        Ok(select(&html, locator, |_| ()).len())
    }

    async fn is_clickable(&self, locator: &Locator) -> Result<bool, EngineError> {
        Ok(self.count(locator).await? > 0)
    }

    async fn click(&self, locator: &Locator) -> Result<(), EngineError> {
        if self.count(locator).await? == 0 {
            return Err(EngineError::ElementNotFound(locator.to_string()));
        }
        let mut loaded = self.loaded.lock().unwrap();
        if let Some(loaded) = loaded.as_mut() {
            if let Some(next) = &loaded.page.after_click {
                loaded.html = next.clone();
            }
        }
        Ok(())
    }

    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        let html = self.current_html()?;
        let values = select(&html, locator, |element| {
            element.value().attr(name).map(str::to_string)
        });
        match values.into_iter().nth(index) {
            Some(value) => Ok(value.filter(|v| !v.is_empty())),
            None => Err(EngineError::ElementNotFound(format!(
                "{} at index {}",
                locator, index
            ))),
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), EngineError> {
        let mut loaded = self.loaded.lock().unwrap();
        if let Some(loaded) = loaded.as_mut() {
            if let Some(next) = &loaded.page.after_scroll {
                loaded.html = next.clone();
            }
        }
        Ok(())
    }

    async fn page_source(&self) -> Result<String, EngineError> {
        self.current_html()
    }

    async fn quit(&mut self) -> Result<(), EngineError> {
        self.site.closed.fetch_add(1, Ordering::SeqCst);
        self.site.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 用 scraper 模拟 XPath 定位器的匹配语义
fn select<T>(html: &str, locator: &Locator, map: impl Fn(ElementRef<'_>) -> T) -> Vec<T> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(css_for(locator)) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter(|element| matches_locator(element, locator))
        .map(map)
        .collect()
}

fn css_for(locator: &Locator) -> &str {
    match locator {
        Locator::LinkText(_) | Locator::LinkHref(_) => "a",
        Locator::ListItemLinkText(_) => "li > a",
        Locator::LabelText(_) => "label",
        Locator::Tag(name) => name,
    }
}

fn matches_locator(element: &ElementRef<'_>, locator: &Locator) -> bool {
    match locator {
        Locator::LinkText(text) | Locator::ListItemLinkText(text) => {
            direct_text_contains(element, text)
        }
        Locator::LinkHref(fragment) => element
            .value()
            .attr("href")
            .is_some_and(|href| href.contains(fragment.as_str())),
        Locator::LabelText(texts) => {
            texts.is_empty() || texts.iter().any(|t| direct_text_contains(element, t))
        }
        Locator::Tag(_) => true,
    }
}

fn direct_text_contains(element: &ElementRef<'_>, needle: &str) -> bool {
    element.children().any(|child| match child.value() {
        Node::Text(text) => text.contains(needle),
        _ => false,
    })
}
