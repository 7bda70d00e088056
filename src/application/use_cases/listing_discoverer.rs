// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::settings::ScraperSettings;
use crate::engines::locator::Locator;
use crate::engines::traits::{BrowserSession, EngineError, SessionFactory};
use crate::engines::waits::Wait;

const VIEW_DETAILS_TEXT: &str = "View Details";
const PROJECT_PATH_FRAGMENT: &str = "/project/";

/// 列表页发现器
///
/// 打开项目列表页，收集至多 `limit` 个详情页URL
pub struct ListingDiscoverer {
    factory: Arc<dyn SessionFactory>,
    listing_url: String,
    wait: Wait,
}

impl ListingDiscoverer {
    pub fn new(factory: Arc<dyn SessionFactory>, listing_url: impl Into<String>, wait: Wait) -> Self {
        Self {
            factory,
            listing_url: listing_url.into(),
            wait,
        }
    }

    pub fn from_settings(factory: Arc<dyn SessionFactory>, settings: &ScraperSettings) -> Self {
        Self::new(
            factory,
            settings.listing_url.clone(),
            Wait::new(settings.wait_timeout(), settings.poll_interval()),
        )
    }

    /// 发现详情页URL
    ///
    /// # 参数
    ///
    /// * `limit` - 返回URL数量上限
    ///
    /// # 返回值
    ///
    /// 详情页URL列表；列表页无法加载或没有任何项目链接时为空
    pub async fn discover(&self, limit: usize) -> Vec<String> {
        if limit == 0 {
            info!("Project limit is 0, skipping listing page");
            return Vec::new();
        }

        let mut session = match self.factory.create().await {
            Ok(session) => session,
            Err(e) => {
                error!("Error opening browser for listing page: {}", e);
                return Vec::new();
            }
        };

        let result = self.collect_urls(&*session, limit).await;
        if let Err(e) = session.quit().await {
            warn!("Failed to close listing browser session: {}", e);
        }

        match result {
            Ok(urls) if urls.is_empty() => {
                warn!("No project links found. Check if the website structure has changed.");
                urls
            }
            Ok(urls) => {
                info!("Found {} project URLs to process", urls.len());
                urls
            }
            Err(e) => {
                error!("Error during initial page scraping: {}", e);
                Vec::new()
            }
        }
    }

    async fn collect_urls(
        &self,
        session: &dyn BrowserSession,
        limit: usize,
    ) -> Result<Vec<String>, EngineError> {
        info!("Opening RERA projects list page...");
        session.navigate(&self.listing_url).await?;

        let view_details = Locator::link_text(VIEW_DETAILS_TEXT);
        if let Err(e) = self.wait.until_present(session, &view_details).await {
            warn!("Error waiting for View Details links: {}", e);
            // Lazy-rendered tables only fill in once scrolled into view
            session.scroll_to_bottom().await?;
            self.wait.until_present(session, &Locator::tag("a")).await?;
        }

        let Some((locator, found)) = self.first_matching_strategy(session).await else {
            return Ok(Vec::new());
        };

        let take = found.min(limit);
        let mut urls = Vec::with_capacity(take);
        for index in 0..take {
            match session.attribute(&locator, index, "href").await {
                Ok(Some(href)) => urls.push(href),
                Ok(None) => warn!("Project link {} has no URL, skipping", index + 1),
                Err(e) => warn!("Error getting URL from link {}: {}", index + 1, e),
            }
        }
        Ok(urls)
    }

    async fn first_matching_strategy(
        &self,
        session: &dyn BrowserSession,
    ) -> Option<(Locator, usize)> {
        for locator in link_strategies() {
            match session.count(&locator).await {
                Ok(0) => continue,
                Ok(found) => return Some((locator, found)),
                Err(e) => warn!("Failed to find project links with {}: {}", locator, e),
            }
        }
        None
    }
}

/// 项目链接定位策略，按顺序使用第一个有结果的
pub fn link_strategies() -> [Locator; 2] {
    [
        Locator::link_text(VIEW_DETAILS_TEXT),
        Locator::link_href(PROJECT_PATH_FRAGMENT),
    ]
}
