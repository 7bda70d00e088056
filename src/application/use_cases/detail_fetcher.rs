// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::settings::ScraperSettings;
use crate::domain::models::project_record::ProjectRecord;
use crate::domain::services::label_extractor::{lookup, lookup_first};
use crate::engines::locator::Locator;
use crate::engines::traits::{BrowserSession, EngineError, SessionFactory};
use crate::engines::waits::Wait;
use crate::utils::retry_policy::RetryPolicy;

const REGISTRATION_LABELS: [&str; 2] = ["RERA Registration No", "RERA Regd. No"];
const PROMOTER_LABELS: [&str; 2] = ["Company Name", "Promoter Name"];
const ADDRESS_LABELS: [&str; 2] = ["Registered Office Address", "Address"];
const GST_LABEL: &str = "GST No.";
const PROJECT_NAME_LABEL: &str = "Project Name";

/// 单次尝试的结果
#[derive(Debug)]
pub enum AttemptOutcome {
    /// 抓取成功
    Success(ProjectRecord),
    /// 失败但仍有剩余尝试次数
    Retryable(EngineError),
    /// 失败且已用尽尝试次数
    Exhausted(EngineError),
}

/// 详情页抓取器
///
/// 每次尝试都使用全新的浏览器会话：导航到详情页、提取基本字段、
/// 尝试切换到"Promoter Details"标签页、再提取发起人字段。
/// 任何错误都不会向外传播，重试用尽后返回全部为 `"Error"` 的记录。
pub struct DetailFetcher {
    factory: Arc<dyn SessionFactory>,
    wait: Wait,
    retry_policy: RetryPolicy,
}

impl DetailFetcher {
    pub fn new(factory: Arc<dyn SessionFactory>, wait: Wait, retry_policy: RetryPolicy) -> Self {
        Self {
            factory,
            wait,
            retry_policy,
        }
    }

    pub fn from_settings(factory: Arc<dyn SessionFactory>, settings: &ScraperSettings) -> Self {
        Self::new(
            factory,
            Wait::new(settings.wait_timeout(), settings.poll_interval()),
            settings.retry_policy(),
        )
    }

    /// 抓取单个项目详情页
    ///
    /// # 参数
    ///
    /// * `url` - 详情页URL
    /// * `index` - 项目序号（从1开始，仅用于日志）
    ///
    /// # 返回值
    ///
    /// 始终返回一条记录；重试用尽时为哨兵记录
    pub async fn fetch(&self, url: &str, index: usize) -> ProjectRecord {
        let mut attempt = 0;
        loop {
            match self.attempt(url, index, attempt).await {
                AttemptOutcome::Success(record) => {
                    counter!("rera_records_total", "status" => "ok").increment(1);
                    return record;
                }
                AttemptOutcome::Retryable(e) => {
                    warn!(
                        "Attempt {} failed for project {}. Retrying... Error: {}",
                        attempt + 1,
                        index,
                        e
                    );
                    counter!("rera_fetch_retries_total").increment(1);
                    attempt += 1;
                    let backoff = self.retry_policy.calculate_backoff(attempt);
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
                AttemptOutcome::Exhausted(e) => {
                    error!("All attempts failed for project {}. Error: {}", index, e);
                    counter!("rera_records_total", "status" => "error").increment(1);
                    return ProjectRecord::error();
                }
            }
        }
    }

    /// 执行一次完整尝试：创建会话、抓取、无条件释放会话
    pub async fn attempt(&self, url: &str, index: usize, attempt: u32) -> AttemptOutcome {
        counter!("rera_fetch_attempts_total").increment(1);

        let result = match self.factory.create().await {
            Ok(mut session) => {
                let scraped = self.scrape(&*session, url, index).await;
                if let Err(e) = session.quit().await {
                    warn!("Failed to close browser session for project {}: {}", index, e);
                }
                scraped
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => AttemptOutcome::Success(record),
            Err(e) if self.retry_policy.should_retry(attempt) => AttemptOutcome::Retryable(e),
            Err(e) => AttemptOutcome::Exhausted(e),
        }
    }

    async fn scrape(
        &self,
        session: &dyn BrowserSession,
        url: &str,
        index: usize,
    ) -> Result<ProjectRecord, EngineError> {
        info!("Processing project {}: {}", index, url);
        session.navigate(url).await?;

        // Tolerate markup drift: any label at all means the page rendered
        if let Err(e) = self
            .wait
            .until_present(session, &Locator::label_text(REGISTRATION_LABELS))
            .await
        {
            debug!("Registration label not found for project {}: {}", index, e);
            self.wait
                .until_present(session, &Locator::tag("label"))
                .await?;
        }

        let html = session.page_source().await?;
        let (registration_number, project_name) = extract_project_fields(&html);

        if let Err(e) = self.reveal_promoter_tab(session).await {
            warn!("Could not open Promoter Details tab for project {}: {}", index, e);
        }

        let html = session.page_source().await?;
        let (promoter_name, promoter_address, gst_number) = extract_promoter_fields(&html);

        let record = ProjectRecord::new(
            registration_number,
            project_name,
            promoter_name,
            promoter_address,
            gst_number,
        );
        if let Ok(json) = serde_json::to_string(&record) {
            debug!("Project {} record: {}", index, json);
        }
        Ok(record)
    }

    async fn reveal_promoter_tab(&self, session: &dyn BrowserSession) -> Result<(), EngineError> {
        let mut clicked = false;
        for locator in promoter_tab_locators() {
            if let Err(e) = self.wait.until_clickable(session, &locator).await {
                debug!("Promoter tab locator {} not clickable: {}", locator, e);
                continue;
            }
            match session.click(&locator).await {
                Ok(()) => {
                    clicked = true;
                    break;
                }
                Err(e) => debug!("Promoter tab locator {} click failed: {}", locator, e),
            }
        }

        if !clicked {
            return Err(EngineError::ElementNotFound(
                "Promoter Details tab".to_string(),
            ));
        }

        self.wait
            .until_present(session, &Locator::label_text(PROMOTER_LABELS))
            .await?;
        Ok(())
    }
}

/// 按顺序尝试的"Promoter Details"标签页定位器
pub fn promoter_tab_locators() -> [Locator; 3] {
    [
        Locator::link_text("Promoter Details"),
        Locator::link_href("promoter"),
        Locator::list_item_link_text("Promoter"),
    ]
}

// Html is !Send, so parsing stays in sync helpers and never crosses an await
fn extract_project_fields(html: &str) -> (String, String) {
    let document = Html::parse_document(html);
    (
        lookup(&document, REGISTRATION_LABELS[0]),
        lookup(&document, PROJECT_NAME_LABEL),
    )
}

fn extract_promoter_fields(html: &str) -> (String, String, String) {
    let document = Html::parse_document(html);
    (
        lookup_first(&document, &PROMOTER_LABELS),
        lookup_first(&document, &ADDRESS_LABELS),
        lookup(&document, GST_LABEL),
    )
}
