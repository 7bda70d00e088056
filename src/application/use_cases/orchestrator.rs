// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::FutureExt;
use metrics::counter;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::application::use_cases::detail_fetcher::DetailFetcher;
use crate::application::use_cases::listing_discoverer::ListingDiscoverer;
use crate::config::settings::Settings;
use crate::domain::models::project_record::ProjectRecord;
use crate::domain::repositories::record_repository::RecordStore;
use crate::engines::traits::SessionFactory;
use crate::infrastructure::storage::CsvRecordStore;
use crate::presentation::table::render_markdown;

/// 一次运行的结果
#[derive(Debug)]
pub enum RunOutcome {
    /// 列表页没有发现任何项目，未产生输出
    NoProjectsDiscovered,
    /// 所有抓取任务都异常退出，未产生输出
    NoRecordsCollected,
    /// 运行完成
    Completed {
        /// 按完成顺序排列的记录
        records: Vec<ProjectRecord>,
        /// CSV写入位置，写入失败时为 `None`
        csv_path: Option<PathBuf>,
    },
}

/// 抓取流程编排器
///
/// 先运行一次列表页发现，再以固定宽度的并发池抓取每个详情页，
/// 按完成顺序收集结果，最后渲染预览并持久化。
pub struct Orchestrator {
    discoverer: ListingDiscoverer,
    fetcher: Arc<DetailFetcher>,
    store: Arc<dyn RecordStore>,
    workers: usize,
}

impl Orchestrator {
    pub fn new(
        discoverer: ListingDiscoverer,
        fetcher: DetailFetcher,
        store: Arc<dyn RecordStore>,
        workers: usize,
    ) -> Self {
        Self {
            discoverer,
            fetcher: Arc::new(fetcher),
            store,
            workers: workers.max(1),
        }
    }

    /// 根据配置组装编排器，输出写入配置的CSV路径
    pub fn from_settings(settings: &Settings, factory: Arc<dyn SessionFactory>) -> Self {
        let store = CsvRecordStore::new(&settings.output.csv_path);
        info!(
            "Using {} browser sessions, writing to '{}'",
            factory.name(),
            store.path().display()
        );
        Self::new(
            ListingDiscoverer::from_settings(factory.clone(), &settings.scraper),
            DetailFetcher::from_settings(factory, &settings.scraper),
            Arc::new(store),
            settings.scraper.workers,
        )
    }

    /// 执行完整抓取流程
    ///
    /// # 参数
    ///
    /// * `limit` - 最多抓取的项目数量
    pub async fn run(&self, limit: usize) -> RunOutcome {
        let urls = self.discoverer.discover(limit).await;
        if urls.is_empty() {
            warn!("No URLs found to process.");
            return RunOutcome::NoProjectsDiscovered;
        }
        counter!("rera_discovered_urls_total").increment(urls.len() as u64);

        let records = self.fetch_all(urls).await;
        if records.is_empty() {
            error!("No project data was successfully scraped.");
            return RunOutcome::NoRecordsCollected;
        }

        println!(
            "\nScraping Complete. Here are the results:\n\n{}",
            render_markdown(&records)
        );

        let csv_path = match self.store.save(&records).await {
            Ok(path) => {
                info!("Data saved to '{}'.", path.display());
                Some(path)
            }
            Err(e) => {
                error!("Error saving CSV file: {}", e);
                None
            }
        };

        RunOutcome::Completed { records, csv_path }
    }

    async fn fetch_all(&self, urls: Vec<String>) -> Vec<ProjectRecord> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut projects: HashMap<task::Id, (usize, String)> = HashMap::with_capacity(urls.len());

        for (index, url) in urls.into_iter().enumerate() {
            let index = index + 1;
            let fetcher = self.fetcher.clone();
            let semaphore = semaphore.clone();
            let task_url = url.clone();
            let handle = tasks.spawn(async move {
                match semaphore.acquire_owned().await {
                    Ok(_permit) => AssertUnwindSafe(fetcher.fetch(&task_url, index))
                        .catch_unwind()
                        .await
                        .map_err(panic_message),
                    Err(e) => Err(e.to_string()),
                }
            });
            projects.insert(handle.id(), (index, url));
        }

        // Single consumer: results arrive in completion order
        let mut records = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            let (index, url, outcome) = resolve_task(joined, &mut projects);
            match outcome {
                Ok(record) => {
                    info!("Successfully processed project {}", index);
                    records.push(record);
                }
                Err(message) => {
                    counter!("rera_task_failures_total").increment(1);
                    error!("Error processing project {} ({}): {}", index, url, message);
                }
            }
        }
        records
    }
}

type TaskOutcome<T> = Result<T, String>;

/// 将任务结果（含 `JoinError`）还原为项目序号与URL
fn resolve_task<T>(
    joined: Result<(task::Id, TaskOutcome<T>), JoinError>,
    projects: &mut HashMap<task::Id, (usize, String)>,
) -> (usize, String, TaskOutcome<T>) {
    let (id, outcome) = match joined {
        Ok((id, outcome)) => (id, outcome),
        Err(e) => (e.id(), Err(e.to_string())),
    };
    let (index, url) = projects
        .remove(&id)
        .unwrap_or_else(|| (0, "<unknown>".to_string()));
    (index, url, outcome)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
