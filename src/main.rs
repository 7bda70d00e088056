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

use rera_scraper::application::use_cases::orchestrator::{Orchestrator, RunOutcome};
use rera_scraper::config::settings::Settings;
use rera_scraper::engines::chromium_session::ChromiumSessionFactory;
use rera_scraper::engines::traits::SessionFactory;
use rera_scraper::infrastructure::metrics::init_metrics;
use rera_scraper::utils::telemetry;
use std::sync::Arc;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点。任何未处理的错误只记录日志，进程正常退出
#[tokio::main]
async fn main() {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting Odisha RERA scraper...");

    if let Err(e) = run().await {
        error!("Critical error in main execution: {:#}", e);
        error!("Please check your internet connection and try again.");
    }
}

async fn run() -> anyhow::Result<()> {
    // 2. Load configuration
    let settings = Settings::load()?;
    info!("Configuration loaded");

    // 3. Optional Prometheus exporter
    if let Some(addr) = &settings.metrics.prometheus_addr {
        init_metrics(addr)?;
    }

    // 4. Assemble the pipeline
    let factory: Arc<dyn SessionFactory> =
        Arc::new(ChromiumSessionFactory::new(settings.browser.clone()));
    let orchestrator = Orchestrator::from_settings(&settings, factory);

    // 5. Run
    match orchestrator.run(settings.scraper.limit).await {
        RunOutcome::Completed { records, csv_path } => {
            let failed = records.iter().filter(|r| r.is_error()).count();
            info!(
                "Run finished: {} records ({} failed), output: {}",
                records.len(),
                failed,
                csv_path
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "not saved".to_string())
            );
        }
        RunOutcome::NoProjectsDiscovered => info!("Run finished without discovering any projects"),
        RunOutcome::NoRecordsCollected => info!("Run finished without collecting any records"),
    }

    Ok(())
}
