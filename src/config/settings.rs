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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::utils::errors::ScrapeError;
use crate::utils::retry_policy::RetryPolicy;

pub const DEFAULT_LISTING_URL: &str = "https://rera.odisha.gov.in/projects/project-list";
pub const DEFAULT_CSV_PATH: &str = "odisha_rera_projects.csv";

/// 应用程序配置设置
///
/// 包含抓取流程、浏览器会话、输出和指标导出等所有配置项
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// 抓取流程配置
    pub scraper: ScraperSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 输出配置
    pub output: OutputSettings,
    /// 指标配置
    #[serde(default)]
    pub metrics: MetricsSettings,
}

/// 抓取流程配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// 项目列表页URL
    pub listing_url: String,
    /// 最多抓取的项目数量
    pub limit: usize,
    /// 并发浏览器会话数
    pub workers: usize,
    /// 每个项目的最大重试次数
    pub max_retries: u32,
    /// 元素等待超时时间（秒）
    pub wait_timeout_secs: u64,
    /// 元素轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 重试初始退避时间（毫秒）
    pub retry_backoff_ms: u64,
}

impl ScraperSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 根据配置构建重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
            ..RetryPolicy::fast()
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            limit: 6,
            workers: 3,
            max_retries: 2,
            wait_timeout_secs: 15,
            poll_interval_ms: 500,
            retry_backoff_ms: 500,
        }
    }
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头模式运行
    pub headless: bool,
    /// 窗口宽度
    pub window_width: u32,
    /// 窗口高度
    pub window_height: u32,
    /// 是否禁用图片加载
    pub disable_images: bool,
    /// CDP请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// Chrome可执行文件路径（可选，默认自动检测）
    pub chrome_executable: Option<String>,
    /// 远程Chrome调试地址（可选，设置后不再启动本地浏览器）
    pub remote_debugging_url: Option<String>,
}

impl BrowserSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            disable_images: true,
            request_timeout_secs: 30,
            chrome_executable: None,
            remote_debugging_url: None,
        }
    }
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// CSV输出文件路径
    pub csv_path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            csv_path: DEFAULT_CSV_PATH.to_string(),
        }
    }
}

/// 指标导出配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Prometheus监听地址，未设置时不启动导出器
    pub prometheus_addr: Option<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default.toml`、`config/{APP_ENVIRONMENT}.toml`
    /// 以及 `RERA__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("RERA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 加载并校验配置
    pub fn load() -> Result<Self, ScrapeError> {
        let settings = Self::new()?;
        settings.validate()?;
        Ok(settings)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let scraper = ScraperSettings::default();
        let browser = BrowserSettings::default();
        Config::builder()
            // Default scraper settings
            .set_default("scraper.listing_url", scraper.listing_url)?
            .set_default("scraper.limit", scraper.limit as u64)?
            .set_default("scraper.workers", scraper.workers as u64)?
            .set_default("scraper.max_retries", u64::from(scraper.max_retries))?
            .set_default("scraper.wait_timeout_secs", scraper.wait_timeout_secs)?
            .set_default("scraper.poll_interval_ms", scraper.poll_interval_ms)?
            .set_default("scraper.retry_backoff_ms", scraper.retry_backoff_ms)?
            // Default browser settings
            .set_default("browser.headless", browser.headless)?
            .set_default("browser.window_width", u64::from(browser.window_width))?
            .set_default("browser.window_height", u64::from(browser.window_height))?
            .set_default("browser.disable_images", browser.disable_images)?
            .set_default("browser.request_timeout_secs", browser.request_timeout_secs)?
            // Default output settings
            .set_default("output.csv_path", DEFAULT_CSV_PATH)
    }

    /// 校验配置值
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.scraper.listing_url).map_err(|e| {
            ConfigError::Message(format!(
                "scraper.listing_url '{}' is not a valid URL: {}",
                self.scraper.listing_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "scraper.listing_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.scraper.workers == 0 {
            return Err(ConfigError::Message(
                "scraper.workers must be at least 1".to_string(),
            ));
        }
        if self.scraper.wait_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "scraper.wait_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.scraper.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "scraper.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.output.csv_path.trim().is_empty() {
            return Err(ConfigError::Message(
                "output.csv_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
