// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::settings::BrowserSettings;
use crate::engines::locator::Locator;
use crate::engines::traits::{BrowserSession, EngineError, SessionFactory};

const REMOTE_URL_ENV: &str = "CHROMIUM_REMOTE_DEBUGGING_URL";
const READY_STATE_POLL: Duration = Duration::from_millis(100);

/// Chromium 会话工厂
///
/// 每次创建都会启动一个独立的 Chrome 进程（使用独立的用户数据目录），
/// 或在配置了远程调试地址时连接到已有实例并打开新页面。
pub struct ChromiumSessionFactory {
    settings: BrowserSettings,
    profile_root: PathBuf,
}

impl ChromiumSessionFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            profile_root: std::env::temp_dir(),
        }
    }

    /// 指定存放临时用户数据目录的父目录
    pub fn with_profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    async fn launch(&self, user_data_dir: &Path) -> Result<(Browser, Handler), EngineError> {
        tokio::fs::create_dir_all(user_data_dir)
            .await
            .map_err(|e| EngineError::Launch(format!("Failed to create browser profile: {}", e)))?;
        let config = self.browser_config(user_data_dir)?;
        Browser::launch(config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))
    }

    fn remote_debugging_url(&self) -> Option<String> {
        self.settings
            .remote_debugging_url
            .clone()
            .or_else(|| std::env::var(REMOTE_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
    }

    fn browser_config(&self, user_data_dir: &Path) -> Result<BrowserConfig, EngineError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(self.settings.window_width, self.settings.window_height)
            .request_timeout(self.settings.request_timeout())
            .user_data_dir(user_data_dir)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if self.settings.disable_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(EngineError::Launch)
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn create(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        let remote_url = self.remote_debugging_url();

        let (browser, mut handler, user_data_dir) = if let Some(ref url) = remote_url {
            debug!("Connecting to remote Chrome instance at: {}", url);
            let (browser, handler) = Browser::connect(url.as_str()).await.map_err(|e| {
                EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e))
            })?;
            (browser, handler, None)
        } else {
            let user_data_dir = self.profile_root.join(format!(
                "rera-scraper-{}-{:016x}",
                std::process::id(),
                rand::random::<u64>()
            ));
            match self.launch(&user_data_dir).await {
                Ok((browser, handler)) => (browser, handler, Some(user_data_dir)),
                Err(e) => {
                    let _ = tokio::fs::remove_dir_all(&user_data_dir).await;
                    return Err(e);
                }
            }
        };

        // Drive the CDP connection until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let mut session = ChromiumSession {
            page: None,
            browser,
            handler,
            owns_browser: remote_url.is_none(),
            user_data_dir,
            request_timeout: self.settings.request_timeout(),
            closed: false,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                session.page = Some(page);
                Ok(Box::new(session))
            }
            Err(e) => {
                let _ = session.quit().await;
                Err(EngineError::Launch(format!("Failed to open page: {}", e)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// Chromium 浏览器会话
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    owns_browser: bool,
    user_data_dir: Option<PathBuf>,
    request_timeout: Duration,
    closed: bool,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, EngineError> {
        self.page
            .as_ref()
            .ok_or_else(|| EngineError::Other("Session has no open page".to_string()))
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, EngineError> {
        self.page()?
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| EngineError::Script(e.to_string()))
    }

    /// 在XPath快照上执行脚本片段，片段中可使用 `snapshot` 变量
    fn snapshot_script(locator: &Locator, body: &str) -> Result<String, EngineError> {
        let xpath = serde_json::to_string(&locator.to_xpath())
            .map_err(|e| EngineError::Script(e.to_string()))?;
        Ok(format!(
            "(() => {{ const snapshot = document.evaluate({}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); {} }})()",
            xpath, body
        ))
    }

    async fn wait_for_dom_ready(&self, url: &str) -> Result<(), EngineError> {
        let ready = tokio::time::timeout(self.request_timeout, async {
            loop {
                let state: String = self.eval("document.readyState".to_string()).await?;
                if state != "loading" {
                    return Ok::<(), EngineError>(());
                }
                tokio::time::sleep(READY_STATE_POLL).await;
            }
        })
        .await;

        match ready {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                what: format!("DOM of {}", url),
                after: self.request_timeout,
            }),
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        // Eager load strategy: only the DOM is awaited, subresources keep loading
        let response = self
            .page()?
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| EngineError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(reason) = response.result.error_text.clone() {
            return Err(EngineError::Navigation {
                url: url.to_string(),
                reason,
            });
        }

        self.wait_for_dom_ready(url).await
    }

    async fn count(&self, locator: &Locator) -> Result<usize, EngineError> {
        let script = Self::snapshot_script(locator, "return snapshot.snapshotLength;")?;
        let count: u64 = self.eval(script).await?;
        Ok(count as usize)
    }

    async fn is_clickable(&self, locator: &Locator) -> Result<bool, EngineError> {
        let script = Self::snapshot_script(
            locator,
            "const el = snapshot.snapshotItem(0); \
             if (!el) { return false; } \
             const visible = el.getClientRects().length > 0 \
                 && window.getComputedStyle(el).visibility !== 'hidden'; \
             return visible && !el.disabled;",
        )?;
        self.eval(script).await
    }

    async fn click(&self, locator: &Locator) -> Result<(), EngineError> {
        let script = Self::snapshot_script(
            locator,
            "const el = snapshot.snapshotItem(0); \
             if (!el) { return false; } \
             el.click(); \
             return true;",
        )?;
        let clicked: bool = self.eval(script).await?;
        if clicked {
            Ok(())
        } else {
            Err(EngineError::ElementNotFound(locator.to_string()))
        }
    }

    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        let name = serde_json::to_string(name).map_err(|e| EngineError::Script(e.to_string()))?;
        // Properties win over attributes so that href comes back absolute
        let script = Self::snapshot_script(
            locator,
            &format!(
                "const el = snapshot.snapshotItem({index}); \
                 if (!el) {{ return JSON.stringify(null); }} \
                 const name = {name}; \
                 const value = (name in el && typeof el[name] === 'string') \
                     ? el[name] : el.getAttribute(name); \
                 return JSON.stringify(value == null ? '' : String(value));",
            ),
        )?;
        let encoded: String = self.eval(script).await?;
        let value: Option<String> =
            serde_json::from_str(&encoded).map_err(|e| EngineError::Script(e.to_string()))?;
        match value {
            None => Err(EngineError::ElementNotFound(format!(
                "{} (index {})",
                locator, index
            ))),
            Some(v) if v.trim().is_empty() => Ok(None),
            Some(v) => Ok(Some(v)),
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), EngineError> {
        self.page()?
            .evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .map_err(|e| EngineError::Script(format!("Scroll failed: {}", e)))?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, EngineError> {
        self.page()?
            .content()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    async fn quit(&mut self) -> Result<(), EngineError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = if self.owns_browser {
            match self.browser.close().await {
                Ok(_) => self
                    .browser
                    .wait()
                    .await
                    .map(|_| ())
                    .map_err(|e| EngineError::Other(e.to_string())),
                Err(e) => Err(EngineError::Other(e.to_string())),
            }
        } else if let Some(page) = self.page.take() {
            page.close()
                .await
                .map_err(|e| EngineError::Other(e.to_string()))
        } else {
            Ok(())
        };

        self.handler.abort();

        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                debug!("Failed to remove browser profile {}: {}", dir.display(), e);
            }
        }

        if let Err(ref e) = result {
            warn!("Browser session did not shut down cleanly: {}", e);
        } else {
            info!("Browser session closed");
        }
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Dropping the Browser kills a launched child; the handler task and profile are left
        if !self.closed {
            self.handler.abort();
            if let Some(dir) = self.user_data_dir.take() {
                let _ = std::fs::remove_dir_all(dir);
            }
        }
    }
}
