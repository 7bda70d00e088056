// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::engines::locator::Locator;
use crate::engines::traits::{BrowserSession, EngineError};

/// 有界等待
///
/// 以固定间隔轮询页面状态，直到条件满足或超时。会话返回的错误会立即透传，
/// 不会被当作"条件未满足"继续轮询。
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    timeout: Duration,
    poll_interval: Duration,
}

impl Wait {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 等待至少一个匹配元素出现，返回匹配数量
    pub async fn until_present(
        &self,
        session: &dyn BrowserSession,
        locator: &Locator,
    ) -> Result<usize, EngineError> {
        self.poll(locator, "presence of", move || async move {
            let found = session.count(locator).await?;
            Ok((found > 0).then_some(found))
        })
        .await
    }

    /// 等待第一个匹配元素变为可点击
    pub async fn until_clickable(
        &self,
        session: &dyn BrowserSession,
        locator: &Locator,
    ) -> Result<(), EngineError> {
        self.poll(locator, "clickable", move || async move {
            Ok(session.is_clickable(locator).await?.then_some(()))
        })
        .await
    }

    async fn poll<T, F, Fut>(
        &self,
        locator: &Locator,
        condition: &str,
        mut check: F,
    ) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Option<T>, EngineError>>,
    {
        let poll_interval = self.poll_interval;
        let result = timeout(self.timeout, async {
            loop {
                if let Some(value) = check().await? {
                    return Ok::<T, EngineError>(value);
                }
                sleep(poll_interval).await;
            }
        })
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(EngineError::Timeout {
                what: format!("{} {}", condition, locator),
                after: self.timeout,
            }),
        }
    }
}
