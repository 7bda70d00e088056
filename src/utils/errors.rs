// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 启动阶段错误类型
///
/// 抓取流程本身不会返回错误（失败会降级为哨兵记录），
/// 只有配置加载和指标导出器安装会在启动时失败
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("指标导出器错误: {0}")]
    Metrics(String),
}
