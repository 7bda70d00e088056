// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

use crate::utils::errors::ScrapeError;

/// 安装 Prometheus 导出器
///
/// 未调用时所有计数器都记录到空实现，不产生任何开销
pub fn init_metrics(addr: &str) -> Result<(), ScrapeError> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| ScrapeError::Metrics(format!("Invalid metrics address '{}': {}", addr, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ScrapeError::Metrics(e.to_string()))?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}
