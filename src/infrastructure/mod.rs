// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 指标（metrics）：Prometheus 导出器
/// - 存储（storage）：CSV 文件存储
pub mod metrics;
pub mod storage;
