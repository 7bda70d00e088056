// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含列表发现、详情抓取和流程编排用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含项目记录模型、标签提取服务和存储接口
pub mod domain;

/// 引擎模块
///
/// 浏览器会话抽象及其 Chromium 实现
pub mod engines;

/// 基础设施模块
///
/// 提供CSV存储和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 结果的终端表格渲染
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
