// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含抓取流程的用例实现：列表页发现、详情页抓取和整体编排
pub mod use_cases;
