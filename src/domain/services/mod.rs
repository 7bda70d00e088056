// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 纯函数式的页面解析逻辑，不依赖浏览器
pub mod label_extractor;
