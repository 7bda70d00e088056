// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::models::project_record::ProjectRecord;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 记录存储特质
///
/// 定义抓取结果的持久化接口
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 保存完整结果集，返回写入位置
    async fn save(&self, records: &[ProjectRecord]) -> Result<PathBuf, StorageError>;
}
