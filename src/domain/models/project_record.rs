// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;

/// 字段缺失时的哨兵值
pub const NOT_AVAILABLE: &str = "N/A";

/// 整条记录抓取失败时的哨兵值
pub const ERROR_SENTINEL: &str = "Error";

/// 输出列名，顺序与 [`ProjectRecord::values`] 一致
pub const COLUMNS: [&str; 5] = [
    "Rera Regd. No",
    "Project Name",
    "Promoter Name",
    "Address of Promoter",
    "GST No",
];

/// RERA 项目登记记录
///
/// 固定包含五个字段，每个字段要么是抓取到的文本，要么是哨兵值
/// （`"N/A"` 表示字段缺失，`"Error"` 表示整条记录在重试后仍失败）。
/// 记录一经创建即不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    #[serde(rename = "Rera Regd. No")]
    registration_number: String,
    #[serde(rename = "Project Name")]
    project_name: String,
    #[serde(rename = "Promoter Name")]
    promoter_name: String,
    #[serde(rename = "Address of Promoter")]
    promoter_address: String,
    #[serde(rename = "GST No")]
    gst_number: String,
}

impl ProjectRecord {
    /// 创建一条记录
    ///
    /// 每个值都会去除首尾空白，空值替换为 `"N/A"`
    pub fn new(
        registration_number: impl Into<String>,
        project_name: impl Into<String>,
        promoter_name: impl Into<String>,
        promoter_address: impl Into<String>,
        gst_number: impl Into<String>,
    ) -> Self {
        Self {
            registration_number: normalize(registration_number.into()),
            project_name: normalize(project_name.into()),
            promoter_name: normalize(promoter_name.into()),
            promoter_address: normalize(promoter_address.into()),
            gst_number: normalize(gst_number.into()),
        }
    }

    /// 所有字段均为 `"Error"` 的哨兵记录
    pub fn error() -> Self {
        Self {
            registration_number: ERROR_SENTINEL.to_string(),
            project_name: ERROR_SENTINEL.to_string(),
            promoter_name: ERROR_SENTINEL.to_string(),
            promoter_address: ERROR_SENTINEL.to_string(),
            gst_number: ERROR_SENTINEL.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.values().iter().all(|v| *v == ERROR_SENTINEL)
    }

    pub fn registration_number(&self) -> &str {
        &self.registration_number
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn promoter_name(&self) -> &str {
        &self.promoter_name
    }

    pub fn promoter_address(&self) -> &str {
        &self.promoter_address
    }

    pub fn gst_number(&self) -> &str {
        &self.gst_number
    }

    /// 按 [`COLUMNS`] 顺序返回字段值
    pub fn values(&self) -> [&str; 5] {
        [
            &self.registration_number,
            &self.project_name,
            &self.promoter_name,
            &self.promoter_address,
            &self.gst_number,
        ]
    }
}

fn normalize(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}
