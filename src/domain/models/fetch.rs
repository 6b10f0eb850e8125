// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::models::job::DomainError;

/// 执行器类型
///
/// 决定一批URL由哪种并发引擎处理。对外的字符串名称沿用
/// 服务接口约定：`asyncio`、`threading`、`multiprocessing`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ExecutorKind {
    /// 单线程协作式并发
    #[default]
    #[serde(rename = "asyncio")]
    Cooperative,
    /// 固定大小的工作线程池
    #[serde(rename = "threading")]
    ThreadPool,
    /// 固定大小的工作进程池
    #[serde(rename = "multiprocessing")]
    ProcessPool,
}

impl ExecutorKind {
    /// 对外名称
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorKind::Cooperative => "asyncio",
            ExecutorKind::ThreadPool => "threading",
            ExecutorKind::ProcessPool => "multiprocessing",
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asyncio" => Ok(ExecutorKind::Cooperative),
            "threading" => Ok(ExecutorKind::ThreadPool),
            "multiprocessing" => Ok(ExecutorKind::ProcessPool),
            other => Err(DomainError::ValidationError(format!(
                "unsupported parser type: {}",
                other
            ))),
        }
    }
}

/// 批量抓取请求
///
/// 每次调用创建一次，批次完成后丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// 待抓取的URL，保持调用方给出的顺序
    pub urls: Vec<String>,
    /// 执行器类型
    pub executor_kind: ExecutorKind,
    /// 单个请求的超时时间
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(urls: Vec<String>, executor_kind: ExecutorKind, timeout: Duration) -> Self {
        Self {
            urls,
            executor_kind,
            timeout,
        }
    }

    /// 校验请求
    ///
    /// URL列表不能为空，且每个元素都必须以 `http://` 或 `https://` 开头。
    /// 校验在任何网络请求之前完成。
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.urls.is_empty() {
            return Err(DomainError::ValidationError(
                "URL list cannot be empty".to_string(),
            ));
        }

        if let Some(bad) = self
            .urls
            .iter()
            .find(|url| !(url.starts_with("http://") || url.starts_with("https://")))
        {
            return Err(DomainError::ValidationError(format!(
                "invalid URL format: {}",
                bad
            )));
        }

        if self.timeout.is_zero() {
            return Err(DomainError::ValidationError(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// 单个URL的抓取结果
///
/// 成功时 `title` 有意义且 `error` 为空；失败时 `title` 为空串，
/// `error` 保存可读的失败原因。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    pub title: String,
    pub success: bool,
    pub error: Option<String>,
}

impl FetchResult {
    /// 创建成功结果
    pub fn success(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            success: true,
            error: None,
        }
    }

    /// 创建失败结果
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }
        Self {
            url: url.into(),
            title: String::new(),
            success: false,
            error: Some(error),
        }
    }
}

/// 批次报告
///
/// 聚合器为每个批次构建一次，按值返回。
/// 始终满足 `total == results.len() == successful + failed`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<FetchResult>,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub executor_kind: ExecutorKind,
}

impl BatchReport {
    /// 根据结果集合构建报告
    pub fn from_results(
        results: Vec<FetchResult>,
        elapsed: Duration,
        executor_kind: ExecutorKind,
    ) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        let total = results.len();
        Self {
            total,
            successful,
            failed: total - successful,
            results,
            elapsed,
            executor_kind,
        }
    }

    /// 耗时（秒），保留六位小数
    pub fn elapsed_sec(&self) -> f64 {
        (self.elapsed.as_secs_f64() * 1_000_000.0).round() / 1_000_000.0
    }
}
