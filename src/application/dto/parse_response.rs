// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch::{BatchReport, FetchResult};
use crate::domain::models::job::{Job, JobState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 批量解析响应数据传输对象
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParseResponseDto {
    /// 每个URL一条结果
    pub results: Vec<FetchResult>,
    pub total_urls: usize,
    pub successful: usize,
    pub failed: usize,
    /// 耗时（秒），保留六位小数
    pub elapsed_sec: f64,
    pub parser_type: String,
}

impl From<BatchReport> for ParseResponseDto {
    fn from(report: BatchReport) -> Self {
        let elapsed_sec = report.elapsed_sec();
        Self {
            total_urls: report.total,
            successful: report.successful,
            failed: report.failed,
            elapsed_sec,
            parser_type: report.executor_kind.as_str().to_string(),
            results: report.results,
        }
    }
}

/// 异步任务受理响应
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskAcceptedDto {
    pub task_id: Uuid,
    pub status: String,
}

impl TaskAcceptedDto {
    pub fn pending(task_id: Uuid) -> Self {
        Self {
            task_id,
            status: JobState::Pending.to_string(),
        }
    }
}

/// 任务进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressDto {
    pub current: usize,
    pub total: usize,
}

/// 任务状态响应
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaskStatusResponseDto {
    /// 任务ID，查询不到时原样返回请求中的值
    pub task_id: String,
    /// PENDING、PROGRESS、SUCCESS、FAILURE 或 NOT_FOUND
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ParseResponseDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressDto>,
}

impl TaskStatusResponseDto {
    pub fn not_found(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: "NOT_FOUND".to_string(),
            result: None,
            error: Some("Task not found".to_string()),
            progress: None,
        }
    }
}

impl From<Job> for TaskStatusResponseDto {
    fn from(job: Job) -> Self {
        Self {
            task_id: job.id.to_string(),
            status: job.state.to_string(),
            result: job.result.map(ParseResponseDto::from),
            error: job.error,
            progress: job.progress.map(|p| ProgressDto {
                current: p.completed,
                total: p.total,
            }),
        }
    }
}
