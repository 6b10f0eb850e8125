// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::fetch::{BatchReport, ExecutorKind};

/// 后台作业实体
///
/// 表示一次在后台执行的批量抓取。作业只由执行它的工作任务写入，
/// 可以被任意数量的轮询方并发读取。状态只会单调前进：
/// Pending → Progress → Success/Failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 当前状态
    pub state: JobState,
    /// 执行进度，进入Progress后才有值
    pub progress: Option<JobProgress>,
    /// 成功时的批次报告
    pub result: Option<BatchReport>,
    /// 失败原因
    pub error: Option<String>,
    /// 本作业使用的执行器
    pub executor_kind: ExecutorKind,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 最后一次写入时间
    pub updated_at: DateTime<Utc>,
    /// 进入终止状态的时间
    pub finished_at: Option<DateTime<Utc>>,
}

/// 作业进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    /// 已完成的URL数量
    pub completed: usize,
    /// URL总数
    pub total: usize,
}

/// 作业状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// 已提交，等待工作任务拾取
    #[default]
    Pending,
    /// 正在执行
    Progress,
    /// 执行成功
    Success,
    /// 执行失败
    Failure,
}

impl JobState {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "PENDING"),
            JobState::Progress => write!(f, "PROGRESS"),
            JobState::Success => write!(f, "SUCCESS"),
            JobState::Failure => write!(f, "FAILURE"),
        }
    }
}

/// 按状态统计的任务数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub pending: usize,
    pub progress: usize,
    pub success: usize,
    pub failure: usize,
    pub total: usize,
}

impl JobStats {
    /// 计入一个处于 `state` 的任务
    pub fn record(&mut self, state: JobState) {
        match state {
            JobState::Pending => self.pending += 1,
            JobState::Progress => self.progress += 1,
            JobState::Success => self.success += 1,
            JobState::Failure => self.failure += 1,
        }
        self.total += 1;
    }
}

/// 领域错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: JobState, to: JobState },

    /// 验证错误，当输入数据不符合领域规则时发生
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl Job {
    /// 创建一个处于Pending状态的新作业
    pub fn new(executor_kind: ExecutorKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: JobState::Pending,
            progress: None,
            result: None,
            error: None,
            executor_kind,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// 开始执行
    ///
    /// Pending → Progress，进度初始化为 `{0, total}`
    pub fn start(mut self, total: usize) -> Result<Self, DomainError> {
        self.transition(JobState::Progress)?;
        self.progress = Some(JobProgress {
            completed: 0,
            total,
        });
        Ok(self)
    }

    /// 更新进度
    ///
    /// 只在Progress状态下生效，已完成数量不会回退。
    pub fn advance(mut self, completed: usize) -> Result<Self, DomainError> {
        if self.state != JobState::Progress {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to: JobState::Progress,
            });
        }
        if let Some(progress) = self.progress.as_mut() {
            let completed = completed.min(progress.total);
            if completed > progress.completed {
                progress.completed = completed;
                self.updated_at = Utc::now();
            }
        }
        Ok(self)
    }

    /// 标记成功
    ///
    /// Progress → Success，保存批次报告
    pub fn complete(mut self, report: BatchReport) -> Result<Self, DomainError> {
        self.transition(JobState::Success)?;
        if let Some(progress) = self.progress.as_mut() {
            progress.completed = progress.total;
        }
        self.result = Some(report);
        self.finished_at = Some(self.updated_at);
        Ok(self)
    }

    /// 标记失败
    ///
    /// Progress → Failure，保存失败原因
    pub fn fail(mut self, error: impl Into<String>) -> Result<Self, DomainError> {
        self.transition(JobState::Failure)?;
        self.error = Some(error.into());
        self.finished_at = Some(self.updated_at);
        Ok(self)
    }

    fn transition(&mut self, to: JobState) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.state, to),
            (JobState::Pending, JobState::Progress)
                | (JobState::Progress, JobState::Success)
                | (JobState::Progress, JobState::Failure)
        );
        if !allowed {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
