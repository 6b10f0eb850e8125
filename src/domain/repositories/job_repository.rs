// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{DomainError, Job, JobStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 记录已存在
    #[error("Record already exists: {0}")]
    Conflict(Uuid),
    /// 领域规则拒绝了写入
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// 任务仓库特质
///
/// 每次写入都替换整条记录，读取方只会看到完整的快照
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;
    /// 更新任务，已结束的任务拒绝写入
    async fn update(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 删除在指定时间之前结束的任务，返回删除数量
    async fn delete_finished_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
    /// 按状态统计当前保存的任务
    async fn stats(&self) -> Result<JobStats, RepositoryError>;
}
