// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{DomainError, Job, JobStats};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// 内存任务仓库
///
/// 以 `DashMap` 保存任务。每次写入在分片锁内替换整条记录，
/// 读取方拿到的总是某一次写入后的完整副本。
#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    jobs: DashMap<Uuid, Job>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        match self.jobs.entry(job.id) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(job.id)),
            Entry::Vacant(slot) => {
                slot.insert(job.clone());
                Ok(job.clone())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.get(&id).map(|job| job.value().clone()))
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let Some(mut stored) = self.jobs.get_mut(&job.id) else {
            return Err(RepositoryError::NotFound);
        };

        if stored.state.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: stored.state,
                to: job.state,
            }
            .into());
        }

        *stored = job.clone();
        Ok(job.clone())
    }

    async fn delete_finished_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let before = self.jobs.len();
        self.jobs.retain(|_, job| match job.finished_at {
            Some(finished_at) => !(job.state.is_terminal() && finished_at < cutoff),
            None => true,
        });
        Ok(before.saturating_sub(self.jobs.len()) as u64)
    }

    async fn stats(&self) -> Result<JobStats, RepositoryError> {
        let mut stats = JobStats::default();
        for job in self.jobs.iter() {
            stats.record(job.state);
        }
        Ok(stats)
    }
}
