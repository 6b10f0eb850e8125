// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::fetch::FetchRequest;
use crate::domain::models::job::{DomainError, Job, JobState, JobStats};
use crate::domain::repositories::job_repository::{JobRepository, RepositoryError};
use crate::domain::services::batch_service::BatchService;
use crate::infrastructure::metrics;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 任务管理错误类型
#[derive(Error, Debug)]
pub enum JobError {
    /// 请求未通过校验，没有创建任务
    #[error("{0}")]
    Validation(String),
    /// 任务不存在
    #[error("Job not found: {0}")]
    NotFound(Uuid),
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<DomainError> for JobError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => JobError::Validation(msg),
            other => JobError::Repository(RepositoryError::Domain(other)),
        }
    }
}

/// 异步任务管理器
///
/// 提交时立即返回任务ID，批次在后台执行，调用方通过轮询获取进度和结果。
/// 每个任务只由它自己的后台工作任务写入：
/// Pending → Progress → Success | Failure
#[derive(Clone)]
pub struct JobManager {
    batches: Arc<BatchService>,
    jobs: Arc<dyn JobRepository>,
}

impl JobManager {
    /// 创建新的任务管理器
    ///
    /// # 参数
    ///
    /// * `batches` - 批量抓取服务
    /// * `jobs` - 任务仓库
    pub fn new(batches: Arc<BatchService>, jobs: Arc<dyn JobRepository>) -> Self {
        Self { batches, jobs }
    }

    /// 提交一批抓取
    ///
    /// 返回之前任务已以Pending状态写入仓库，因此紧接着的轮询一定能找到它。
    ///
    /// # 返回值
    ///
    /// * `Ok(Uuid)` - 任务ID
    /// * `Err(JobError)` - 请求无效或写入仓库失败
    pub async fn submit(&self, request: FetchRequest) -> Result<Uuid, JobError> {
        request.validate()?;

        let job = Job::new(request.executor_kind);
        let id = job.id;
        self.jobs.create(&job).await?;
        metrics::record_job_submitted();

        info!(
            "Submitted job {} with {} URLs ({})",
            id,
            request.urls.len(),
            request.executor_kind
        );

        let worker = JobWorker {
            batches: self.batches.clone(),
            jobs: self.jobs.clone(),
        };
        tokio::spawn(worker.run(id, request));

        Ok(id)
    }

    /// 读取任务快照
    pub async fn poll(&self, id: Uuid) -> Result<Job, JobError> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or(JobError::NotFound(id))
    }

    /// 按状态统计任务数量
    pub async fn stats(&self) -> Result<JobStats, JobError> {
        Ok(self.jobs.stats().await?)
    }
}

struct JobWorker {
    batches: Arc<BatchService>,
    jobs: Arc<dyn JobRepository>,
}

impl JobWorker {
    #[instrument(skip(self, request), fields(job_id = %id))]
    async fn run(self, id: Uuid, request: FetchRequest) {
        let total = request.urls.len();
        if let Err(e) = self.execute(id, request).await {
            error!("Job {} could not be recorded: {}", id, e);
            metrics::record_job_failed();
            self.record_failure(id, total, e.to_string()).await;
        }
    }

    /// 执行过程中出错时补写Failure，已结束的任务保持不变
    async fn record_failure(&self, id: Uuid, total: usize, cause: String) {
        let job = match self.jobs.find_by_id(id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!("Job {} disappeared before its failure was recorded", id);
                return;
            }
            Err(e) => {
                warn!("Failed to reload job {}: {}", id, e);
                return;
            }
        };

        if job.state.is_terminal() {
            return;
        }

        // Failure is only reachable from Progress.
        let failed = match job.state {
            JobState::Pending => job.start(total).and_then(|started| started.fail(cause)),
            _ => job.fail(cause),
        };

        let failed = match failed {
            Ok(failed) => failed,
            Err(e) => {
                warn!("Cannot mark job {} as failed: {}", id, e);
                return;
            }
        };

        if let Err(e) = self.jobs.update(&failed).await {
            error!("Failed to record failure for job {}: {}", id, e);
        }
    }

    async fn execute(&self, id: Uuid, request: FetchRequest) -> Result<(), JobError> {
        let job = self.load(id).await?;
        let job = job.start(request.urls.len())?;
        self.jobs.update(&job).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let drain = tokio::spawn(drain_progress(self.jobs.clone(), job, rx));

        // Nested task so a panic inside the batch surfaces as a JoinError.
        let batches = self.batches.clone();
        let outcome =
            tokio::spawn(async move { batches.run_batch_with_progress(request, Some(tx)).await })
                .await;

        // The sender is gone once the batch task ends, so the drain finishes
        // and no progress write can land after the terminal one.
        if let Err(e) = drain.await {
            warn!("Progress writer for job {} ended abnormally: {}", id, e);
        }

        let job = self.load(id).await?;
        let job = match outcome {
            Ok(Ok(report)) => {
                info!(
                    "Job {} succeeded: {}/{} URLs fetched",
                    id, report.successful, report.total
                );
                job.complete(report)?
            }
            Ok(Err(e)) => {
                error!("Job {} failed: {}", id, e);
                metrics::record_job_failed();
                job.fail(e.to_string())?
            }
            Err(e) => {
                let cause = if e.is_panic() {
                    format!("job worker panicked: {}", panic_message(e.into_panic()))
                } else {
                    format!("job worker aborted: {}", e)
                };
                error!("Job {} failed: {}", id, cause);
                metrics::record_job_failed();
                job.fail(cause)?
            }
        };

        self.jobs.update(&job).await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Job, JobError> {
        self.jobs
            .find_by_id(id)
            .await?
            .ok_or(JobError::NotFound(id))
    }
}

/// 把进度通道中的完成数量写回任务记录
///
/// 每次只写入当前积压中的最大值，写入失败只记录日志。
async fn drain_progress(
    jobs: Arc<dyn JobRepository>,
    mut job: Job,
    mut rx: mpsc::UnboundedReceiver<usize>,
) {
    while let Some(mut completed) = rx.recv().await {
        while let Ok(next) = rx.try_recv() {
            completed = completed.max(next);
        }

        job = match job.clone().advance(completed) {
            Ok(advanced) => advanced,
            Err(e) => {
                warn!("Dropping progress update for job {}: {}", job.id, e);
                continue;
            }
        };

        if let Err(e) = jobs.update(&job).await {
            warn!("Failed to record progress for job {}: {}", job.id, e);
        } else {
            debug!("Job {} progress {}", job.id, completed);
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
