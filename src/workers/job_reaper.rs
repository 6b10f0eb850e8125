// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::job_repository::JobRepository;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 已结束任务清理工作器
///
/// 定期删除结束时间早于保留期限的任务，从不触碰仍在进行的任务
pub struct JobReaper {
    repository: Arc<dyn JobRepository>,
    retention: Duration,
    interval: Duration,
}

impl JobReaper {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        retention: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            repository,
            retention,
            interval,
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!(
            "Job reaper started (retention {:?}, interval {:?})",
            self.retention, self.interval
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;

            match self.reap_once().await {
                Ok(count) => {
                    if count > 0 {
                        info!("Removed {} finished jobs", count);
                    }
                }
                Err(e) => {
                    error!("Failed to remove finished jobs: {}", e);
                }
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// 执行一次清理
    pub async fn reap_once(&self) -> Result<u64, String> {
        let retention = chrono::Duration::from_std(self.retention).map_err(|e| e.to_string())?;
        let cutoff = Utc::now() - retention;
        self.repository
            .delete_finished_before(cutoff)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[path = "job_reaper_test.rs"]
mod tests;
