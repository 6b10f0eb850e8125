// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch::FetchResult;
use crate::engines::traits::{
    report_progress, EngineError, ExecutionStrategy, PageFetcher, ProgressSender, StrategyOutput,
};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// 协作式并发策略
///
/// 所有抓取都作为future在调用方任务上一起驱动，不额外派生任务；
/// 由信号量作为准入闸门，任何时刻最多 `limit` 个抓取在途。
/// 挂起点只有抓取内部的网络等待。丢弃返回的future会同时丢弃
/// 所有尚未完成的抓取。结果按提交顺序返回。
pub struct CooperativeStrategy {
    fetcher: Arc<dyn PageFetcher>,
}

impl CooperativeStrategy {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExecutionStrategy for CooperativeStrategy {
    async fn run(
        &self,
        urls: Arc<[String]>,
        limit: usize,
        timeout: Duration,
        progress: Option<ProgressSender>,
    ) -> Result<StrategyOutput, EngineError> {
        let start = Instant::now();
        let gate = Arc::new(Semaphore::new(limit.max(1)));
        let completed = AtomicUsize::new(0);

        debug!(
            urls = urls.len(),
            limit = limit.max(1),
            "Starting cooperative batch"
        );

        let fetches = urls.iter().map(|url| {
            let gate = gate.clone();
            let fetcher = self.fetcher.clone();
            let completed = &completed;
            let progress = &progress;
            async move {
                let result = match gate.acquire().await {
                    Ok(_permit) => fetcher.fetch(url, timeout).await,
                    Err(_) => FetchResult::failure(url.as_str(), "admission gate closed"),
                };
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                report_progress(progress, done);
                result
            }
        });

        let results = join_all(fetches).await;

        Ok(StrategyOutput {
            results,
            elapsed: start.elapsed(),
        })
    }

    fn name(&self) -> &'static str {
        "cooperative"
    }
}
