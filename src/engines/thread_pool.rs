// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch::FetchResult;
use crate::engines::traits::{
    report_progress, EngineError, ExecutionStrategy, PageFetcher, ProgressSender, StrategyOutput,
};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// 线程池策略
///
/// 启动 `limit` 个操作系统线程，每个线程持有自己的单线程运行时，
/// 从共享的原子游标中依次领取URL并同步执行抓取。每个下标只会被
/// 一个线程领取，因此不会重复也不会遗漏。结果按完成顺序返回。
pub struct ThreadPoolStrategy {
    fetcher: Arc<dyn PageFetcher>,
}

impl ThreadPoolStrategy {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    fn spawn_workers(
        &self,
        urls: &Arc<[String]>,
        workers: usize,
        timeout: Duration,
        tx: &mpsc::UnboundedSender<(usize, FetchResult)>,
    ) -> Result<Vec<JoinHandle<()>>, EngineError> {
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(workers);

        for worker_id in 0..workers {
            let worker = Worker {
                id: worker_id,
                fetcher: self.fetcher.clone(),
                urls: urls.clone(),
                cursor: cursor.clone(),
                tx: tx.clone(),
                timeout,
            };

            let spawned = std::thread::Builder::new()
                .name(format!("fetch-worker-{}", worker_id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) if handles.is_empty() => {
                    return Err(EngineError::WorkerSpawn(e.to_string()));
                }
                Err(e) => {
                    // The threads already running drain the whole queue.
                    warn!(
                        "Spawned only {} of {} worker threads: {}",
                        handles.len(),
                        workers,
                        e
                    );
                    break;
                }
            }
        }

        Ok(handles)
    }
}

struct Worker {
    id: usize,
    fetcher: Arc<dyn PageFetcher>,
    urls: Arc<[String]>,
    cursor: Arc<AtomicUsize>,
    tx: mpsc::UnboundedSender<(usize, FetchResult)>,
    timeout: Duration,
}

impl Worker {
    fn run(self) {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Worker thread {} could not build a runtime: {}", self.id, e);
                return;
            }
        };

        let mut processed = 0usize;
        loop {
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(url) = self.urls.get(index) else {
                break;
            };

            let fetch = AssertUnwindSafe(self.fetcher.fetch(url, self.timeout)).catch_unwind();
            let result = match runtime.block_on(fetch) {
                Ok(result) => result,
                Err(_) => {
                    error!("Worker thread {} panicked while fetching {}", self.id, url);
                    FetchResult::failure(url.as_str(), "worker thread panicked")
                }
            };

            processed += 1;
            if self.tx.send((index, result)).is_err() {
                // Collector is gone, the batch was dropped.
                break;
            }
        }

        debug!("Worker thread {} finished after {} URLs", self.id, processed);
    }
}

#[async_trait]
impl ExecutionStrategy for ThreadPoolStrategy {
    async fn run(
        &self,
        urls: Arc<[String]>,
        limit: usize,
        timeout: Duration,
        progress: Option<ProgressSender>,
    ) -> Result<StrategyOutput, EngineError> {
        let start = Instant::now();
        let workers = limit.max(1);

        debug!(urls = urls.len(), workers, "Starting thread pool batch");

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handles = self.spawn_workers(&urls, workers, timeout, &tx)?;
        drop(tx);

        let mut seen = vec![false; urls.len()];
        let mut results = Vec::with_capacity(urls.len());
        while let Some((index, result)) = rx.recv().await {
            if let Some(slot) = seen.get_mut(index) {
                *slot = true;
            }
            results.push(result);
            report_progress(&progress, results.len());
        }

        tokio::task::spawn_blocking(move || {
            for handle in handles {
                if handle.join().is_err() {
                    warn!("A worker thread terminated abnormally");
                }
            }
        })
        .await
        .map_err(|e| EngineError::Join(e.to_string()))?;

        // Any URL a worker claimed but never reported still gets a result.
        for (index, done) in seen.iter().enumerate() {
            if !done {
                results.push(FetchResult::failure(
                    urls[index].as_str(),
                    "worker thread exited before processing URL",
                ));
                report_progress(&progress, results.len());
            }
        }

        Ok(StrategyOutput {
            results,
            elapsed: start.elapsed(),
        })
    }

    fn name(&self) -> &'static str {
        "thread_pool"
    }
}
