// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ParserSettings;
use crate::domain::models::fetch::ExecutorKind;
use crate::engines::cooperative::CooperativeStrategy;
use crate::engines::process_pool::ProcessPoolStrategy;
use crate::engines::thread_pool::ThreadPoolStrategy;
use crate::engines::traits::{
    EngineError, ExecutionStrategy, PageFetcher, ProgressSender, StrategyOutput,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 已解析的执行策略及其默认并发上限
#[derive(Clone)]
pub struct ResolvedStrategy {
    pub strategy: Arc<dyn ExecutionStrategy>,
    pub limit: usize,
}

/// 策略路由器
///
/// 为每种执行器类型持有一个策略实例，并按配置给出默认并发上限
pub struct StrategyRouter {
    cooperative: ResolvedStrategy,
    thread_pool: ResolvedStrategy,
    process_pool: ResolvedStrategy,
}

impl StrategyRouter {
    /// 创建新的策略路由器
    ///
    /// # 参数
    ///
    /// * `fetcher` - 协作式与线程池策略共用的抓取器
    /// * `settings` - 解析器配置
    /// * `worker_program` - 进程池工作进程的可执行文件
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        settings: &ParserSettings,
        worker_program: PathBuf,
    ) -> Self {
        Self {
            cooperative: ResolvedStrategy {
                strategy: Arc::new(CooperativeStrategy::new(fetcher.clone())),
                limit: settings.async_concurrency,
            },
            thread_pool: ResolvedStrategy {
                strategy: Arc::new(ThreadPoolStrategy::new(fetcher)),
                limit: settings.threading_workers,
            },
            process_pool: ResolvedStrategy {
                strategy: Arc::new(ProcessPoolStrategy::new(
                    worker_program,
                    settings.multiprocessing_workers,
                )),
                limit: settings.multiprocessing_workers,
            },
        }
    }

    /// 替换某一执行器类型对应的策略
    pub fn with_strategy(
        mut self,
        kind: ExecutorKind,
        strategy: Arc<dyn ExecutionStrategy>,
        limit: usize,
    ) -> Self {
        let resolved = ResolvedStrategy { strategy, limit };
        match kind {
            ExecutorKind::Cooperative => self.cooperative = resolved,
            ExecutorKind::ThreadPool => self.thread_pool = resolved,
            ExecutorKind::ProcessPool => self.process_pool = resolved,
        }
        self
    }

    pub fn resolve(&self, kind: ExecutorKind) -> &ResolvedStrategy {
        match kind {
            ExecutorKind::Cooperative => &self.cooperative,
            ExecutorKind::ThreadPool => &self.thread_pool,
            ExecutorKind::ProcessPool => &self.process_pool,
        }
    }

    /// 用指定执行器类型的默认上限执行一批抓取
    pub async fn route(
        &self,
        kind: ExecutorKind,
        urls: Arc<[String]>,
        timeout: Duration,
        progress: Option<ProgressSender>,
    ) -> Result<StrategyOutput, EngineError> {
        let resolved = self.resolve(kind);
        info!(
            "Dispatching {} URLs to {} strategy (limit {})",
            urls.len(),
            resolved.strategy.name(),
            resolved.limit
        );
        resolved
            .strategy
            .run(urls, resolved.limit, timeout, progress)
            .await
    }
}
