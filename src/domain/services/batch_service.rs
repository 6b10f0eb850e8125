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

use crate::domain::models::fetch::{BatchReport, FetchRequest};
use crate::domain::models::job::DomainError;
use crate::domain::repositories::fetch_result_repository::FetchResultRepository;
use crate::engines::router::StrategyRouter;
use crate::engines::traits::{EngineError, ProgressSender};
use crate::infrastructure::metrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// 批量抓取错误类型
#[derive(Error, Debug)]
pub enum BatchError {
    /// 请求未通过校验，没有发出任何网络请求
    #[error("{0}")]
    Validation(String),
    /// 执行策略本身出错
    #[error("Execution failed: {0}")]
    Engine(#[from] EngineError),
}

impl From<DomainError> for BatchError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => BatchError::Validation(msg),
            other => BatchError::Validation(other.to_string()),
        }
    }
}

/// 批量抓取服务
///
/// 校验请求，分派给对应的执行策略，汇总结果生成批次报告，
/// 最后把成功的结果交给持久化仓库。服务本身不保存任何每次调用的状态。
pub struct BatchService {
    /// 策略路由器
    router: Arc<StrategyRouter>,
    /// 抓取结果仓库
    results: Arc<dyn FetchResultRepository>,
}

impl BatchService {
    /// 创建新的批量抓取服务实例
    ///
    /// # 参数
    ///
    /// * `router` - 策略路由器
    /// * `results` - 抓取结果仓库
    ///
    /// # 返回值
    ///
    /// 返回新的批量抓取服务实例
    pub fn new(router: Arc<StrategyRouter>, results: Arc<dyn FetchResultRepository>) -> Self {
        Self { router, results }
    }

    /// 执行一批抓取
    ///
    /// # 参数
    ///
    /// * `request` - 批量抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(BatchReport)` - 批次报告，单个URL的失败编码在结果中
    /// * `Err(BatchError)` - 请求无效或执行策略出错
    pub async fn run_batch(&self, request: FetchRequest) -> Result<BatchReport, BatchError> {
        self.run_batch_with_progress(request, None).await
    }

    /// 执行一批抓取，并把已完成数量发送到进度通道
    #[instrument(
        skip_all,
        fields(parser_type = %request.executor_kind, urls = request.urls.len())
    )]
    pub async fn run_batch_with_progress(
        &self,
        request: FetchRequest,
        progress: Option<ProgressSender>,
    ) -> Result<BatchReport, BatchError> {
        request.validate()?;

        let kind = request.executor_kind;
        let urls: Arc<[String]> = request.urls.into();
        let output = self
            .router
            .route(kind, urls, request.timeout, progress)
            .await?;

        let report = BatchReport::from_results(output.results, output.elapsed, kind);
        info!(
            "Batch finished: {} total, {} successful, {} failed in {:.3}s",
            report.total,
            report.successful,
            report.failed,
            report.elapsed_sec()
        );
        metrics::record_batch(&report);

        self.persist(&report).await;

        Ok(report)
    }

    async fn persist(&self, report: &BatchReport) {
        for result in report.results.iter().filter(|r| r.success) {
            if let Err(e) = self
                .results
                .save_fetch_result(&result.url, &result.title, report.executor_kind)
                .await
            {
                warn!("Failed to persist result for {}: {}", result.url, e);
            }
        }
    }
}
