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

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::models::fetch::FetchResult;

/// 引擎错误类型
///
/// 只描述执行策略本身的故障。单个URL的失败不属于这里，
/// 它们被编码在 `FetchResult` 中。
#[derive(Error, Debug)]
pub enum EngineError {
    /// 无法启动工作线程或工作进程
    #[error("Failed to spawn worker: {0}")]
    WorkerSpawn(String),
    /// 与工作进程通信失败
    #[error("Worker I/O error: {0}")]
    WorkerIo(#[from] std::io::Error),
    /// 等待工作者结束时出错
    #[error("Worker join error: {0}")]
    Join(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 进度通知通道，发送的是当前已完成的抓取数量（不递减）
pub type ProgressSender = mpsc::UnboundedSender<usize>;

/// 单次抓取特质
///
/// 实现者必须把所有结果（包括超时、连接失败、非2xx状态）
/// 编码到返回的 `FetchResult` 中，不能向外传播错误。
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 抓取单个URL
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult;

    /// 抓取器名称
    fn name(&self) -> &'static str;
}

/// 执行策略的输出
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    /// 每个输入URL恰好对应一个结果
    pub results: Vec<FetchResult>,
    /// 墙钟耗时
    pub elapsed: Duration,
}

/// 执行策略特质
///
/// 三种并发引擎实现同一个契约：输入一组URL和并发上限，
/// 返回与输入等长的结果集合。任何时刻在途请求数不超过 `limit`。
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// 执行一批抓取
    async fn run(
        &self,
        urls: Arc<[String]>,
        limit: usize,
        timeout: Duration,
        progress: Option<ProgressSender>,
    ) -> Result<StrategyOutput, EngineError>;

    /// 策略名称
    fn name(&self) -> &'static str;
}

/// 通知进度，接收端已关闭时静默忽略
pub(crate) fn report_progress(progress: &Option<ProgressSender>, completed: usize) {
    if let Some(tx) = progress {
        let _ = tx.send(completed);
    }
}
