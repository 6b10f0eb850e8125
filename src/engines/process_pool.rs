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

use crate::domain::models::fetch::FetchResult;
use crate::engines::reqwest_engine::ReqwestFetcher;
use crate::engines::traits::{
    report_progress, EngineError, ExecutionStrategy, PageFetcher, ProgressSender, StrategyOutput,
};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 以工作进程模式启动本程序时使用的子命令
pub const WORKER_SUBCOMMAND: &str = "fetch-worker";

/// 等待工作进程应答时，在抓取超时之外额外给出的宽限时间
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// 发送给工作进程的一行请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub url: String,
    pub timeout_ms: u64,
}

impl WorkerRequest {
    /// 超出 `u64` 毫秒范围的超时按上限发送
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// 进程池策略
///
/// 池大小为 `min(limit, max_workers, 可用CPU数)`。每个槽位对应一个子进程，
/// 父子进程之间通过标准输入输出交换按行分隔的JSON。每个槽位同一时刻
/// 只处理一个URL，因此在途请求数不超过池大小。结果按完成顺序合并。
///
/// 子进程崩溃或返回无法解析的内容时，它手上的URL记为失败，
/// 该槽位会为下一个URL重新启动子进程。
pub struct ProcessPoolStrategy {
    program: PathBuf,
    args: Vec<String>,
    max_workers: usize,
}

impl ProcessPoolStrategy {
    /// 创建进程池策略
    ///
    /// # 参数
    ///
    /// * `program` - 工作进程可执行文件，通常就是本服务的二进制
    /// * `max_workers` - 配置的进程数上限
    pub fn new(program: PathBuf, max_workers: usize) -> Self {
        Self {
            program,
            args: vec![WORKER_SUBCOMMAND.to_string()],
            max_workers,
        }
    }

    /// 替换启动工作进程时传入的参数
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// 计算本批次实际使用的进程数
    pub fn pool_size(&self, limit: usize) -> usize {
        limit
            .max(1)
            .min(self.max_workers.max(1))
            .min(available_cpus())
    }
}

/// 可用CPU数量，至少为1
pub fn available_cpus() -> usize {
    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
    );
    match sys.cpus().len() {
        0 => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        n => n,
    }
}

struct WorkerProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl WorkerProcess {
    fn spawn(program: &Path, args: &[String]) -> std::io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("worker stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("worker stdout unavailable"))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    async fn fetch(&mut self, url: &str, timeout: Duration) -> Result<FetchResult, EngineError> {
        let request = WorkerRequest::new(url, timeout);
        let mut line =
            serde_json::to_string(&request).map_err(|e| EngineError::Other(e.to_string()))?;
        line.push('\n');

        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let deadline = timeout.saturating_add(REPLY_GRACE);
        let reply = tokio::time::timeout(deadline, self.stdout.next_line())
            .await
            .map_err(|_| EngineError::Other("worker process did not reply in time".to_string()))??
            .ok_or_else(|| EngineError::Other("worker process exited".to_string()))?;

        let result: FetchResult = serde_json::from_str(&reply)
            .map_err(|e| EngineError::Other(format!("malformed worker reply: {}", e)))?;

        if result.url != url {
            return Err(EngineError::Other(format!(
                "worker replied for {} while fetching {}",
                result.url, url
            )));
        }

        Ok(result)
    }

    async fn shutdown(self) {
        let WorkerProcess {
            mut child, stdin, ..
        } = self;
        // Closing stdin is the worker's signal to exit.
        drop(stdin);
        if tokio::time::timeout(Duration::from_secs(2), child.wait())
            .await
            .is_err()
        {
            let _ = child.kill().await;
        }
    }
}

struct Slot {
    id: usize,
    process: Option<WorkerProcess>,
    program: PathBuf,
    args: Vec<String>,
}

impl Slot {
    async fn drive(
        mut self,
        urls: Arc<[String]>,
        cursor: Arc<AtomicUsize>,
        timeout: Duration,
        tx: mpsc::UnboundedSender<FetchResult>,
    ) {
        loop {
            let index = cursor.fetch_add(1, Ordering::SeqCst);
            let Some(url) = urls.get(index) else {
                break;
            };

            let result = self.fetch(url, timeout).await;
            if tx.send(result).is_err() {
                break;
            }
        }

        if let Some(process) = self.process.take() {
            process.shutdown().await;
        }
        debug!("Worker slot {} drained", self.id);
    }

    async fn fetch(&mut self, url: &str, timeout: Duration) -> FetchResult {
        if self.process.is_none() {
            match WorkerProcess::spawn(&self.program, &self.args) {
                Ok(process) => self.process = Some(process),
                Err(e) => {
                    warn!(
                        "Worker slot {} could not restart its process: {}",
                        self.id, e
                    );
                    return FetchResult::failure(
                        url,
                        format!("failed to start worker process: {}", e),
                    );
                }
            }
        }

        let Some(process) = self.process.as_mut() else {
            return FetchResult::failure(url, "worker process unavailable");
        };

        match process.fetch(url, timeout).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Worker slot {} failed on {}: {}", self.id, url, e);
                // Dropping the handle kills the child; the next URL gets a fresh one.
                self.process = None;
                FetchResult::failure(url, format!("worker process failed: {}", e))
            }
        }
    }
}

#[async_trait]
impl ExecutionStrategy for ProcessPoolStrategy {
    async fn run(
        &self,
        urls: Arc<[String]>,
        limit: usize,
        timeout: Duration,
        progress: Option<ProgressSender>,
    ) -> Result<StrategyOutput, EngineError> {
        let start = Instant::now();
        let size = self.pool_size(limit);

        let mut slots = Vec::with_capacity(size);
        let mut last_error = None;
        for id in 0..size {
            match WorkerProcess::spawn(&self.program, &self.args) {
                Ok(process) => slots.push(Slot {
                    id,
                    process: Some(process),
                    program: self.program.clone(),
                    args: self.args.clone(),
                }),
                Err(e) => {
                    warn!("Failed to start worker process {}: {}", id, e);
                    last_error = Some(e);
                }
            }
        }

        if slots.is_empty() {
            let reason = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "empty pool".to_string());
            return Err(EngineError::WorkerSpawn(format!(
                "{}: {}",
                self.program.display(),
                reason
            )));
        }

        info!(
            urls = urls.len(),
            processes = slots.len(),
            "Starting process pool batch"
        );

        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let drivers = slots
            .into_iter()
            .map(|slot| slot.drive(urls.clone(), cursor.clone(), timeout, tx.clone()))
            .collect::<Vec<_>>();
        drop(tx);

        let collect = async {
            let mut results = Vec::with_capacity(urls.len());
            while let Some(result) = rx.recv().await {
                results.push(result);
                report_progress(&progress, results.len());
            }
            results
        };

        let (_, results) = tokio::join!(join_all(drivers), collect);

        Ok(StrategyOutput {
            results,
            elapsed: start.elapsed(),
        })
    }

    fn name(&self) -> &'static str {
        "process_pool"
    }
}

/// 工作进程主循环
///
/// 从标准输入逐行读取 `WorkerRequest`，对每一行输出一行 `FetchResult`，
/// 读到EOF时退出。日志只能写到标准错误，标准输出专用于应答。
pub async fn run_worker_process() -> anyhow::Result<()> {
    let fetcher = ReqwestFetcher;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<WorkerRequest>(&line) {
            Ok(request) => {
                fetcher
                    .fetch(&request.url, Duration::from_millis(request.timeout_ms.max(1)))
                    .await
            }
            Err(e) => {
                warn!("Malformed worker request: {}", e);
                FetchResult::failure("", format!("malformed request: {}", e))
            }
        };

        let mut reply = serde_json::to_string(&result)?;
        reply.push('\n');
        stdout.write_all(reply.as_bytes()).await?;
        stdout.flush().await?;
    }

    debug!("Worker process input closed, exiting");
    Ok(())
}
