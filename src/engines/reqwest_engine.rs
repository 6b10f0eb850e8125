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
use crate::domain::services::title_extractor::extract_title;
use crate::engines::traits::PageFetcher;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 抓取时使用的User-Agent
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; titlefetch/1.0)";

/// 抓取引擎
///
/// 基于reqwest实现的单次HTTP抓取。每次请求都会创建新的客户端，
/// 因此同一个实例可以在任意运行时上使用，包括线程池中
/// 每个工作线程各自持有的运行时。
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestFetcher;

impl ReqwestFetcher {
    async fn fetch_body(url: &str, timeout: Duration) -> Result<Vec<u8>, String> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", describe(&e)))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| describe_request_error(&e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP status {}", status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| describe_request_error(&e, timeout))?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `timeout` - 本次请求的截止时间
    ///
    /// # 返回值
    ///
    /// 成功时返回带标题的结果，任何失败都编码为失败结果
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchResult {
        let start = Instant::now();

        let outcome = match tokio::time::timeout(timeout, Self::fetch_body(url, timeout)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(timeout_message(timeout)),
        };

        match outcome {
            Ok(body) => {
                let title = extract_title(url, &body);
                debug!(
                    url,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Fetched page title: {}",
                    title
                );
                FetchResult::success(url, title)
            }
            Err(error) => {
                warn!(url, "Failed to fetch URL: {}", error);
                FetchResult::failure(url, error)
            }
        }
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

fn timeout_message(timeout: Duration) -> String {
    format!("request timed out after {:?}", timeout)
}

fn describe_request_error(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        return timeout_message(timeout);
    }
    if let Some(status) = error.status() {
        return format!("HTTP status {}", status);
    }
    describe(error)
}

/// 拼接错误及其来源链，得到可读的原因描述
fn describe(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
