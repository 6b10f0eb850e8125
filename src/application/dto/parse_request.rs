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

use crate::domain::models::fetch::{ExecutorKind, FetchRequest};
use crate::domain::models::job::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 批量解析请求数据传输对象
///
/// 同步和异步接口共用。`mode` 只在异步接口中生效，同时给出时优先于 `parser_type`。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ParseUrlsRequestDto {
    /// 待解析的URL列表
    #[serde(default)]
    pub urls: Vec<String>,
    /// 执行器类型：asyncio、threading、multiprocessing
    pub parser_type: Option<String>,
    /// 单个请求超时时间（秒）
    pub timeout: Option<u64>,
    /// 异步接口使用的执行器类型
    pub mode: Option<String>,
}

impl ParseUrlsRequestDto {
    /// 转换为同步批量请求，忽略 `mode`
    pub fn into_fetch_request(
        self,
        default_timeout: Duration,
    ) -> Result<FetchRequest, DomainError> {
        let kind = self.parser_type.clone();
        self.build(kind, default_timeout)
    }

    /// 转换为异步批量请求，`mode` 优先
    pub fn into_async_fetch_request(
        self,
        default_timeout: Duration,
    ) -> Result<FetchRequest, DomainError> {
        let kind = self.mode.clone().or_else(|| self.parser_type.clone());
        self.build(kind, default_timeout)
    }

    fn build(
        self,
        kind: Option<String>,
        default_timeout: Duration,
    ) -> Result<FetchRequest, DomainError> {
        let executor_kind = match kind {
            Some(name) => name.parse::<ExecutorKind>()?,
            None => ExecutorKind::default(),
        };
        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);

        let request = FetchRequest::new(self.urls, executor_kind, timeout);
        request.validate()?;
        Ok(request)
    }
}
