// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch::ExecutorKind;
use async_trait::async_trait;

/// 抓取结果持久化特质
///
/// 只保存成功的结果。调用方记录并吞掉这里返回的错误，
/// 持久化失败不会让抓取失败。
#[async_trait]
pub trait FetchResultRepository: Send + Sync {
    /// 保存一条抓取结果
    async fn save_fetch_result(
        &self,
        url: &str,
        title: &str,
        executor_kind: ExecutorKind,
    ) -> anyhow::Result<()>;
}
