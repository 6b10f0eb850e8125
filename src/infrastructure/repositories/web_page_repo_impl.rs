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

use crate::domain::models::fetch::ExecutorKind;
use crate::domain::repositories::fetch_result_repository::FetchResultRepository;
use crate::infrastructure::database::entities::web_page as web_page_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;
use std::sync::Arc;

/// 网页标题仓库实现
pub struct WebPageRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl WebPageRepositoryImpl {
    /// 创建新的网页标题仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的网页标题仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FetchResultRepository for WebPageRepositoryImpl {
    async fn save_fetch_result(
        &self,
        url: &str,
        title: &str,
        executor_kind: ExecutorKind,
    ) -> anyhow::Result<()> {
        let active_model = web_page_entity::ActiveModel {
            id: NotSet,
            url: Set(url.to_string()),
            title: Set(title.to_string()),
            parser_type: Set(executor_kind.as_str().to_string()),
            created_at: Set(Utc::now().into()),
        };

        web_page_entity::Entity::insert(active_model)
            .exec_without_returning(self.db.as_ref())
            .await?;

        Ok(())
    }
}

/// 不落库的抓取结果仓库，未配置数据库时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFetchResultRepository;

#[async_trait]
impl FetchResultRepository for NoopFetchResultRepository {
    async fn save_fetch_result(
        &self,
        _url: &str,
        _title: &str,
        _executor_kind: ExecutorKind,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
