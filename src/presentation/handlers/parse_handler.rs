// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::parse_request::ParseUrlsRequestDto;
use crate::application::dto::parse_response::{ParseResponseDto, TaskAcceptedDto};
use crate::config::settings::Settings;
use crate::domain::services::batch_service::BatchService;
use crate::domain::services::job_manager::JobManager;
use crate::presentation::errors::AppError;
use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;
use tracing::info;

/// 同步批量解析
///
/// 等待整批完成后返回全部结果
///
/// # 参数
///
/// * `batches` - 批量抓取服务
/// * `settings` - 应用配置
/// * `payload` - 批量解析请求
///
/// # 返回值
///
/// * `Ok(Json<ParseResponseDto>)` - 批次结果
/// * `Err(AppError)` - 请求无效或执行失败
pub async fn parse_urls(
    Extension(batches): Extension<Arc<BatchService>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(payload): Json<ParseUrlsRequestDto>,
) -> Result<Json<ParseResponseDto>, AppError> {
    let request = payload.into_fetch_request(settings.parser.default_timeout())?;
    info!(
        "Parsing {} URLs with {}",
        request.urls.len(),
        request.executor_kind
    );

    let report = batches.run_batch(request).await?;
    Ok(Json(ParseResponseDto::from(report)))
}

/// 异步批量解析
///
/// 立即返回任务ID，之后通过任务状态接口轮询结果
pub async fn parse_urls_async(
    Extension(jobs): Extension<Arc<JobManager>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(payload): Json<ParseUrlsRequestDto>,
) -> Result<(StatusCode, Json<TaskAcceptedDto>), AppError> {
    let request = payload.into_async_fetch_request(settings.parser.default_timeout())?;
    let task_id = jobs.submit(request).await?;

    Ok((StatusCode::ACCEPTED, Json(TaskAcceptedDto::pending(task_id))))
}
