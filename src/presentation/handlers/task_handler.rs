// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::parse_response::TaskStatusResponseDto;
use crate::domain::models::job::JobStats;
use crate::domain::services::job_manager::{JobError, JobManager};
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 查询任务状态
///
/// 未知或格式错误的任务ID返回404，响应体状态为 `NOT_FOUND`
pub async fn get_task_status(
    Extension(jobs): Extension<Arc<JobManager>>,
    Path(task_id): Path<String>,
) -> Result<Response, AppError> {
    let Ok(id) = Uuid::parse_str(&task_id) else {
        return Ok(not_found(task_id));
    };

    match jobs.poll(id).await {
        Ok(job) => Ok(Json(TaskStatusResponseDto::from(job)).into_response()),
        Err(JobError::NotFound(_)) => Ok(not_found(task_id)),
        Err(e) => Err(e.into()),
    }
}

/// 查询各状态的任务数量
pub async fn get_task_stats(
    Extension(jobs): Extension<Arc<JobManager>>,
) -> Result<Json<JobStats>, AppError> {
    Ok(Json(jobs.stats().await?))
}

fn not_found(task_id: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(TaskStatusResponseDto::not_found(task_id)),
    )
        .into_response()
}
