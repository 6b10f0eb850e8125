// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::models::job::DomainError;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::batch_service::BatchError;
use crate::domain::services::job_manager::JobError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<DomainError>() {
            return match err {
                DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
                DomainError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            };
        }
        if let Some(err) = self.0.downcast_ref::<BatchError>() {
            return match err {
                BatchError::Validation(_) => StatusCode::BAD_REQUEST,
                BatchError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        if let Some(err) = self.0.downcast_ref::<JobError>() {
            return match err {
                JobError::Validation(_) => StatusCode::BAD_REQUEST,
                JobError::NotFound(_) => StatusCode::NOT_FOUND,
                JobError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        match self.0.downcast_ref::<RepositoryError>() {
            Some(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self.0.downcast_ref::<DomainError>() {
            // Surface the bare rule, not the "Validation error:" prefix.
            Some(DomainError::ValidationError(msg)) => msg.clone(),
            _ => self.0.to_string(),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", error_message);
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
