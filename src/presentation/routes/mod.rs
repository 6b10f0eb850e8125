// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::services::batch_service::BatchService;
use crate::domain::services::job_manager::JobManager;
use crate::presentation::handlers::{parse_handler, task_handler};
use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由，处理器依赖通过 `Extension` 注入
pub fn routes() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/parse-urls", post(parse_handler::parse_urls))
        .route("/parse-urls-async", post(parse_handler::parse_urls_async))
        .route("/task-status/{task_id}", get(task_handler::get_task_status))
        .route("/task-stats", get(task_handler::get_task_stats))
}

/// 组装完整的应用
///
/// # 参数
///
/// * `batches` - 批量抓取服务
/// * `jobs` - 任务管理器
/// * `settings` - 应用配置
pub fn app(batches: Arc<BatchService>, jobs: Arc<JobManager>, settings: Arc<Settings>) -> Router {
    routes()
        .layer(Extension(batches))
        .layer(Extension(jobs))
        .layer(Extension(settings))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 进程存活时总是返回 `{"status": "ok"}`
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 服务信息端点
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "parse_urls": "POST /parse-urls",
            "parse_urls_async": "POST /parse-urls-async",
            "task_status": "GET /task-status/{task_id}",
            "task_stats": "GET /task-stats",
            "health": "GET /health"
        }
    }))
}
