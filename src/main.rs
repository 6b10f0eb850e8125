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

use std::sync::Arc;
use std::time::Duration;
use titlefetch::config::settings::Settings;
use titlefetch::domain::repositories::fetch_result_repository::FetchResultRepository;
use titlefetch::domain::repositories::job_repository::JobRepository;
use titlefetch::domain::services::batch_service::BatchService;
use titlefetch::domain::services::job_manager::JobManager;
use titlefetch::engines::process_pool::{self, WORKER_SUBCOMMAND};
use titlefetch::engines::reqwest_engine::ReqwestFetcher;
use titlefetch::engines::router::StrategyRouter;
use titlefetch::infrastructure::database::connection;
use titlefetch::infrastructure::metrics;
use titlefetch::infrastructure::repositories::in_memory_job_repo::InMemoryJobRepository;
use titlefetch::infrastructure::repositories::web_page_repo_impl::{
    NoopFetchResultRepository, WebPageRepositoryImpl,
};
use titlefetch::presentation::routes;
use titlefetch::utils::telemetry;
use titlefetch::workers::job_reaper::JobReaper;
use tokio::net::TcpListener;
use tracing::info;

use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点。以 `fetch-worker` 参数启动时作为进程池的工作进程运行，
/// 否则初始化所有组件并启动HTTP服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some(WORKER_SUBCOMMAND) {
        telemetry::init_worker_telemetry();
        return process_pool::run_worker_process().await;
    }

    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting titlefetch...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Connect to database if configured
    let results: Arc<dyn FetchResultRepository> =
        match connection::create_pool(&settings.database).await? {
            Some(db) => {
                info!("Database connection established");
                info!("Running database migrations...");
                Migrator::up(&db, None).await?;
                info!("Database migrations applied");
                Arc::new(WebPageRepositoryImpl::new(Arc::new(db)))
            }
            None => {
                info!("No database configured, fetch results will not be persisted");
                Arc::new(NoopFetchResultRepository)
            }
        };

    // 4. Initialize engines and services
    let worker_program = settings.parser.resolve_worker_program()?;
    let router = Arc::new(StrategyRouter::new(
        Arc::new(ReqwestFetcher),
        &settings.parser,
        worker_program,
    ));
    let batches = Arc::new(BatchService::new(router, results));
    let job_repo: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let jobs = Arc::new(JobManager::new(batches.clone(), job_repo.clone()));

    // 5. Start workers
    if let Some(retention) = settings.jobs.retention_secs {
        JobReaper::new(
            job_repo,
            Duration::from_secs(retention),
            Duration::from_secs(settings.jobs.reap_interval_secs.max(1)),
        )
        .start();
    }

    // 6. Start HTTP server
    let app = routes::app(batches, jobs, settings.clone());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
