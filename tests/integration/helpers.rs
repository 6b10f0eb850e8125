// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use titlefetch::config::settings::{
    DatabaseSettings, JobSettings, MetricsSettings, ParserSettings, ServerSettings, Settings,
};
use titlefetch::domain::services::batch_service::BatchService;
use titlefetch::domain::services::job_manager::JobManager;
use titlefetch::engines::reqwest_engine::ReqwestFetcher;
use titlefetch::engines::router::StrategyRouter;
use titlefetch::infrastructure::repositories::in_memory_job_repo::InMemoryJobRepository;
use titlefetch::infrastructure::repositories::web_page_repo_impl::NoopFetchResultRepository;
use titlefetch::presentation::routes;
use tokio::net::TcpListener;
use tower::util::ServiceExt;

/// 本服务二进制的路径，进程池用它启动工作进程
pub fn worker_program() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_titlefetch"))
}

/// 启动一个本地目标站点
///
/// * `/ok` - 带标题的页面
/// * `/plain/` - 没有标题的页面
/// * `/error` - 返回500
/// * `/slow` - 两秒后才响应
pub async fn start_target_site() -> String {
    let app = Router::new()
        .route(
            "/ok",
            get(|| async { Html("<html><head><title>OK Page</title></head><body></body></html>") }),
        )
        .route(
            "/plain/",
            get(|| async { Html("<html><body>nothing here</body></html>") }),
        )
        .route(
            "/error",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR.into_response() }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Html("<title>late</title>")
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// 记录同时在途的请求数及其峰值
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
    served: AtomicUsize,
}

impl InFlight {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

/// 启动一个统计并发请求数的目标站点，`/hold` 每次停留 `hold` 后返回
pub async fn start_counting_site(hold: Duration) -> (String, Arc<InFlight>) {
    let stats = Arc::new(InFlight::default());
    let counter = stats.clone();
    let app = Router::new().route(
        "/hold",
        get(move || {
            let counter = counter.clone();
            async move {
                let now = counter.current.fetch_add(1, Ordering::SeqCst) + 1;
                counter.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(hold).await;
                counter.current.fetch_sub(1, Ordering::SeqCst);
                counter.served.fetch_add(1, Ordering::SeqCst);
                Html("<title>held</title>")
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), stats)
}

/// 一个没有任何服务监听的地址
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseSettings {
            url: None,
            max_connections: Some(1),
            connect_timeout: Some(5),
        },
        parser: ParserSettings {
            async_concurrency: 4,
            threading_workers: 3,
            multiprocessing_workers: 2,
            default_timeout_secs: 5,
            worker_program: Some(worker_program()),
        },
        jobs: JobSettings {
            retention_secs: None,
            reap_interval_secs: 300,
        },
        metrics: MetricsSettings {
            enabled: false,
            listen_addr: "127.0.0.1:0".to_string(),
        },
    }
}

/// 组装一个使用真实抓取器、内存任务仓库的应用
pub fn test_app() -> Router {
    let settings = Arc::new(test_settings());
    let router = Arc::new(StrategyRouter::new(
        Arc::new(ReqwestFetcher),
        &settings.parser,
        worker_program(),
    ));
    let batches = Arc::new(BatchService::new(
        router,
        Arc::new(NoopFetchResultRepository),
    ));
    let jobs = Arc::new(JobManager::new(
        batches.clone(),
        Arc::new(InMemoryJobRepository::new()),
    ));

    routes::app(batches, jobs, settings)
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
