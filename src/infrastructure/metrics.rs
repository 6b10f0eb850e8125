// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use crate::domain::models::fetch::BatchReport;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 初始化指标系统
///
/// 未启用时什么也不做，指标宏在没有记录器时是空操作
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!(
                "Invalid metrics address {}: {}. Metrics exporter not started.",
                settings.listen_addr, e
            );
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder on {}: {}. The port may already be in use.",
            addr, e
        );
        return;
    }

    describe_counter!("fetch_batches_total", "Total number of fetch batches executed");
    describe_counter!(
        "fetch_urls_total",
        "Total number of URLs fetched, labelled by outcome"
    );
    describe_histogram!(
        "fetch_batch_duration_seconds",
        "Wall-clock duration of fetch batches in seconds"
    );
    describe_counter!("fetch_jobs_submitted_total", "Total number of async jobs submitted");
    describe_counter!("fetch_jobs_failed_total", "Total number of async jobs that failed");

    info!("Metrics exporter listening on {}", addr);
}

/// 记录一个批次的统计
pub fn record_batch(report: &BatchReport) {
    let parser = report.executor_kind.as_str();
    counter!("fetch_batches_total", "parser_type" => parser).increment(1);
    counter!("fetch_urls_total", "outcome" => "success").increment(report.successful as u64);
    counter!("fetch_urls_total", "outcome" => "failure").increment(report.failed as u64);
    histogram!("fetch_batch_duration_seconds", "parser_type" => parser)
        .record(report.elapsed.as_secs_f64());
}

pub fn record_job_submitted() {
    counter!("fetch_jobs_submitted_total").increment(1);
}

pub fn record_job_failed() {
    counter!("fetch_jobs_failed_total").increment(1);
}
