// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{start_counting_site, start_target_site, unreachable_url, worker_program};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use titlefetch::domain::models::fetch::FetchResult;
use titlefetch::engines::process_pool::{ProcessPoolStrategy, WorkerRequest, WORKER_SUBCOMMAND};
use titlefetch::engines::traits::ExecutionStrategy;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

#[tokio::test]
async fn worker_process_answers_one_line_per_request() {
    let site = start_target_site().await;

    let mut child = Command::new(worker_program())
        .arg(WORKER_SUBCOMMAND)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .unwrap();
    let mut stdin = child.stdin.take().unwrap();
    let mut lines = BufReader::new(child.stdout.take().unwrap()).lines();

    for path in ["/ok", "/error"] {
        let request =
            WorkerRequest::new(&format!("{}{}", site, path), Duration::from_millis(5000));
        let mut line = serde_json::to_string(&request).unwrap();
        line.push('\n');
        stdin.write_all(line.as_bytes()).await.unwrap();
        stdin.flush().await.unwrap();

        let reply = lines.next_line().await.unwrap().unwrap();
        let result: FetchResult = serde_json::from_str(&reply).unwrap();
        assert_eq!(result.url, request.url);
        if path == "/ok" {
            assert!(result.success);
            assert_eq!(result.title, "OK Page");
        } else {
            assert!(!result.success);
            assert!(result.error.unwrap().contains("500"));
        }
    }

    // EOF on stdin ends the worker.
    drop(stdin);
    let status = tokio::time::timeout(Duration::from_secs(10), child.wait())
        .await
        .unwrap()
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn process_pool_yields_one_result_per_url() {
    let site = start_target_site().await;
    let down = unreachable_url().await;

    let mut urls: Vec<String> = (0..6).map(|_| format!("{}/ok", site)).collect();
    urls.push(format!("{}/plain/", site));
    urls.push(down.clone());

    let strategy = ProcessPoolStrategy::new(worker_program(), 2);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let output = strategy
        .run(urls.clone().into(), 2, Duration::from_secs(5), Some(tx))
        .await
        .unwrap();

    assert_eq!(output.results.len(), urls.len());

    let mut expected: HashMap<&str, usize> = HashMap::new();
    for url in &urls {
        *expected.entry(url.as_str()).or_default() += 1;
    }
    let mut got: HashMap<&str, usize> = HashMap::new();
    for result in &output.results {
        *got.entry(result.url.as_str()).or_default() += 1;
    }
    assert_eq!(got, expected);

    let failed: Vec<&FetchResult> = output.results.iter().filter(|r| !r.success).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].url, down);

    let mut last = 0;
    while let Ok(n) = rx.try_recv() {
        assert!(n >= last);
        last = n;
    }
    assert_eq!(last, urls.len());
}

#[tokio::test]
async fn process_pool_slow_url_does_not_block_others() {
    let site = start_target_site().await;
    let urls: Arc<[String]> = vec![
        format!("{}/slow", site),
        format!("{}/ok", site),
        format!("{}/ok", site),
    ]
    .into();

    let strategy = ProcessPoolStrategy::new(worker_program(), 2);
    let output = strategy
        .run(urls, 2, Duration::from_millis(500), None)
        .await
        .unwrap();

    assert_eq!(output.results.len(), 3);
    let slow = output
        .results
        .iter()
        .find(|r| r.url.ends_with("/slow"))
        .unwrap();
    assert!(!slow.success);
    assert!(slow.error.as_deref().unwrap().contains("timed out"));
    assert_eq!(output.results.iter().filter(|r| r.success).count(), 2);
}

#[tokio::test]
async fn process_pool_never_exceeds_limit() {
    let (site, stats) = start_counting_site(Duration::from_millis(200)).await;
    let urls: Arc<[String]> = (0..8)
        .map(|i| format!("{}/hold?n={}", site, i))
        .collect::<Vec<_>>()
        .into();

    // limit below max_workers, so the pool is sized by the batch limit
    let strategy = ProcessPoolStrategy::new(worker_program(), 4);
    let output = strategy
        .run(urls, 2, Duration::from_secs(5), None)
        .await
        .unwrap();

    assert_eq!(output.results.len(), 8);
    assert!(output.results.iter().all(|r| r.success));
    assert_eq!(stats.served(), 8);
    assert!(stats.peak() >= 1);
    assert!(stats.peak() <= 2, "peak in-flight was {}", stats.peak());
}

#[tokio::test]
async fn process_pool_with_single_slot_is_sequential() {
    let (site, stats) = start_counting_site(Duration::from_millis(100)).await;
    let urls: Arc<[String]> = (0..4)
        .map(|i| format!("{}/hold?n={}", site, i))
        .collect::<Vec<_>>()
        .into();

    let strategy = ProcessPoolStrategy::new(worker_program(), 4);
    let output = strategy
        .run(urls, 1, Duration::from_secs(5), None)
        .await
        .unwrap();

    assert_eq!(output.results.len(), 4);
    assert_eq!(stats.served(), 4);
    assert_eq!(stats.peak(), 1);
}
