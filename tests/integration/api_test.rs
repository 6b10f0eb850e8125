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

use super::helpers::{get_json, send_json, start_target_site, test_app, unreachable_url};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;

/// 健康检查测试
#[tokio::test]
async fn health_check_works() {
    let app = test_app();

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn root_lists_endpoints() {
    let app = test_app();

    let (status, body) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "titlefetch");
    assert!(body["endpoints"]["parse_urls"].is_string());
    assert_eq!(body["endpoints"]["task_stats"], "GET /task-stats");
}

/// 一个可达、一个不可达的URL，在三种执行器下都得到 1 成功 1 失败
#[tokio::test]
async fn parse_urls_reports_ok_and_down_for_every_parser() {
    let site = start_target_site().await;
    let ok = format!("{}/ok", site);
    let down = unreachable_url().await;
    let app = test_app();

    for parser in ["asyncio", "threading", "multiprocessing"] {
        let (status, body) = send_json(
            &app,
            "POST",
            "/parse-urls",
            json!({"urls": [ok, down], "parser_type": parser, "timeout": 5}),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{}: {}", parser, body);
        assert_eq!(body["total_urls"], 2, "{}", parser);
        assert_eq!(body["successful"], 1, "{}", parser);
        assert_eq!(body["failed"], 1, "{}", parser);
        assert_eq!(body["parser_type"], parser);
        assert!(body["elapsed_sec"].as_f64().unwrap() >= 0.0);

        let results = body["results"].as_array().unwrap();
        let urls: HashSet<&str> = results.iter().map(|r| r["url"].as_str().unwrap()).collect();
        assert_eq!(urls, HashSet::from([ok.as_str(), down.as_str()]));

        let ok_result = results.iter().find(|r| r["url"] == ok.as_str()).unwrap();
        assert_eq!(ok_result["title"], "OK Page");
        assert_eq!(ok_result["success"], true);
        assert!(ok_result["error"].is_null());

        let down_result = results.iter().find(|r| r["url"] == down.as_str()).unwrap();
        assert_eq!(down_result["success"], false);
        assert_eq!(down_result["title"], "");
        assert!(!down_result["error"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn parse_urls_defaults_to_cooperative() {
    let site = start_target_site().await;
    let app = test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/parse-urls",
        json!({"urls": [format!("{}/plain/", site), format!("{}/error", site)]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parser_type"], "asyncio");
    assert_eq!(body["successful"], 1);
    let host = site.trim_start_matches("http://");
    assert_eq!(body["results"][0]["title"], format!("{} - plain", host));
    assert!(body["results"][1]["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn parse_urls_rejects_invalid_requests() {
    let app = test_app();

    let cases = [
        (json!({"urls": []}), "URL list cannot be empty"),
        (
            json!({"urls": ["https://example.com/", "not-a-url"]}),
            "invalid URL format: not-a-url",
        ),
        (
            json!({"urls": ["https://example.com/"], "parser_type": "gevent"}),
            "unsupported parser type: gevent",
        ),
        (
            json!({"urls": ["https://example.com/"], "timeout": 0}),
            "timeout must be greater than zero",
        ),
    ];

    for (payload, message) in cases {
        let (status, body) = send_json(&app, "POST", "/parse-urls", payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
        assert_eq!(body["error"], message);

        let (status, _) = send_json(&app, "POST", "/parse-urls-async", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

async fn wait_for_terminal(app: &axum::Router, task_id: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = get_json(app, &format!("/task-status/{}", task_id)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        if body["status"] == "SUCCESS" || body["status"] == "FAILURE" {
            return body;
        }
        assert!(body["status"] == "PENDING" || body["status"] == "PROGRESS");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("task {} did not finish", task_id);
}

#[tokio::test]
async fn async_submission_can_be_polled_to_completion() {
    let site = start_target_site().await;
    let down = unreachable_url().await;
    let app = test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/parse-urls-async",
        json!({"urls": [format!("{}/ok", site), down], "mode": "threading"}),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "PENDING");
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let done = wait_for_terminal(&app, &task_id).await;
    assert_eq!(done["status"], "SUCCESS");
    assert_eq!(done["task_id"], task_id.as_str());
    assert_eq!(done["result"]["total_urls"], 2);
    assert_eq!(done["result"]["successful"], 1);
    assert_eq!(done["result"]["failed"], 1);
    assert_eq!(done["result"]["parser_type"], "threading");
    assert_eq!(done["progress"], json!({"current": 2, "total": 2}));

    // Terminal records do not change.
    let (_, again) = get_json(&app, &format!("/task-status/{}", task_id)).await;
    assert_eq!(again, done);
}

#[tokio::test]
async fn async_submission_reports_progress_while_running() {
    let site = start_target_site().await;
    let app = test_app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/parse-urls-async",
        json!({
            "urls": [format!("{}/ok", site), format!("{}/slow", site)],
            "parser_type": "asyncio"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let task_id = body["task_id"].as_str().unwrap().to_string();

    tokio::time::sleep(Duration::from_millis(500)).await;
    let (_, running) = get_json(&app, &format!("/task-status/{}", task_id)).await;
    assert_eq!(running["status"], "PROGRESS");
    assert_eq!(running["progress"]["total"], 2);
    assert!(running.get("result").is_none());

    let done = wait_for_terminal(&app, &task_id).await;
    assert_eq!(done["status"], "SUCCESS");
    assert_eq!(done["result"]["successful"], 2);
}

#[tokio::test]
async fn task_status_unknown_ids_are_not_found() {
    let app = test_app();

    for id in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let (status, body) = get_json(&app, &format!("/task-status/{}", id)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "NOT_FOUND");
        assert_eq!(body["task_id"], id.as_str());
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn task_stats_counts_jobs_by_state() {
    let site = start_target_site().await;
    let app = test_app();

    let (status, empty) = get_json(&app, "/task-stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        empty,
        json!({"pending": 0, "progress": 0, "success": 0, "failure": 0, "total": 0})
    );

    let (_, body) = send_json(
        &app,
        "POST",
        "/parse-urls-async",
        json!({"urls": [format!("{}/ok", site)]}),
    )
    .await;
    let task_id = body["task_id"].as_str().unwrap().to_string();
    wait_for_terminal(&app, &task_id).await;

    let (status, stats) = get_json(&app, "/task-stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["success"], 1);
    assert_eq!(stats["total"], 1);
}
