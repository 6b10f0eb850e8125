// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch::FetchResult;
use crate::engines::traits::PageFetcher;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 计数抓取桩
///
/// 记录同时在途的抓取数量峰值。URL中包含 `fail` 的请求返回失败结果，
/// 包含 `panic` 的请求会直接panic。
#[derive(Debug)]
pub struct CountingFetcher {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.contains("panic") {
            panic!("fetcher stub asked to panic for {}", url);
        }
        if url.contains("fail") {
            FetchResult::failure(url, "connection refused")
        } else {
            FetchResult::success(url, format!("title of {}", url))
        }
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// 生成 `count` 个测试URL
pub fn urls(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("http://host{}.test/page/{}", i % 3, i))
        .collect()
}
