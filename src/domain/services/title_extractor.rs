// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{Html, Selector};
use url::Url;

/// 从响应内容中提取页面标题
///
/// 取文档中第一个 `<title>` 元素，去掉首尾空白并把内部连续空白
/// 折叠为单个空格。标题缺失或为空时，使用URL生成后备标题：
/// `"{host} - {path}"`，路径为空时为 `"{host} - home"`。
///
/// 该函数没有副作用，也不会失败，畸形的HTML同样走后备逻辑。
///
/// # 参数
///
/// * `url` - 页面URL，用于生成后备标题
/// * `body` - 原始响应字节
pub fn extract_title(url: &str, body: &[u8]) -> String {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>())
    });

    match title.map(|t| normalize_whitespace(&t)) {
        Some(t) if !t.is_empty() => t,
        _ => fallback_title(url),
    }
}

/// 根据URL生成后备标题
pub fn fallback_title(url: &str) -> String {
    let (host, path) = match Url::parse(url) {
        Ok(parsed) => {
            let host = match (parsed.host_str(), parsed.port()) {
                (Some(host), Some(port)) => format!("{}:{}", host, port),
                (Some(host), None) => host.to_string(),
                (None, _) => url.to_string(),
            };
            (host, parsed.path().trim_matches('/').to_string())
        }
        Err(_) => (url.to_string(), String::new()),
    };

    if path.is_empty() {
        format!("{} - home", host)
    } else {
        format!("{} - {}", host, path)
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
