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

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、数据库、解析器并发、任务保留和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 解析器配置
    pub parser: ParserSettings,
    /// 异步任务配置
    pub jobs: JobSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
///
/// 未配置 `url` 时不持久化抓取结果
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: Option<String>,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
}

/// 解析器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ParserSettings {
    /// 协作式并发上限
    pub async_concurrency: usize,
    /// 线程池大小
    pub threading_workers: usize,
    /// 进程池大小上限
    pub multiprocessing_workers: usize,
    /// 默认单请求超时（秒）
    pub default_timeout_secs: u64,
    /// 工作进程可执行文件，缺省为当前程序
    pub worker_program: Option<PathBuf>,
}

impl ParserSettings {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// 解析工作进程可执行文件路径
    pub fn resolve_worker_program(&self) -> std::io::Result<PathBuf> {
        match &self.worker_program {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe(),
        }
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            async_concurrency: 10,
            threading_workers: 5,
            multiprocessing_workers: 4,
            default_timeout_secs: 10,
            worker_program: None,
        }
    }
}

/// 异步任务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct JobSettings {
    /// 已结束任务的保留时间（秒），为空时永久保留
    pub retention_secs: Option<u64>,
    /// 清理间隔（秒）
    pub reap_interval_secs: u64,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 导出端点监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}`
    /// 和 `TITLEFETCH__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("TITLEFETCH").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8001)?
            // Default DB pool settings
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            // Default parser settings
            .set_default("parser.async_concurrency", 10)?
            .set_default("parser.threading_workers", 5)?
            .set_default("parser.multiprocessing_workers", 4)?
            .set_default("parser.default_timeout_secs", 10)?
            .set_default("jobs.reap_interval_secs", 300)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
