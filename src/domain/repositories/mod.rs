// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 领域层只依赖这里的抽象契约，具体实现由基础设施层提供：
/// - 任务仓库（job_repository）：保存异步任务的状态与结果
/// - 抓取结果仓库（fetch_result_repository）：持久化成功抓取的标题
pub mod fetch_result_repository;
pub mod job_repository;
