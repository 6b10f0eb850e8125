// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 抓取（fetch）：执行器类型、批量请求、单个结果和批次报告
/// - 任务（job）：异步执行的批次及其状态机
pub mod fetch;
pub mod job;
