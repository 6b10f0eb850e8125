// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 批量抓取服务（batch_service）：校验、分派并汇总一批URL的抓取
/// - 任务管理器（job_manager）：在后台执行批次并跟踪任务状态
/// - 标题提取（title_extractor）：从HTML中提取页面标题
pub mod batch_service;
pub mod job_manager;
pub mod title_extractor;
