// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 每个处理器负责一类端点的请求解析与响应组装
pub mod parse_handler;
pub mod task_handler;
