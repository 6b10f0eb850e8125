// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 主函数
///
/// 数据库迁移命令行入口，用于手动执行或回滚 web_pages 表结构
#[async_std::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
