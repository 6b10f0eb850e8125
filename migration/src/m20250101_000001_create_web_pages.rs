// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WebPages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebPages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebPages::Url).text().not_null())
                    .col(ColumnDef::new(WebPages::Title).text().not_null())
                    .col(ColumnDef::new(WebPages::ParserType).string_len(20).not_null())
                    .col(
                        ColumnDef::new(WebPages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_web_pages_url")
                    .table(WebPages::Table)
                    .col(WebPages::Url)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebPages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WebPages {
    Table,
    Id,
    Url,
    Title,
    ParserType,
    CreatedAt,
}
