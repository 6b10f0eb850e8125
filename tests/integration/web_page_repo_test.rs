// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, EntityTrait};
use std::sync::Arc;
use titlefetch::domain::models::fetch::ExecutorKind;
use titlefetch::domain::repositories::fetch_result_repository::FetchResultRepository;
use titlefetch::infrastructure::database::entities::web_page;
use titlefetch::infrastructure::repositories::web_page_repo_impl::WebPageRepositoryImpl;

async fn setup_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let db = Arc::new(db);
    Migrator::up(db.as_ref(), None).await.unwrap();
    db
}

#[tokio::test]
async fn saved_results_land_in_web_pages() {
    let db = setup_db().await;
    let repo = WebPageRepositoryImpl::new(db.clone());

    repo.save_fetch_result("https://example.com/", "Example Domain", ExecutorKind::Cooperative)
        .await
        .unwrap();
    repo.save_fetch_result("https://example.org/", "Example Org", ExecutorKind::ProcessPool)
        .await
        .unwrap();

    let rows = web_page::Entity::find().all(db.as_ref()).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].url, "https://example.com/");
    assert_eq!(rows[0].title, "Example Domain");
    assert_eq!(rows[0].parser_type, "asyncio");
    assert_eq!(rows[1].parser_type, "multiprocessing");
}

#[tokio::test]
async fn migration_can_be_rolled_back() {
    let db = setup_db().await;

    Migrator::down(db.as_ref(), None).await.unwrap();

    assert!(web_page::Entity::find().all(db.as_ref()).await.is_err());
}
