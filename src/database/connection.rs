use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::entities::{listing_entity as listings, user_entity as users};
use crate::error::AppResult;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(pool)
}

/// 按实体定义建表（已存在则跳过），并建索引：users.email 唯一，listings 按 cell / owner_id
pub async fn ensure_schema(pool: &DbPool) -> AppResult<()> {
    let backend = pool.get_database_backend();
    let schema = Schema::new(backend);

    let mut users_table = schema.create_table_from_entity(users::Entity);
    users_table.if_not_exists();
    pool.execute(backend.build(&users_table)).await?;

    let email_index = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_users_email")
        .table(users::Entity)
        .col(users::Column::Email)
        .to_owned();
    pool.execute(backend.build(&email_index)).await?;

    let mut listings_table = schema.create_table_from_entity(listings::Entity);
    listings_table.if_not_exists();
    pool.execute(backend.build(&listings_table)).await?;

    let cell_index = Index::create()
        .if_not_exists()
        .name("idx_listings_cell")
        .table(listings::Entity)
        .col(listings::Column::Cell)
        .to_owned();
    pool.execute(backend.build(&cell_index)).await?;

    let owner_index = Index::create()
        .if_not_exists()
        .name("idx_listings_owner")
        .table(listings::Entity)
        .col(listings::Column::OwnerId)
        .to_owned();
    pool.execute(backend.build(&owner_index)).await?;

    Ok(())
}

/// 测试用的 SQLite 内存库；内存库每个连接各自独立，只保留一个连接
#[cfg(test)]
pub(crate) async fn memory_pool() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let pool = Database::connect(options).await.unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}
