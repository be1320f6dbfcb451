pub mod devices;
pub mod events;
pub mod models;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use devices::PgDeviceRegistry;
pub use events::PgEventStore;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Minimal `devices` / `events` tables for adapter tests. The real schema
/// is owned by the CRUD service.
#[cfg(test)]
pub(crate) async fn create_test_tables(pool: &PgPool) {
    sqlx::query(
        "CREATE TABLE devices (
            id                BIGSERIAL PRIMARY KEY,
            organization_id   BIGINT NOT NULL,
            room_id           BIGINT,
            category          TEXT NOT NULL,
            power_consumption DOUBLE PRECISION,
            deleted_date      TIMESTAMPTZ
        )",
    )
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "CREATE TABLE events (
            id           BIGSERIAL PRIMARY KEY,
            device_id    BIGINT NOT NULL,
            room_id      BIGINT,
            action       TEXT NOT NULL,
            created_date TIMESTAMPTZ NOT NULL,
            updated_date TIMESTAMPTZ NOT NULL,
            deleted_date TIMESTAMPTZ
        )",
    )
    .execute(pool)
    .await
    .unwrap();
}
