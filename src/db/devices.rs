use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{Device, DeviceId, DeviceRow};
use crate::store::{DeviceRegistry, StoreError};

/// `DeviceRegistry` backed by the `devices` table.
#[derive(Clone)]
pub struct PgDeviceRegistry {
    pool: PgPool,
}

impl PgDeviceRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for PgDeviceRegistry {
    async fn find_device(&self, id: DeviceId) -> Result<Option<Device>, StoreError> {
        let row = sqlx::query_as::<_, DeviceRow>(
            r#"
            SELECT id, organization_id, room_id, category, power_consumption
            FROM devices
            WHERE id = $1
              AND deleted_date IS NULL
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Device::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::db::{create_test_tables, models::DeviceCategory};

    async fn insert_device(pool: &PgPool, category: &str, rating: Option<f64>) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO devices (organization_id, room_id, category, power_consumption) \
             VALUES (1, 1, $1, $2) RETURNING id",
        )
        .bind(category)
        .bind(rating)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn finds_actuator_with_rating(pool: PgPool) {
        create_test_tables(&pool).await;
        let id = insert_device(&pool, "ACTUATOR", Some(1.5)).await;

        let device = PgDeviceRegistry::new(pool)
            .find_device(DeviceId(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(device.category, DeviceCategory::Actuator);
        assert_eq!(device.power_consumption, Some(1.5));
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn unknown_and_deleted_devices_are_none(pool: PgPool) {
        create_test_tables(&pool).await;
        let id = insert_device(&pool, "SENSOR", None).await;
        sqlx::query("UPDATE devices SET deleted_date = now() WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();

        let registry = PgDeviceRegistry::new(pool);
        assert!(registry.find_device(DeviceId(id)).await.unwrap().is_none());
        assert!(registry.find_device(DeviceId(id + 100)).await.unwrap().is_none());
    }
}
