use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::models::{DeviceId, Event, EventRow, NewEvent, RoomId};
use crate::store::{EventStore, StoreError};

/// `EventStore` backed by the `events` table.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, event: NewEvent) -> Result<Event, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (device_id, room_id, action, created_date, updated_date)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, device_id, room_id, action, created_date
            "#,
        )
        .bind(event.device_id.0)
        .bind(event.room_id.map(|r| r.0))
        .bind(event.action.as_str())
        .bind(event.created_date)
        .fetch_one(&self.pool)
        .await?;

        Event::try_from(row)
    }

    async fn find_room_events(
        &self,
        room_id: RoomId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, device_id, room_id, action, created_date
            FROM events
            WHERE room_id = $1
              AND deleted_date IS NULL
              AND ($2::timestamptz IS NULL OR created_date >= $2)
              AND ($3::timestamptz IS NULL OR created_date <= $3)
            ORDER BY created_date ASC, id ASC
            "#,
        )
        .bind(room_id.0)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        debug!(room_id = %room_id, rows = rows.len(), "Fetched room events");
        rows.into_iter().map(Event::try_from).collect()
    }

    async fn find_device_events(
        &self,
        device_id: DeviceId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, device_id, room_id, action, created_date
            FROM events
            WHERE device_id = $1
              AND deleted_date IS NULL
              AND ($2::timestamptz IS NULL OR created_date >= $2)
              AND ($3::timestamptz IS NULL OR created_date <= $3)
            ORDER BY created_date ASC, id ASC
            "#,
        )
        .bind(device_id.0)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        debug!(device_id = %device_id, rows = rows.len(), "Fetched device events");
        rows.into_iter().map(Event::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use sqlx::PgPool;

    use super::*;
    use crate::db::{create_test_tables, models::EventAction};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn new_event(device: i64, room: i64, action: EventAction, when: &str) -> NewEvent {
        NewEvent {
            device_id: DeviceId(device),
            room_id: Some(RoomId(room)),
            action,
            created_date: at(when),
        }
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn append_returns_stored_event(pool: PgPool) {
        create_test_tables(&pool).await;
        let store = PgEventStore::new(pool);

        let event = store
            .append(new_event(1, 2, EventAction::TurnOn, "2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        assert!(event.id > 0);
        assert_eq!(event.action, EventAction::TurnOn);
        assert_eq!(event.room_id, Some(RoomId(2)));
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn room_events_skip_other_rooms_and_deleted(pool: PgPool) {
        create_test_tables(&pool).await;
        let store = PgEventStore::new(pool.clone());

        store
            .append(new_event(1, 1, EventAction::TurnOff, "2024-01-01T12:00:00Z"))
            .await
            .unwrap();
        store
            .append(new_event(1, 1, EventAction::TurnOn, "2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        store
            .append(new_event(2, 2, EventAction::TurnOn, "2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        let deleted = store
            .append(new_event(1, 1, EventAction::TurnOn, "2024-01-01T13:00:00Z"))
            .await
            .unwrap();
        sqlx::query("UPDATE events SET deleted_date = now() WHERE id = $1")
            .bind(deleted.id)
            .execute(&pool)
            .await
            .unwrap();

        let events = store.find_room_events(RoomId(1), None, None).await.unwrap();
        let actions: Vec<EventAction> = events.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![EventAction::TurnOn, EventAction::TurnOff]);
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn room_events_respect_upper_bound(pool: PgPool) {
        create_test_tables(&pool).await;
        let store = PgEventStore::new(pool);

        store
            .append(new_event(1, 1, EventAction::TurnOn, "2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        store
            .append(new_event(1, 1, EventAction::TurnOff, "2024-01-03T10:00:00Z"))
            .await
            .unwrap();

        let events = store
            .find_room_events(RoomId(1), None, Some(at("2024-01-02T00:00:00Z")))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn device_events_span_rooms_and_skip_deleted(pool: PgPool) {
        create_test_tables(&pool).await;
        let store = PgEventStore::new(pool.clone());

        store
            .append(new_event(1, 1, EventAction::TurnOn, "2024-01-01T10:00:00Z"))
            .await
            .unwrap();
        store
            .append(new_event(1, 2, EventAction::TurnOff, "2024-01-01T12:00:00Z"))
            .await
            .unwrap();
        store
            .append(new_event(2, 1, EventAction::TurnOn, "2024-01-01T11:00:00Z"))
            .await
            .unwrap();
        let deleted = store
            .append(new_event(1, 1, EventAction::TurnOn, "2024-01-01T13:00:00Z"))
            .await
            .unwrap();
        sqlx::query("UPDATE events SET deleted_date = now() WHERE id = $1")
            .bind(deleted.id)
            .execute(&pool)
            .await
            .unwrap();

        let events = store.find_device_events(DeviceId(1), None, None).await.unwrap();
        let actions: Vec<EventAction> = events.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![EventAction::TurnOn, EventAction::TurnOff]);

        let until = store
            .find_device_events(DeviceId(1), None, Some(at("2024-01-01T11:00:00Z")))
            .await
            .unwrap();
        assert_eq!(until.len(), 1);
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn unknown_action_is_invalid_record(pool: PgPool) {
        create_test_tables(&pool).await;
        sqlx::query(
            "INSERT INTO events (device_id, room_id, action, created_date, updated_date) \
             VALUES (1, 1, 'BLINK', now(), now())",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = PgEventStore::new(pool)
            .find_room_events(RoomId(1), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }
}
