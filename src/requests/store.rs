use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::requests::models::{RequestStatus, TripRequest};

/// Row-level persistence for trip requests. The engine only needs single-row
/// load/save cycles; change detection happens in the write path, which
/// snapshots the row before mutating it.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<TripRequest>>;
    async fn create(&self, request: &TripRequest) -> AppResult<TripRequest>;
    async fn update(&self, request: &TripRequest) -> AppResult<TripRequest>;
    async fn list(&self, status: Option<RequestStatus>) -> AppResult<Vec<TripRequest>>;
}

/// Postgres-backed store - the source of truth in production.
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<TripRequest>> {
        let request = sqlx::query_as::<_, TripRequest>(
            r#"
            SELECT id, requester_id, passenger_name, purpose, origin_label, destination_label,
                   from_lat, from_lng, to_lat, to_lng, status, status_actor_id, status_note,
                   status_changed_at, created_at, updated_at
            FROM trip_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn create(&self, request: &TripRequest) -> AppResult<TripRequest> {
        let created = sqlx::query_as::<_, TripRequest>(
            r#"
            INSERT INTO trip_requests
                (id, requester_id, passenger_name, purpose, origin_label, destination_label,
                 from_lat, from_lng, to_lat, to_lng, status, status_actor_id, status_note,
                 status_changed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, requester_id, passenger_name, purpose, origin_label, destination_label,
                      from_lat, from_lng, to_lat, to_lng, status, status_actor_id, status_note,
                      status_changed_at, created_at, updated_at
            "#,
        )
        .bind(request.id)
        .bind(request.requester_id)
        .bind(&request.passenger_name)
        .bind(&request.purpose)
        .bind(&request.origin_label)
        .bind(&request.destination_label)
        .bind(request.from_lat)
        .bind(request.from_lng)
        .bind(request.to_lat)
        .bind(request.to_lng)
        .bind(request.status)
        .bind(request.status_actor_id)
        .bind(&request.status_note)
        .bind(request.status_changed_at)
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, request: &TripRequest) -> AppResult<TripRequest> {
        let updated = sqlx::query_as::<_, TripRequest>(
            r#"
            UPDATE trip_requests
            SET passenger_name = $2, purpose = $3, origin_label = $4, destination_label = $5,
                from_lat = $6, from_lng = $7, to_lat = $8, to_lng = $9, status = $10,
                status_actor_id = $11, status_note = $12, status_changed_at = $13,
                updated_at = $14
            WHERE id = $1
            RETURNING id, requester_id, passenger_name, purpose, origin_label, destination_label,
                      from_lat, from_lng, to_lat, to_lng, status, status_actor_id, status_note,
                      status_changed_at, created_at, updated_at
            "#,
        )
        .bind(request.id)
        .bind(&request.passenger_name)
        .bind(&request.purpose)
        .bind(&request.origin_label)
        .bind(&request.destination_label)
        .bind(request.from_lat)
        .bind(request.from_lng)
        .bind(request.to_lat)
        .bind(request.to_lng)
        .bind(request.status)
        .bind(request.status_actor_id)
        .bind(&request.status_note)
        .bind(request.status_changed_at)
        .bind(request.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trip request {} not found", request.id)))?;

        Ok(updated)
    }

    async fn list(&self, status: Option<RequestStatus>) -> AppResult<Vec<TripRequest>> {
        let requests = match status {
            Some(status) => {
                sqlx::query_as::<_, TripRequest>(
                    r#"
                    SELECT id, requester_id, passenger_name, purpose, origin_label,
                           destination_label, from_lat, from_lng, to_lat, to_lng, status,
                           status_actor_id, status_note, status_changed_at, created_at,
                           updated_at
                    FROM trip_requests
                    WHERE status = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, TripRequest>(
                    r#"
                    SELECT id, requester_id, passenger_name, purpose, origin_label,
                           destination_label, from_lat, from_lng, to_lat, to_lng, status,
                           status_actor_id, status_note, status_changed_at, created_at,
                           updated_at
                    FROM trip_requests
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(requests)
    }
}

/// In-memory store, used by tests and for running without Postgres.
pub struct MemoryRequestStore {
    requests: tokio::sync::RwLock<HashMap<Uuid, TripRequest>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self {
            requests: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<TripRequest> {
        let mut requests = self.requests.write().await;
        requests.remove(&id)
    }
}

impl Default for MemoryRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<TripRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id).cloned())
    }

    async fn create(&self, request: &TripRequest) -> AppResult<TripRequest> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn update(&self, request: &TripRequest) -> AppResult<TripRequest> {
        let mut requests = self.requests.write().await;
        if !requests.contains_key(&request.id) {
            return Err(AppError::NotFound(format!(
                "Trip request {} not found",
                request.id
            )));
        }
        requests.insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn list(&self, status: Option<RequestStatus>) -> AppResult<Vec<TripRequest>> {
        let requests = self.requests.read().await;
        let mut matching: Vec<TripRequest> = requests
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request() -> TripRequest {
        TripRequest::new(
            Uuid::new_v4(),
            "J. Doe".to_string(),
            None,
            "Office".to_string(),
            "Onne Base".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryRequestStore::new();
        let request = request();

        store.create(&request).await.unwrap();
        let loaded = store.get(request.id).await.unwrap().unwrap();
        assert_eq!(loaded.origin_label, "Office");
    }

    #[tokio::test]
    async fn test_update_missing_request_is_not_found() {
        let store = MemoryRequestStore::new();
        let request = request();

        let result = store.update(&request).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = MemoryRequestStore::new();
        let mut approved = request();
        approved.status = RequestStatus::Approved;
        store.create(&approved).await.unwrap();
        store.create(&request()).await.unwrap();

        let pending = store.list(Some(RequestStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
