use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::geocode::queue::{DispatchScope, GeocodeQueue};
use crate::requests::approval::ApprovalWorkflow;
use crate::requests::models::{
    CreateTripRequest, RequestDiff, RequestStatus, StatusTransition, TransitionRequest,
    TripRequest, UpdateTripRequest,
};
use crate::requests::observer::ReconciliationObserver;
use crate::requests::status::StatusService;
use crate::requests::store::RequestStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub status_service: Arc<StatusService>,
    pub approval: Arc<ApprovalWorkflow>,
    pub queue: GeocodeQueue,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Submit a trip request
/// POST /requests
pub async fn create_request(
    State(state): State<AppState>,
    Json(body): Json<CreateTripRequest>,
) -> AppResult<(StatusCode, Json<TripRequest>)> {
    body.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let request = TripRequest::new(
        body.requester_id,
        body.passenger_name,
        body.purpose,
        body.origin_label,
        body.destination_label,
    );

    let saved = state.store.create(&request).await?;
    info!(
        "Trip request {} created: '{}' -> '{}'",
        saved.id, saved.origin_label, saved.destination_label
    );

    let mut scope = DispatchScope::new();
    ReconciliationObserver::on_created(&saved, &mut scope);
    scope.commit(&state.queue);

    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /requests/:id
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TripRequest>> {
    let request = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trip request {} not found", id)))?;

    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<RequestStatus>,
}

/// GET /requests?status=pending
pub async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Vec<TripRequest>>> {
    let requests = state.store.list(params.status).await?;
    Ok(Json(requests))
}

/// Edit a trip request's fields
/// PATCH /requests/:id
pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTripRequest>,
) -> AppResult<Json<TripRequest>> {
    let before = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trip request {} not found", id)))?;

    let mut after = before.clone();
    if let Some(passenger_name) = body.passenger_name {
        after.passenger_name = passenger_name;
    }
    if let Some(purpose) = body.purpose {
        after.purpose = Some(purpose);
    }
    if let Some(origin_label) = body.origin_label {
        after.origin_label = origin_label;
    }
    if let Some(destination_label) = body.destination_label {
        after.destination_label = destination_label;
    }
    after.updated_at = Utc::now();

    let saved = state.store.update(&after).await?;

    let diff = RequestDiff::between(&before, &saved);
    let mut scope = DispatchScope::new();
    ReconciliationObserver::on_updated(&diff, &saved, &mut scope);
    scope.commit(&state.queue);

    Ok(Json(saved))
}

/// POST /requests/:id/approve
pub async fn approve_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionRequest>,
) -> AppResult<Json<TripRequest>> {
    let mut scope = DispatchScope::new();
    let saved = state
        .approval
        .approve(id, body.actor_id, body.note, &mut scope)
        .await?;
    scope.commit(&state.queue);

    Ok(Json(saved))
}

/// POST /requests/:id/reject
pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionRequest>,
) -> AppResult<Json<TripRequest>> {
    apply_status(&state, id, RequestStatus::Rejected, body).await
}

/// POST /requests/:id/cancel
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionRequest>,
) -> AppResult<Json<TripRequest>> {
    apply_status(&state, id, RequestStatus::Cancelled, body).await
}

async fn apply_status(
    state: &AppState,
    id: Uuid,
    target: RequestStatus,
    body: TransitionRequest,
) -> AppResult<Json<TripRequest>> {
    let before = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trip request {} not found", id)))?;

    let mut request = before.clone();
    state
        .status_service
        .apply_transition(
            &mut request,
            StatusTransition::new(target, body.actor_id, body.note),
        )
        .await?;

    let diff = RequestDiff::between(&before, &request);
    let mut scope = DispatchScope::new();
    ReconciliationObserver::on_updated(&diff, &request, &mut scope);
    scope.commit(&state.queue);

    Ok(Json(request))
}
