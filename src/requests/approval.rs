use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::geo::bases::BaseRegistry;
use crate::geo::bounds::RegionBounds;
use crate::geocode::job::GeocodeJob;
use crate::geocode::queue::DispatchScope;
use crate::requests::models::{RequestStatus, StatusTransition, TripRequest};
use crate::requests::status::StatusService;
use crate::requests::store::RequestStore;

/// The approve use case. Approval unblocks downstream dispatch and driver
/// assignment, so it gets both an immediate best-effort coordinate fix from
/// the base registry and a guaranteed asynchronous fallback, instead of
/// relying on the observer's coarser heuristic.
pub struct ApprovalWorkflow {
    store: Arc<dyn RequestStore>,
    status: StatusService,
    bases: Arc<BaseRegistry>,
    bounds: RegionBounds,
}

impl ApprovalWorkflow {
    pub fn new(
        store: Arc<dyn RequestStore>,
        bases: Arc<BaseRegistry>,
        bounds: RegionBounds,
    ) -> Self {
        Self {
            status: StatusService::new(store.clone()),
            store,
            bases,
            bounds,
        }
    }

    pub async fn approve(
        &self,
        id: Uuid,
        actor_id: Uuid,
        note: Option<String>,
        scope: &mut DispatchScope,
    ) -> AppResult<TripRequest> {
        let mut request = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trip request {} not found", id)))?;

        self.status
            .apply_transition(
                &mut request,
                StatusTransition::new(RequestStatus::Approved, actor_id, note),
            )
            .await?;

        // Known-base short circuit: fix up both sides synchronously where the
        // labels match registered locations, in one save.
        let mut fixed_any = false;
        if let Some((lat, lng)) = self.bases.resolve(&request.origin_label) {
            request.set_origin_pair(lat, lng);
            fixed_any = true;
        }
        if let Some((lat, lng)) = self.bases.resolve(&request.destination_label) {
            request.set_destination_pair(lat, lng);
            fixed_any = true;
        }
        if fixed_any {
            request = self.store.update(&request).await?;
            info!("✓ Base registry fixed coordinates for trip request {}", id);
        }

        // Judge the post-save state; anything short of two complete in-region
        // pairs gets the asynchronous safety net.
        let saved = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trip request {} not found", id)))?;

        let origin_ok = self.bounds.pair_within(saved.from_lat, saved.from_lng);
        let destination_ok = self.bounds.pair_within(saved.to_lat, saved.to_lng);
        if !(origin_ok && destination_ok) {
            info!("Trip request {} still needs geocoding after approval", id);
            scope.defer(GeocodeJob::new(id));
        }

        Ok(saved)
    }
}
