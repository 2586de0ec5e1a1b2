use std::sync::Arc;

use tracing::info;

use crate::error::AppResult;
use crate::requests::models::{StatusTransition, TripRequest};
use crate::requests::store::RequestStore;

/// Applies status transitions and records who, when, and why.
///
/// Deliberately does not judge whether a transition is legal (the
/// authorization layer decides that before this runs) and never triggers
/// geocoding itself.
pub struct StatusService {
    store: Arc<dyn RequestStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }

    /// Writes the new status and audit fields in a single save and hands back
    /// the saved record.
    pub async fn apply_transition(
        &self,
        request: &mut TripRequest,
        transition: StatusTransition,
    ) -> AppResult<()> {
        info!(
            "Trip request {} -> {} by {}",
            request.id, transition.target, transition.actor_id
        );

        request.apply_transition(&transition);
        *request = self.store.update(request).await?;

        Ok(())
    }
}
