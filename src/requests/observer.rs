use tracing::debug;

use crate::geocode::job::GeocodeJob;
use crate::geocode::queue::DispatchScope;
use crate::requests::models::{RequestDiff, RequestStatus, TripRequest};

/// Decides, after each creation or update, whether a geocode job must be
/// queued. Invoked explicitly by the write path with a changed-field diff;
/// the jobs it defers become visible to workers only after the triggering
/// write commits.
///
/// Dispatch is coarse on purpose: a spurious extra geocode call is cheap
/// relative to stale coordinates, and every job re-reads current state.
pub struct ReconciliationObserver;

impl ReconciliationObserver {
    /// A brand-new record has no coordinates yet; always queue.
    pub fn on_created(request: &TripRequest, scope: &mut DispatchScope) {
        debug!("Trip request {} created, queueing geocode", request.id);
        scope.defer(GeocodeJob::new(request.id));
    }

    pub fn on_updated(diff: &RequestDiff, request: &TripRequest, scope: &mut DispatchScope) {
        if Self::needs_reconciliation(diff, request) {
            debug!("Trip request {} needs reconciliation, queueing geocode", request.id);
            scope.defer(GeocodeJob::new(request.id));
        }
    }

    /// Queue when a label changed, when either pair is incomplete, or when
    /// the status just moved to approved (approval is a trust boundary where
    /// coordinates must be freshly verified).
    fn needs_reconciliation(diff: &RequestDiff, request: &TripRequest) -> bool {
        diff.any_label_changed()
            || !request.origin_complete()
            || !request.destination_complete()
            || (diff.status_changed && request.status == RequestStatus::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::models::TripRequest;
    use uuid::Uuid;

    fn complete_request() -> TripRequest {
        let mut request = TripRequest::new(
            Uuid::new_v4(),
            "J. Doe".to_string(),
            Some("Site visit".to_string()),
            "Office".to_string(),
            "Onne Base".to_string(),
        );
        request.set_origin_pair(4.7888, 7.0545);
        request.set_destination_pair(4.6951, 7.1558);
        request
    }

    #[test]
    fn test_creation_always_queues_exactly_one_job() {
        let request = complete_request();
        let mut scope = DispatchScope::new();

        ReconciliationObserver::on_created(&request, &mut scope);

        assert!(!scope.is_empty());
    }

    #[test]
    fn test_unrelated_edit_with_complete_pairs_queues_nothing() {
        let request = complete_request();
        let diff = RequestDiff::default();
        let mut scope = DispatchScope::new();

        ReconciliationObserver::on_updated(&diff, &request, &mut scope);

        assert!(scope.is_empty());
    }

    #[test]
    fn test_label_change_queues_even_with_complete_pairs() {
        let request = complete_request();
        let diff = RequestDiff {
            origin_label_changed: true,
            ..RequestDiff::default()
        };
        let mut scope = DispatchScope::new();

        ReconciliationObserver::on_updated(&diff, &request, &mut scope);

        assert!(!scope.is_empty());
    }

    #[test]
    fn test_incomplete_pair_queues_on_any_update() {
        let mut request = complete_request();
        request.to_lng = None;
        let mut scope = DispatchScope::new();

        ReconciliationObserver::on_updated(&RequestDiff::default(), &request, &mut scope);

        assert!(!scope.is_empty());
    }

    #[test]
    fn test_status_change_to_approved_queues() {
        let mut request = complete_request();
        request.status = RequestStatus::Approved;
        let diff = RequestDiff {
            status_changed: true,
            ..RequestDiff::default()
        };
        let mut scope = DispatchScope::new();

        ReconciliationObserver::on_updated(&diff, &request, &mut scope);

        assert!(!scope.is_empty());
    }

    #[test]
    fn test_status_change_to_rejected_alone_queues_nothing() {
        let mut request = complete_request();
        request.status = RequestStatus::Rejected;
        let diff = RequestDiff {
            status_changed: true,
            ..RequestDiff::default()
        };
        let mut scope = DispatchScope::new();

        ReconciliationObserver::on_updated(&diff, &request, &mut scope);

        assert!(scope.is_empty());
    }
}
