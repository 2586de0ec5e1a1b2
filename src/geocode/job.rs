use uuid::Uuid;

use crate::error::AppResult;
use crate::geocode::provider::GeocodeProvider;
use crate::requests::store::RequestStore;
use tracing::{info, warn};

/// Asynchronous unit of work: resolve a request's current labels to
/// coordinates and persist the result.
///
/// Carries only the request id, never a label snapshot: execution always
/// re-reads the record so the latest labels win even if the row changed again
/// after enqueue. Running the same job twice is safe for the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeocodeJob {
    pub request_id: Uuid,
}

impl GeocodeJob {
    pub fn new(request_id: Uuid) -> Self {
        Self { request_id }
    }

    pub async fn run(
        &self,
        store: &dyn RequestStore,
        provider: &dyn GeocodeProvider,
    ) -> AppResult<()> {
        let Some(mut request) = store.get(self.request_id).await? else {
            // Deleted between enqueue and execution; not this engine's concern.
            info!(
                "Trip request {} no longer exists, skipping geocode",
                self.request_id
            );
            return Ok(());
        };

        let mut resolved_any = false;

        if let Some((lat, lng)) = Self::resolve_label(provider, &request.origin_label).await? {
            request.set_origin_pair(lat, lng);
            resolved_any = true;
        }

        if let Some((lat, lng)) = Self::resolve_label(provider, &request.destination_label).await? {
            request.set_destination_pair(lat, lng);
            resolved_any = true;
        }

        if resolved_any {
            store.update(&request).await?;
            info!(
                "✓ Reconciled coordinates for trip request {}",
                self.request_id
            );
        }

        Ok(())
    }

    /// A transient provider failure bubbles up so the queue retries the job;
    /// a permanent one is logged and the label stays unresolved. Results are
    /// not bounds-checked here: an address outside the home region is a
    /// legitimate answer.
    async fn resolve_label(
        provider: &dyn GeocodeProvider,
        label: &str,
    ) -> AppResult<Option<(f64, f64)>> {
        match provider.geocode(label).await {
            Ok(pair) => Ok(pair),
            Err(e) if e.is_transient() => Err(e.into()),
            Err(e) => {
                warn!("Geocoder permanently failed for '{}': {}", label, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, GeocodeError};
    use crate::requests::models::TripRequest;
    use crate::requests::store::MemoryRequestStore;
    use async_trait::async_trait;
    use std::collections::HashMap;

    enum Lookup {
        Found(f64, f64),
        NotFound,
        Transient,
        Permanent,
    }

    struct FakeProvider {
        lookups: HashMap<String, Lookup>,
    }

    impl FakeProvider {
        fn new(lookups: Vec<(&str, Lookup)>) -> Self {
            Self {
                lookups: lookups
                    .into_iter()
                    .map(|(label, lookup)| (label.to_string(), lookup))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl GeocodeProvider for FakeProvider {
        async fn geocode(&self, label: &str) -> Result<Option<(f64, f64)>, GeocodeError> {
            match self.lookups.get(label) {
                Some(Lookup::Found(lat, lng)) => Ok(Some((*lat, *lng))),
                Some(Lookup::Transient) => Err(GeocodeError::Timeout),
                Some(Lookup::Permanent) => {
                    Err(GeocodeError::Rejected("provider returned 400".into()))
                }
                _ => Ok(None),
            }
        }
    }

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
    async fn test_resolves_both_labels_as_complete_pairs() {
        let store = MemoryRequestStore::new();
        let request = request();
        store.create(&request).await.unwrap();

        let provider = FakeProvider::new(vec![
            ("Office", Lookup::Found(4.7888, 7.0545)),
            ("Onne Base", Lookup::Found(4.6951, 7.1558)),
        ]);

        GeocodeJob::new(request.id)
            .run(&store, &provider)
            .await
            .unwrap();

        let saved = store.get(request.id).await.unwrap().unwrap();
        assert_eq!(saved.origin_pair(), Some((4.7888, 7.0545)));
        assert_eq!(saved.destination_pair(), Some((4.6951, 7.1558)));
    }

    #[tokio::test]
    async fn test_unresolved_label_leaves_side_untouched() {
        let store = MemoryRequestStore::new();
        let mut request = request();
        request.set_destination_pair(4.6951, 7.1558);
        store.create(&request).await.unwrap();

        // Origin resolves, destination lookup finds nothing; existing
        // destination data must survive.
        let provider = FakeProvider::new(vec![
            ("Office", Lookup::Found(4.7888, 7.0545)),
            ("Onne Base", Lookup::NotFound),
        ]);

        GeocodeJob::new(request.id)
            .run(&store, &provider)
            .await
            .unwrap();

        let saved = store.get(request.id).await.unwrap().unwrap();
        assert_eq!(saved.origin_pair(), Some((4.7888, 7.0545)));
        assert_eq!(saved.destination_pair(), Some((4.6951, 7.1558)));
    }

    #[tokio::test]
    async fn test_never_writes_half_a_pair() {
        let store = MemoryRequestStore::new();
        let request = request();
        store.create(&request).await.unwrap();

        let provider = FakeProvider::new(vec![
            ("Office", Lookup::Found(4.7888, 7.0545)),
            ("Onne Base", Lookup::Permanent),
        ]);

        GeocodeJob::new(request.id)
            .run(&store, &provider)
            .await
            .unwrap();

        let saved = store.get(request.id).await.unwrap().unwrap();
        assert!(saved.origin_complete());
        assert_eq!(saved.to_lat, None);
        assert_eq!(saved.to_lng, None);
    }

    #[tokio::test]
    async fn test_record_deleted_before_execution_is_a_no_op_success() {
        let store = MemoryRequestStore::new();
        let request = request();
        store.create(&request).await.unwrap();

        let job = GeocodeJob::new(request.id);
        store.remove(request.id).await;

        let provider = FakeProvider::new(vec![("Office", Lookup::Found(4.7888, 7.0545))]);
        let result = job.run(&store, &provider).await;
        assert!(result.is_ok());
        assert!(store.get(request.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transient_failure_surfaces_for_retry() {
        let store = MemoryRequestStore::new();
        let request = request();
        store.create(&request).await.unwrap();

        let provider = FakeProvider::new(vec![
            ("Office", Lookup::Transient),
            ("Onne Base", Lookup::Found(4.6951, 7.1558)),
        ]);

        let result = GeocodeJob::new(request.id).run(&store, &provider).await;
        assert!(matches!(result, Err(AppError::Geocode(_))));

        // Nothing persisted: the retry will redo the whole job from current state.
        let saved = store.get(request.id).await.unwrap().unwrap();
        assert!(!saved.origin_complete());
        assert!(!saved.destination_complete());
    }

    #[tokio::test]
    async fn test_redundant_jobs_converge_on_latest_resolution() {
        let store = MemoryRequestStore::new();
        let request = request();
        store.create(&request).await.unwrap();

        let provider = FakeProvider::new(vec![
            ("Office", Lookup::Found(4.7888, 7.0545)),
            ("Onne Base", Lookup::Found(4.6951, 7.1558)),
        ]);

        let job = GeocodeJob::new(request.id);
        job.run(&store, &provider).await.unwrap();
        job.run(&store, &provider).await.unwrap();

        let saved = store.get(request.id).await.unwrap().unwrap();
        assert_eq!(saved.origin_pair(), Some((4.7888, 7.0545)));
        assert_eq!(saved.destination_pair(), Some((4.6951, 7.1558)));
    }
}
