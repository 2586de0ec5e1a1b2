use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult, GeocodeError};

/// External address-to-coordinate lookup. The engine depends on it through
/// this single contract: given a label, an optional pair or a failure.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, label: &str) -> Result<Option<(f64, f64)>, GeocodeError>;
}

/// Nominatim-style search endpoint returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// HTTP geocoding provider with a bounded request timeout. Latency and rate
/// limits are the provider's concern; we only classify its failures.
pub struct HttpGeocodeProvider {
    client: reqwest::Client,
    search_url: String,
}

impl HttpGeocodeProvider {
    pub fn new(search_url: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build geocoder client: {}", e)))?;

        Ok(Self { client, search_url })
    }
}

#[async_trait]
impl GeocodeProvider for HttpGeocodeProvider {
    async fn geocode(&self, label: &str) -> Result<Option<(f64, f64)>, GeocodeError> {
        if label.trim().is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", label), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(GeocodeError::from)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if status.is_server_error() {
            return Err(GeocodeError::Network(format!("provider returned {}", status)));
        }
        if !status.is_success() {
            return Err(GeocodeError::Rejected(format!("provider returned {}", status)));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Malformed(format!("{:?}", e)))?;

        match hits.first() {
            Some(hit) => {
                let lat: f64 = hit
                    .lat
                    .parse()
                    .map_err(|_| GeocodeError::Malformed(format!("bad latitude: {}", hit.lat)))?;
                let lng: f64 = hit
                    .lon
                    .parse()
                    .map_err(|_| GeocodeError::Malformed(format!("bad longitude: {}", hit.lon)))?;
                debug!("Geocoded '{}' -> ({}, {})", label, lat, lng);
                Ok(Some((lat, lng)))
            }
            None => {
                debug!("No geocoder result for '{}'", label);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_label_short_circuits_without_a_request() {
        // Unroutable URL: a request would fail, a blank label must not send one.
        let provider = HttpGeocodeProvider::new(
            "http://127.0.0.1:1/search".to_string(),
            Duration::from_millis(50),
        )
        .unwrap();

        assert_eq!(provider.geocode("   ").await.unwrap(), None);
    }

    #[test]
    fn test_transient_classification() {
        assert!(GeocodeError::Timeout.is_transient());
        assert!(GeocodeError::RateLimited.is_transient());
        assert!(GeocodeError::Network("connection reset".into()).is_transient());
        assert!(!GeocodeError::Rejected("provider returned 400".into()).is_transient());
        assert!(!GeocodeError::Malformed("bad latitude: x".into()).is_transient());
    }
}
