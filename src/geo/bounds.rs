use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Rectangular home-region box used as a plausibility filter for coordinates.
///
/// This is deliberately a rough rectangle, not a country polygon: it only
/// feeds dispatch decisions ("do we trust what is stored?"), never write-time
/// filtering of geocoder results.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RegionBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl RegionBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> AppResult<Self> {
        if min_lat > max_lat || min_lng > max_lng {
            return Err(AppError::Config(format!(
                "invalid region bounds: lat {}..{}, lng {}..{}",
                min_lat, max_lat, min_lng, max_lng
            )));
        }
        Ok(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Box edges count as inside.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// A pair with either coordinate missing is never within the region.
    pub fn pair_within(&self, lat: Option<f64>, lng: Option<f64>) -> bool {
        match (lat, lng) {
            (Some(lat), Some(lng)) => self.contains(lat, lng),
            _ => false,
        }
    }
}

impl Default for RegionBounds {
    fn default() -> Self {
        // Nigeria
        Self {
            min_lat: 4.27,
            max_lat: 13.89,
            min_lng: 2.67,
            max_lng: 14.68,
        }
    }
}
