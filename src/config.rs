use config::ConfigError;
use serde::Deserialize;

use crate::error::AppResult;
use crate::geo::bases::BaseEntry;
use crate::geo::bounds::RegionBounds;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub geocoder_url: String,
    pub geocoder_timeout_secs: u64,
    pub region_min_lat: f64,
    pub region_max_lat: f64,
    pub region_min_lng: f64,
    pub region_max_lng: f64,
    /// Known fixed locations, e.g.
    /// `BASE_LOCATIONS=[{"name":"Office","lat":4.7888,"lng":7.0545}]`
    pub base_locations: Vec<BaseEntry>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_bounds = RegionBounds::default();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/dispatch".to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            geocoder_url: std::env::var("GEOCODER_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org/search".to_string()),
            geocoder_timeout_secs: env_parse("GEOCODER_TIMEOUT_SECS", 10)?,
            region_min_lat: env_parse("REGION_MIN_LAT", default_bounds.min_lat)?,
            region_max_lat: env_parse("REGION_MAX_LAT", default_bounds.max_lat)?,
            region_min_lng: env_parse("REGION_MIN_LNG", default_bounds.min_lng)?,
            region_max_lng: env_parse("REGION_MAX_LNG", default_bounds.max_lng)?,
            base_locations: base_locations_from_env()?,
        })
    }

    pub fn region_bounds(&self) -> AppResult<RegionBounds> {
        RegionBounds::new(
            self.region_min_lat,
            self.region_max_lat,
            self.region_min_lng,
            self.region_max_lng,
        )
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Message(format!("{} is not a valid number: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

fn base_locations_from_env() -> Result<Vec<BaseEntry>, ConfigError> {
    match std::env::var("BASE_LOCATIONS") {
        Ok(raw) => serde_json::from_str(&raw)
            .map_err(|e| ConfigError::Message(format!("BASE_LOCATIONS is not valid JSON: {}", e))),
        Err(_) => Ok(Vec::new()),
    }
}
