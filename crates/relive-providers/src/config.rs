//! Provider client configuration.

use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

const MAPBOX_BASE_URL: &str = "https://api.mapbox.com";
const STREET_VIEW_BASE_URL: &str = "https://maps.googleapis.com/maps/api/streetview";

/// Upper bound for `MAPBOX_RETRIES`.
pub const MAX_RETRIES: u32 = 8;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Configuration shared by the Mapbox matching and static map clients.
#[derive(Debug, Clone)]
pub struct MapboxConfig {
    pub api_key: String,
    pub base_url: String,
    /// Matching profile, e.g. `driving`
    pub profile: String,
    /// Search radius per coordinate in meters
    pub radius_m: u32,
    pub matching_timeout: Duration,
    pub tile_timeout: Duration,
    /// Style path used for static images
    pub style: String,
    /// Static image size in logical pixels; fetched at @2x
    pub tile_width: u32,
    pub tile_height: u32,
    /// Static image requests allowed per second
    pub tile_requests_per_second: u32,
    pub max_retries: u32,
}

impl Default for MapboxConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: MAPBOX_BASE_URL.to_string(),
            profile: "driving".to_string(),
            radius_m: 50,
            matching_timeout: Duration::from_secs(30),
            tile_timeout: Duration::from_secs(10),
            style: "mapbox/satellite-streets-v12".to_string(),
            tile_width: 800,
            tile_height: 600,
            tile_requests_per_second: 20,
            max_retries: 2,
        }
    }
}

impl MapboxConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// `MAPBOX_API_KEY` is required.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("MAPBOX_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey("MAPBOX_API_KEY"))?;
        let defaults = Self::default();

        Ok(Self {
            api_key,
            base_url: std::env::var("MAPBOX_BASE_URL").unwrap_or(defaults.base_url),
            profile: std::env::var("MAPBOX_MATCHING_PROFILE").unwrap_or(defaults.profile),
            radius_m: env_or("MAPBOX_MATCHING_RADIUS", defaults.radius_m),
            matching_timeout: Duration::from_secs(env_or("MAPBOX_MATCHING_TIMEOUT", 30)),
            tile_timeout: Duration::from_secs(env_or("MAPBOX_TILE_TIMEOUT", 10)),
            style: std::env::var("MAPBOX_STYLE").unwrap_or(defaults.style),
            tile_width: defaults.tile_width,
            tile_height: defaults.tile_height,
            tile_requests_per_second: env_or("MAPBOX_TILE_RPS", defaults.tile_requests_per_second),
            max_retries: env_or("MAPBOX_RETRIES", defaults.max_retries).min(MAX_RETRIES),
        })
    }
}

/// Configuration for the street-level photo client.
#[derive(Debug, Clone)]
pub struct StreetViewConfig {
    pub api_key: String,
    pub base_url: String,
    pub metadata_timeout: Duration,
    pub image_timeout: Duration,
    pub width: u32,
    pub height: u32,
    pub fov: u32,
    pub pitch: i32,
    /// JPEG quality of the re-encoded photo
    pub jpeg_quality: u8,
}

impl Default for StreetViewConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: STREET_VIEW_BASE_URL.to_string(),
            metadata_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(15),
            width: 600,
            height: 400,
            fov: 90,
            pitch: 10,
            jpeg_quality: 85,
        }
    }
}

impl StreetViewConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// Returns `None` when `GOOGLE_API_KEY` is unset; photos are optional.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let defaults = Self::default();

        Some(Self {
            api_key,
            base_url: std::env::var("STREET_VIEW_BASE_URL").unwrap_or(defaults.base_url),
            metadata_timeout: Duration::from_secs(env_or("STREET_VIEW_METADATA_TIMEOUT", 10)),
            image_timeout: Duration::from_secs(env_or("STREET_VIEW_IMAGE_TIMEOUT", 15)),
            ..defaults
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapbox_defaults() {
        let config = MapboxConfig::new("pk.test");
        assert_eq!(config.api_key, "pk.test");
        assert_eq!(config.profile, "driving");
        assert_eq!(config.radius_m, 50);
        assert_eq!(config.matching_timeout, Duration::from_secs(30));
        assert_eq!(config.tile_timeout, Duration::from_secs(10));
        assert!(config.max_retries <= MAX_RETRIES);
    }

    #[test]
    fn test_street_view_defaults() {
        let config = StreetViewConfig::new("g-key");
        assert_eq!((config.width, config.height), (600, 400));
        assert_eq!(config.fov, 90);
        assert_eq!(config.pitch, 10);
        assert_eq!(config.jpeg_quality, 85);
    }
}
