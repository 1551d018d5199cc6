//! Mapbox Map Matching client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use relive_route::{MatchError, MatchResult, RoadMatcher};

use crate::config::MapboxConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::with_retry;

/// Coordinates accepted by a single matching request.
pub const MAX_MATCH_COORDINATES: usize = 100;

#[derive(Debug, Deserialize)]
struct MatchingResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    matchings: Vec<Matching>,
}

#[derive(Debug, Deserialize)]
struct Matching {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

/// [`RoadMatcher`] backed by the Mapbox Map Matching API.
pub struct MapboxMatcher {
    http: Client,
    config: MapboxConfig,
}

impl MapboxMatcher {
    pub fn new(config: MapboxConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("MAPBOX_API_KEY"));
        }
        let http = Client::builder()
            .timeout(config.matching_timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    fn request_url(&self, coordinates: &[[f64; 2]]) -> ProviderResult<Url> {
        let path = coordinates
            .iter()
            .map(|[lon, lat]| format!("{lon},{lat}"))
            .collect::<Vec<_>>()
            .join(";");
        let radiuses = vec![self.config.radius_m.to_string(); coordinates.len()].join(";");

        let base = format!(
            "{}/matching/v5/mapbox/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            path
        );
        Url::parse_with_params(
            &base,
            &[
                ("access_token", self.config.api_key.as_str()),
                ("geometries", "geojson"),
                ("radiuses", radiuses.as_str()),
                ("overview", "full"),
                ("tidy", "true"),
            ],
        )
        .map_err(|e| ProviderError::InvalidUrl(e.to_string()))
    }

    async fn fetch(&self, url: &Url) -> ProviderResult<MatchingResponse> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RoadMatcher for MapboxMatcher {
    async fn match_batch(&self, coordinates: &[[f64; 2]]) -> MatchResult<Vec<[f64; 2]>> {
        if coordinates.len() < 2 || coordinates.len() > MAX_MATCH_COORDINATES {
            return Err(MatchError::InvalidBatch(coordinates.len()));
        }

        let url = self.request_url(coordinates)?;
        debug!(points = coordinates.len(), "Sending map matching request");

        let response = with_retry(self.config.max_retries, "map matching", || self.fetch(&url)).await?;

        if response.code != "Ok" {
            let detail = response.message.unwrap_or_else(|| response.code.clone());
            warn!(code = %response.code, "Map matching returned no match");
            return Err(MatchError::no_match(detail));
        }

        let matched = response
            .matchings
            .into_iter()
            .next()
            .map(|m| m.geometry.coordinates)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| MatchError::no_match("response has no matchings"))?;

        debug!(input = coordinates.len(), output = matched.len(), "Batch matched");
        Ok(matched)
    }
}
