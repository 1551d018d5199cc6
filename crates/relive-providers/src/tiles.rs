//! Mapbox Static Images client.

use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use image::RgbImage;
use reqwest::Client;
use tracing::debug;
use url::Url;

use relive_media::{MediaResult, TileKey, TileSource};

use crate::config::MapboxConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::retry::with_retry;

type TileRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// [`TileSource`] rendering a camera view with the Static Images API.
pub struct StaticMapClient {
    http: Client,
    config: MapboxConfig,
    limiter: TileRateLimiter,
}

impl StaticMapClient {
    pub fn new(config: MapboxConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("MAPBOX_API_KEY"));
        }
        let http = Client::builder()
            .timeout(config.tile_timeout)
            .build()
            .map_err(ProviderError::Network)?;
        let rate = NonZeroU32::new(config.tile_requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http,
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            config,
        })
    }

    /// `{base}/styles/v1/{style}/static/{lon,lat,zoom,bearing,pitch}/{w}x{h}@2x`
    pub fn tile_url(&self, key: &TileKey) -> ProviderResult<Url> {
        let base = format!(
            "{}/styles/v1/{}/static/{}/{}x{}@2x",
            self.config.base_url.trim_end_matches('/'),
            self.config.style,
            key,
            self.config.tile_width,
            self.config.tile_height
        );
        Url::parse_with_params(&base, &[("access_token", self.config.api_key.as_str())])
            .map_err(|e| ProviderError::InvalidUrl(e.to_string()))
    }

    async fn fetch(&self, url: &Url) -> ProviderResult<RgbImage> {
        self.limiter.until_ready().await;

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(image::load_from_memory(&bytes)?.to_rgb8())
    }
}

#[async_trait]
impl TileSource for StaticMapClient {
    async fn fetch_tile(&self, key: &TileKey) -> MediaResult<RgbImage> {
        let url = self.tile_url(key)?;
        debug!(tile = %key, "Requesting static map");
        let tile = with_retry(self.config.max_retries, "static map", || self.fetch(&url)).await?;
        Ok(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb};
    use relive_media::MediaError;
    use std::io::Cursor;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 40, 60])))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    fn client(server: &MockServer) -> StaticMapClient {
        let config = MapboxConfig {
            base_url: server.uri(),
            max_retries: 0,
            ..MapboxConfig::new("pk.test")
        };
        StaticMapClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_tile_url_encodes_camera() {
        let server = MockServer::start().await;
        let url = client(&server)
            .tile_url(&TileKey::new(121.56543, 25.03391, 17.04, 93.0, 65.0))
            .unwrap();
        assert!(url.path().ends_with(
            "/styles/v1/mapbox/satellite-streets-v12/static/121.5654,25.0339,17.0,90,60/800x600@2x"
        ));
        assert_eq!(url.query(), Some("access_token=pk.test"));
    }

    #[tokio::test]
    async fn test_fetch_tile_decodes_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/styles/v1/mapbox/satellite-streets-v12/static/121.0000,25.0000,17.0,0,60/800x600@2x",
            ))
            .and(query_param("access_token", "pk.test"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png(16, 12)))
            .expect(1)
            .mount(&server)
            .await;

        let tile = client(&server)
            .fetch_tile(&TileKey::new(121.0, 25.0, 17.0, 0.0, 60.0))
            .await
            .unwrap();
        assert_eq!(tile.dimensions(), (16, 12));
        assert_eq!(*tile.get_pixel(0, 0), Rgb([20, 40, 60]));
    }

    #[tokio::test]
    async fn test_failures_become_recoverable_tile_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_string("Invalid pitch"))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_tile(&TileKey::new(121.0, 25.0, 17.0, 0.0, 60.0))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Tile(_)));
        assert!(err.is_frame_recoverable());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_image_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 1, 2, 3]))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_tile(&TileKey::new(121.0, 25.0, 17.0, 0.0, 60.0))
            .await
            .unwrap_err();
        assert!(err.is_frame_recoverable());
    }
}
