//! Street-level photos from the Street View Static API.

use std::io::Cursor;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::StreetViewConfig;
use crate::error::{ProviderError, ProviderResult};

/// External street-level photo collaborator.
#[async_trait]
pub trait PhotoProvider: Send + Sync {
    /// Capture a photo at a location looking along `heading_deg`.
    ///
    /// Returns JPEG bytes. [`ProviderError::NoImagery`] means the location
    /// simply has no coverage.
    async fn capture(&self, latitude: f64, longitude: f64, heading_deg: f64) -> ProviderResult<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct Metadata {
    status: String,
}

/// [`PhotoProvider`] backed by Google Street View.
pub struct StreetViewClient {
    http: Client,
    config: StreetViewConfig,
}

impl StreetViewClient {
    pub fn new(config: StreetViewConfig) -> ProviderResult<Self> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("GOOGLE_API_KEY"));
        }
        let http = Client::builder().build().map_err(ProviderError::Network)?;
        Ok(Self { http, config })
    }

    /// Create from environment variables; `None` when no key is configured.
    pub fn from_env() -> ProviderResult<Option<Self>> {
        StreetViewConfig::from_env().map(Self::new).transpose()
    }

    fn url(&self, suffix: &str, params: &[(&str, String)]) -> ProviderResult<Url> {
        let base = format!("{}{}", self.config.base_url.trim_end_matches('/'), suffix);
        let mut url = Url::parse(&base).map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("key", &self.config.api_key);
        Ok(url)
    }

    async fn has_coverage(&self, location: &str) -> ProviderResult<bool> {
        let url = self.url("/metadata", &[("location", location.to_string())])?;
        let response = self
            .http
            .get(url)
            .timeout(self.config.metadata_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let metadata: Metadata = serde_json::from_str(&response.text().await?)?;
        debug!(location, status = %metadata.status, "Street View metadata");
        Ok(metadata.status == "OK")
    }

    async fn fetch_image(&self, location: &str, heading_deg: f64) -> ProviderResult<Vec<u8>> {
        let url = self.url(
            "",
            &[
                ("size", format!("{}x{}", self.config.width, self.config.height)),
                ("location", location.to_string()),
                ("heading", format!("{heading_deg:.1}")),
                ("fov", self.config.fov.to_string()),
                ("pitch", self.config.pitch.to_string()),
            ],
        )?;
        let response = self
            .http
            .get(url)
            .timeout(self.config.image_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode any supported image and re-encode it as an RGB JPEG.
pub fn reencode_jpeg(bytes: &[u8], quality: u8) -> ProviderResult<Vec<u8>> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Jpeg(quality))?;
    Ok(out)
}

#[async_trait]
impl PhotoProvider for StreetViewClient {
    async fn capture(&self, latitude: f64, longitude: f64, heading_deg: f64) -> ProviderResult<Vec<u8>> {
        let location = format!("{latitude},{longitude}");

        if !self.has_coverage(&location).await? {
            return Err(ProviderError::NoImagery(location));
        }

        let raw = self.fetch_image(&location, heading_deg.rem_euclid(360.0)).await?;
        reencode_jpeg(&raw, self.config.jpeg_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StreetViewClient {
        let config = StreetViewConfig {
            base_url: format!("{}/streetview", server.uri()),
            ..StreetViewConfig::new("g-key")
        };
        StreetViewClient::new(config).unwrap()
    }

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 8, Rgb([200, 100, 50])))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    async fn mount_metadata(server: &MockServer, status: &str) {
        Mock::given(method("GET"))
            .and(path("/streetview/metadata"))
            .and(query_param("location", "25.04,121.51"))
            .and(query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": status})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_capture_returns_jpeg() {
        let server = MockServer::start().await;
        mount_metadata(&server, "OK").await;
        Mock::given(method("GET"))
            .and(path("/streetview"))
            .and(query_param("size", "600x400"))
            .and(query_param("heading", "270.0"))
            .and(query_param("fov", "90"))
            .and(query_param("pitch", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png()))
            .expect(1)
            .mount(&server)
            .await;

        let jpeg = client(&server).capture(25.04, 121.51, -90.0).await.unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
    }

    #[tokio::test]
    async fn test_no_coverage_skips_image_request() {
        let server = MockServer::start().await;
        mount_metadata(&server, "ZERO_RESULTS").await;
        Mock::given(method("GET"))
            .and(path("/streetview"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server).capture(25.04, 121.51, 0.0).await;
        assert!(matches!(result, Err(ProviderError::NoImagery(_))));
    }

    #[tokio::test]
    async fn test_image_failure_is_reported() {
        let server = MockServer::start().await;
        mount_metadata(&server, "OK").await;
        Mock::given(method("GET"))
            .and(path("/streetview"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let result = client(&server).capture(25.04, 121.51, 0.0).await;
        assert!(matches!(result, Err(ProviderError::Status { status: 403, .. })));
    }

    #[test]
    fn test_reencode_rejects_garbage() {
        assert!(matches!(reencode_jpeg(b"nope", 85), Err(ProviderError::Image(_))));
    }
}
