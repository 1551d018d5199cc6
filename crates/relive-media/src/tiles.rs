//! Map imagery lookup and caching.
//!
//! Camera positions are quantized into a [`TileKey`] before any request is
//! made, so neighbouring frames that would produce visually identical
//! imagery share one fetch.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use relive_models::CameraPosition;

use crate::error::MediaResult;

/// Maximum pitch accepted by static imagery providers.
pub const MAX_TILE_PITCH: u8 = 60;

/// Bearing resolution in degrees.
const BEARING_STEP: u16 = 5;

/// Quantized camera state identifying one map image.
///
/// Longitude and latitude keep 4 decimals (about 11 m), zoom keeps 1
/// decimal, bearing is floored to 5 degrees and pitch is clamped to
/// [0, 60] and truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    lon_e4: i64,
    lat_e4: i64,
    zoom_e1: i32,
    bearing: u16,
    pitch: u8,
}

impl TileKey {
    pub fn new(longitude: f64, latitude: f64, zoom: f64, bearing_deg: f64, pitch: f64) -> Self {
        let bearing = bearing_deg.rem_euclid(360.0);
        let bearing = ((bearing / BEARING_STEP as f64).floor() as u16 * BEARING_STEP) % 360;
        Self {
            lon_e4: (longitude * 1e4).round() as i64,
            lat_e4: (latitude * 1e4).round() as i64,
            zoom_e1: (zoom * 10.0).round() as i32,
            bearing,
            pitch: pitch.clamp(0.0, MAX_TILE_PITCH as f64) as u8,
        }
    }

    pub fn from_camera(position: &CameraPosition) -> Self {
        Self::new(
            position.longitude,
            position.latitude,
            position.zoom,
            position.bearing_deg,
            position.pitch,
        )
    }

    pub fn longitude(&self) -> f64 {
        self.lon_e4 as f64 / 1e4
    }

    pub fn latitude(&self) -> f64 {
        self.lat_e4 as f64 / 1e4
    }

    pub fn zoom(&self) -> f64 {
        self.zoom_e1 as f64 / 10.0
    }

    pub fn bearing(&self) -> u16 {
        self.bearing
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }
}

impl fmt::Display for TileKey {
    /// `lon,lat,zoom,bearing,pitch`, the camera segment of a static map URL.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4},{:.4},{:.1},{},{}",
            self.longitude(),
            self.latitude(),
            self.zoom(),
            self.bearing,
            self.pitch
        )
    }
}

/// External map imagery collaborator.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Fetch the map image for a camera state.
    async fn fetch_tile(&self, key: &TileKey) -> MediaResult<RgbImage>;
}

/// Bounded tile store with first-in first-out eviction.
#[derive(Debug)]
pub struct TileCache {
    capacity: usize,
    entries: HashMap<TileKey, Arc<RgbImage>>,
    order: VecDeque<TileKey>,
    hits: u64,
    misses: u64,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a tile, counting the hit or miss.
    pub fn get(&mut self, key: &TileKey) -> Option<Arc<RgbImage>> {
        match self.entries.get(key) {
            Some(tile) => {
                self.hits += 1;
                Some(Arc::clone(tile))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a tile, evicting the oldest entry when full.
    pub fn insert(&mut self, key: TileKey, tile: Arc<RgbImage>) {
        if self.entries.insert(key, tile).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
