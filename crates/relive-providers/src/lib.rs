//! HTTP clients for the external map and photo services.
//!
//! - [`MapboxMatcher`]: road snapping ([`relive_route::RoadMatcher`])
//! - [`StaticMapClient`]: map imagery ([`relive_media::TileSource`]), rate limited
//! - [`StreetViewClient`]: stop photos ([`PhotoProvider`])

pub mod config;
pub mod error;
pub mod matching;
mod retry;
pub mod streetview;
pub mod tiles;

pub use config::{MapboxConfig, StreetViewConfig};
pub use error::{ProviderError, ProviderResult};
pub use matching::{MapboxMatcher, MAX_MATCH_COORDINATES};
pub use streetview::{reencode_jpeg, PhotoProvider, StreetViewClient};
pub use tiles::StaticMapClient;
