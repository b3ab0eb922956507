//! # mapcanvas
//!
//! Double-buffered map draw contexts.
//!
//! A [`DrawContext`] owns the view geometry of one map layer: its
//! projection, zoom level and the pixel/radian conversions that go with
//! them. Content is painted by a [`TilePainter`] on a background worker into
//! an off-screen buffer, while the UI thread keeps blitting the last finished
//! buffer, shifted and scaled to follow panning and zooming.

pub mod background;
pub mod core;
pub mod prelude;
pub mod projection;
pub mod rendering;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::DrawContextConfig,
    events::{DrawContextEvent, EventBus, RedrawFlags},
    geo::{GeoRect, Point, Size},
    scales::{ScaleTable, ScalesType},
};

pub use projection::{Datum, Ellipsoid, Projection, ProjectionBuilder};

pub use rendering::{
    context::DrawContext,
    painter::{NoopPainter, RedrawRequester, RenderTarget, TilePainter},
    surface::{RasterSurface, Surface},
};

/// Initializes `env_logger` from `RUST_LOG`, once
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// Error type alias for convenience
pub type Error = MapError;
