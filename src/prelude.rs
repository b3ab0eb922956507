//! Prelude module for common mapcanvas types and traits
//!
//! Re-exports what an embedding canvas needs, for use as
//! `use mapcanvas::prelude::*;`

pub use crate::core::{
    config::DrawContextConfig,
    constants::BUFFER_BORDER,
    events::{DrawContextEvent, RedrawFlags},
    geo::{GeoRect, Point, Size, DEG_TO_RAD, RAD_TO_DEG},
    scales::ScalesType,
};

pub use crate::projection::{Datum, Projection, ProjectionBuilder};

pub use crate::rendering::{
    DrawContext, NoopPainter, ProjectionSnapshot, RasterSurface, RedrawRequester, RenderTarget,
    Surface, TilePainter,
};

pub use crate::{MapError, Result};
