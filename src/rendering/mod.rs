pub mod buffer;
pub mod context;
pub mod painter;
pub(crate) mod state;
pub mod surface;

// Re-export main types
pub use buffer::{BufferSlot, DoubleBuffer, ProjectionSnapshot};
pub use context::DrawContext;
pub use painter::{NoopPainter, RedrawRequester, RenderTarget, TilePainter};
pub use surface::{RasterSurface, Surface};
