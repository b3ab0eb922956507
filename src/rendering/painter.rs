use crate::core::geo::Point;
use crate::rendering::buffer::{BufferSlot, ProjectionSnapshot};
use crate::rendering::state::Shared;
use image::RgbaImage;
use std::sync::Weak;

/// Paints map content into a buffer slot on the render worker.
///
/// `paint` runs without the context lock held and must render synchronously
/// into the target's raster, using the target's frozen snapshot for all
/// coordinate math. A painter that panics takes the worker down with it;
/// painters are expected to handle their own failures.
pub trait TilePainter: Send + Sync {
    fn paint(&self, target: &mut RenderTarget<'_>);
}

impl<F> TilePainter for F
where
    F: Fn(&mut RenderTarget<'_>) + Send + Sync,
{
    fn paint(&self, target: &mut RenderTarget<'_>) {
        self(target)
    }
}

/// Painter that leaves buffers transparent
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPainter;

impl TilePainter for NoopPainter {
    fn paint(&self, _target: &mut RenderTarget<'_>) {}
}

/// Lets a painter ask for another pass, e.g. when tiles arrived mid-render
#[derive(Clone)]
pub struct RedrawRequester {
    shared: Weak<Shared>,
}

impl RedrawRequester {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    /// Returns false if the context is gone
    pub fn request(&self) -> bool {
        match self.shared.upgrade() {
            Some(shared) => {
                shared.request_redraw();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for RedrawRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedrawRequester")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// What a painter gets to work with during one render pass
pub struct RenderTarget<'a> {
    slot: &'a mut BufferSlot,
    requester: RedrawRequester,
    pass: u64,
}

impl<'a> RenderTarget<'a> {
    pub(crate) fn new(slot: &'a mut BufferSlot, requester: RedrawRequester, pass: u64) -> Self {
        Self {
            slot,
            requester,
            pass,
        }
    }

    pub fn image(&mut self) -> &mut RgbaImage {
        self.slot.image_mut()
    }

    pub fn snapshot(&self) -> &ProjectionSnapshot {
        self.slot.snapshot()
    }

    /// Running number of render passes of this context
    pub fn pass(&self) -> u64 {
        self.pass
    }

    pub fn rad_to_px(&self, p: Point) -> Point {
        self.slot.rad_to_px(p)
    }

    pub fn rad_to_px_polygon(&self, poly: &mut [Point]) {
        self.slot.rad_to_px_polygon(poly)
    }

    pub fn px_to_rad(&self, p: Point) -> Point {
        self.slot.px_to_rad(p)
    }

    pub fn requester(&self) -> &RedrawRequester {
        &self.requester
    }

    /// Shorthand for `requester().request()`
    pub fn request_redraw(&self) -> bool {
        self.requester.request()
    }
}
