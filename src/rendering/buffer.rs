//! The two raster buffers of a draw context.
//!
//! Each slot carries the projection state it was rendered with. The state is
//! frozen when the render starts, so the UI can still place a stale buffer
//! correctly after the user zoomed or panned.

use crate::core::geo::Point;
use crate::projection::Projection;
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex, MutexGuard};

/// Projection state captured when a slot's render started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSnapshot {
    pub zoom_factor: Point,
    pub scale: Point,
    /// Buffer corners in radians: top-left, top-right, bottom-right, bottom-left
    pub refs: [Point; 4],
    pub focus: Point,
}

impl ProjectionSnapshot {
    /// Meters per buffer pixel, signed per axis
    pub fn buffer_scale(&self) -> Point {
        self.scale * self.zoom_factor
    }
}

impl Default for ProjectionSnapshot {
    fn default() -> Self {
        Self {
            zoom_factor: Point::new(1.0, 1.0),
            scale: Point::new(1.0, -1.0),
            refs: [Point::default(); 4],
            focus: Point::default(),
        }
    }
}

/// One raster surface and the snapshot used to render it
#[derive(Debug, Clone)]
pub struct BufferSlot {
    image: RgbaImage,
    snapshot: ProjectionSnapshot,
    projection: Option<Arc<Projection>>,
}

impl BufferSlot {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            snapshot: ProjectionSnapshot::default(),
            projection: None,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub fn snapshot(&self) -> &ProjectionSnapshot {
        &self.snapshot
    }

    pub fn projection(&self) -> Option<&Arc<Projection>> {
        self.projection.as_ref()
    }

    pub(crate) fn freeze(&mut self, snapshot: ProjectionSnapshot, projection: Option<Arc<Projection>>) {
        self.snapshot = snapshot;
        self.projection = projection;
    }

    /// Fills the raster with transparent pixels
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Replaces the raster with a transparent one of the given size
    pub fn reallocate(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    /// Geographic radians to pixels of this buffer
    pub fn rad_to_px(&self, p: Point) -> Point {
        let Some(proj) = &self.projection else {
            return p;
        };
        let origin = proj.rad_to_m(self.snapshot.refs[0]);
        (proj.rad_to_m(p) - origin) / self.snapshot.buffer_scale()
    }

    pub fn rad_to_px_polygon(&self, poly: &mut [Point]) {
        let Some(proj) = &self.projection else {
            return;
        };
        let origin = proj.rad_to_m(self.snapshot.refs[0]);
        let buffer_scale = self.snapshot.buffer_scale();
        proj.rad_to_m_polygon(poly);
        for p in poly.iter_mut() {
            *p = (*p - origin) / buffer_scale;
        }
    }

    /// Pixels of this buffer to geographic radians
    pub fn px_to_rad(&self, p: Point) -> Point {
        let Some(proj) = &self.projection else {
            return p;
        };
        let origin = proj.rad_to_m(self.snapshot.refs[0]);
        proj.m_to_rad(origin + p * self.snapshot.buffer_scale())
    }
}

/// The front/back pair.
///
/// Each slot has its own lock so the render worker can paint into the
/// inactive slot while the UI blits the active one.
#[derive(Debug)]
pub struct DoubleBuffer {
    slots: [Mutex<BufferSlot>; 2],
}

impl DoubleBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            slots: [
                Mutex::new(BufferSlot::new(width, height)),
                Mutex::new(BufferSlot::new(width, height)),
            ],
        }
    }

    pub fn slot(&self, index: usize) -> MutexGuard<'_, BufferSlot> {
        self.slots[index & 1]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn reallocate(&self, width: u32, height: u32) {
        for index in 0..2 {
            self.slot(index).reallocate(width, height);
        }
    }
}
