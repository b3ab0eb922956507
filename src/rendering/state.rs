//! State shared between the UI thread and the render worker.
//!
//! Everything the two threads both touch lives in [`ViewState`] behind one
//! mutex. The conversions on `ViewState` therefore always see a consistent
//! focus, zoom and projection.

use crate::core::constants::BUFFER_BORDER;
use crate::core::events::{DrawContextEvent, EventBus, RedrawFlags};
use crate::core::geo::{Point, Size};
use crate::core::scales::ScaleTable;
use crate::projection::Projection;
use crate::rendering::buffer::{DoubleBuffer, ProjectionSnapshot};
use crate::rendering::painter::TilePainter;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

#[derive(Debug)]
pub(crate) struct ViewState {
    pub last_size: Option<Size>,
    pub view_width: i32,
    pub view_height: i32,
    pub buf_width: i32,
    pub buf_height: i32,
    /// Middle of the view in pixels
    pub center: Point,
    pub table: ScaleTable,
    pub zoom_index: usize,
    pub zoom_factor: Point,
    pub scale: Point,
    pub focus: Point,
    /// Buffer corners in radians: top-left, top-right, bottom-right, bottom-left
    pub refs: [Point; 4],
    pub projection_src: String,
    pub projection: Option<Arc<Projection>>,
    pub needs_redraw: bool,
    pub running: bool,
    pub closing: bool,
    /// Index of the slot the UI displays
    pub buf_index: usize,
    pub render_count: u64,
}

impl ViewState {
    pub fn new(table: ScaleTable, scale: Point) -> Self {
        Self {
            last_size: None,
            view_width: 0,
            view_height: 0,
            buf_width: 2 * BUFFER_BORDER,
            buf_height: 2 * BUFFER_BORDER,
            center: Point::default(),
            table,
            zoom_index: 0,
            zoom_factor: Point::new(1.0, 1.0),
            scale,
            focus: Point::default(),
            refs: [Point::default(); 4],
            projection_src: String::new(),
            projection: None,
            needs_redraw: false,
            running: false,
            closing: false,
            buf_index: 0,
            render_count: 0,
        }
    }

    /// Meters per pixel at the current zoom, signed per axis
    pub fn buffer_scale(&self) -> Point {
        self.scale * self.zoom_factor
    }

    pub fn snapshot(&self) -> ProjectionSnapshot {
        ProjectionSnapshot {
            zoom_factor: self.zoom_factor,
            scale: self.scale,
            refs: self.refs,
            focus: self.focus,
        }
    }

    pub fn rad_to_m(&self, p: Point) -> Point {
        match &self.projection {
            Some(proj) => proj.rad_to_m(p),
            None => p,
        }
    }

    pub fn m_to_rad(&self, p: Point) -> Point {
        match &self.projection {
            Some(proj) => proj.m_to_rad(p),
            None => p,
        }
    }

    pub fn px_to_rad(&self, p: Point) -> Point {
        if self.projection.is_none() {
            return p;
        }
        let f = self.rad_to_m(self.focus);
        self.m_to_rad(f + (p - self.center) * self.buffer_scale())
    }

    pub fn rad_to_px(&self, p: Point) -> Point {
        if self.projection.is_none() {
            return p;
        }
        let f = self.rad_to_m(self.focus);
        (self.rad_to_m(p) - f) / self.buffer_scale() + self.center
    }

    pub fn rad_to_px_polygon(&self, poly: &mut [Point]) {
        let Some(proj) = &self.projection else {
            return;
        };
        let f = proj.rad_to_m(self.focus);
        let buffer_scale = self.buffer_scale();
        proj.rad_to_m_polygon(poly);
        for p in poly.iter_mut() {
            *p = (*p - f) / buffer_scale + self.center;
        }
    }
}

pub(crate) struct Shared {
    pub name: String,
    pub redraw_mask: RedrawFlags,
    pub state: Mutex<ViewState>,
    /// Signalled whenever the worker leaves its loop
    pub idle: Condvar,
    pub buffers: DoubleBuffer,
    pub events: EventBus,
    pub painter: Arc<dyn TilePainter>,
}

impl Shared {
    pub fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Flags a pending redraw from any thread
    pub fn request_redraw(&self) {
        let mut state = self.lock_state();
        state.needs_redraw = true;
        self.events.emit(DrawContextEvent::NeedsRedraw);
    }
}
