//! The draw context: view geometry, zoom, projection and the double buffer.
//!
//! The UI thread calls [`DrawContext::draw`] every frame. `draw` blits the
//! active buffer, scaled and shifted to the current view, and starts the
//! render worker if a redraw is due. The worker fills the inactive buffer and
//! swaps the two when done.

use crate::background::worker;
use crate::core::config::DrawContextConfig;
use crate::core::constants::BUFFER_BORDER;
use crate::core::events::{DrawContextEvent, RedrawFlags};
use crate::core::geo::{GeoRect, Point, Size};
use crate::core::scales::{ScaleTable, ScalesType};
use crate::projection::Projection;
use crate::rendering::buffer::{BufferSlot, DoubleBuffer};
use crate::rendering::painter::{RedrawRequester, TilePainter};
use crate::rendering::state::{Shared, ViewState};
use crate::rendering::surface::Surface;
use crate::Result;
use crossbeam_channel::Receiver;
use std::f64::consts::PI;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

pub struct DrawContext {
    shared: Arc<Shared>,
    resize_wait: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DrawContext {
    /// Creates a context for a view of `size`.
    ///
    /// Fails only if the configuration itself is malformed. A projection in
    /// the configuration that does not parse is logged and leaves the
    /// context without a valid projection.
    pub fn new(
        config: DrawContextConfig,
        size: Size,
        painter: Arc<dyn TilePainter>,
    ) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            name: config.name.clone(),
            redraw_mask: config.redraw_mask,
            state: Mutex::new(ViewState::new(
                ScaleTable::new(config.scales),
                config.base_scale,
            )),
            idle: Condvar::new(),
            buffers: DoubleBuffer::new(0, 0),
            events: Default::default(),
            painter,
        });

        let ctx = Self {
            shared,
            resize_wait: config.resize_wait(),
            worker: Mutex::new(None),
        };

        ctx.set_scales(config.scales);
        ctx.zoom(config.initial_zoom as isize);
        ctx.resize(size);
        if let Some(projection) = &config.projection {
            if !ctx.set_projection(projection) {
                log::warn!(
                    "draw context {}: ignoring invalid projection '{}'",
                    config.name,
                    projection
                );
            }
        }
        Ok(ctx)
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.shared.lock_state()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn redraw_mask(&self) -> RedrawFlags {
        self.shared.redraw_mask
    }

    /// Subscribes to this context's notifications
    pub fn subscribe(&self) -> Receiver<DrawContextEvent> {
        self.shared.events.subscribe()
    }

    /// Asks the canvas to redraw the layers of this context
    pub fn emit_canvas_update(&self) {
        self.shared
            .events
            .emit(DrawContextEvent::CanvasUpdate(self.shared.redraw_mask));
    }

    /// Handle that flags a redraw from any thread
    pub fn redraw_requester(&self) -> RedrawRequester {
        RedrawRequester::new(Arc::downgrade(&self.shared))
    }

    pub fn request_redraw(&self) {
        self.shared.request_redraw();
    }

    /// Adapts the buffers to a new view size.
    ///
    /// Returns false if a render is in flight and does not finish within the
    /// configured wait. Nothing changes in that case and the caller should
    /// try again on a later frame.
    pub fn resize(&self, size: Size) -> bool {
        let mut state = self.state();
        if state.last_size == Some(size) {
            return true;
        }

        if state.running {
            let (guard, _) = self
                .shared
                .idle
                .wait_timeout_while(state, self.resize_wait, |s| s.running)
                .unwrap_or_else(|e| e.into_inner());
            state = guard;
            if state.running {
                log::debug!("draw context {}: resize blocked by render", self.name());
                return false;
            }
        }

        let Some((view_width, buf_width)) = bordered(size.width) else {
            log::warn!("draw context {}: view width {} too large", self.name(), size.width);
            return false;
        };
        let Some((view_height, buf_height)) = bordered(size.height) else {
            log::warn!("draw context {}: view height {} too large", self.name(), size.height);
            return false;
        };

        state.last_size = Some(size);
        state.view_width = view_width;
        state.view_height = view_height;
        state.center = Point::new(view_width as f64 / 2.0, view_height as f64 / 2.0);
        state.buf_width = buf_width;
        state.buf_height = buf_height;

        self.shared
            .buffers
            .reallocate(state.buf_width as u32, state.buf_height as u32);
        true
    }

    /// The definition string last given to [`DrawContext::set_projection`]
    pub fn get_projection(&self) -> String {
        self.state().projection_src.clone()
    }

    pub fn projection(&self) -> Option<Arc<Projection>> {
        self.state().projection.clone()
    }

    pub fn is_valid(&self) -> bool {
        self.state().projection.is_some()
    }

    /// Sets the projection, returns whether it is valid
    pub fn set_projection(&self, definition: &str) -> bool {
        let projection = match Projection::new(definition) {
            Ok(projection) => Some(Arc::new(projection)),
            Err(e) => {
                log::warn!("draw context {}: {}", self.name(), e);
                None
            }
        };
        let valid = projection.is_some();

        let mut state = self.state();
        state.projection_src = definition.to_string();
        state.projection = projection;
        valid
    }

    /// Switches the scale table.
    ///
    /// The zoom index is clamped into the new table afterwards.
    pub fn set_scales(&self, kind: ScalesType) {
        let idx = {
            let mut state = self.state();
            state.table = ScaleTable::new(kind);
            state.zoom_index
        };
        self.zoom(idx as isize);
    }

    /// Switches the scale table by its persisted code.
    ///
    /// Unknown codes are logged and the current table stays.
    pub fn set_scales_code(&self, code: i32) {
        match ScalesType::from_code(code) {
            Some(kind) => self.set_scales(kind),
            None => log::warn!(
                "draw context {}: invalid type of scales table {}, keeping {:?}",
                self.name(),
                code,
                self.scales_type()
            ),
        }
    }

    pub fn scales_type(&self) -> ScalesType {
        self.state().table.kind()
    }

    pub fn zoom_levels(&self) -> usize {
        self.state().table.len()
    }

    pub fn needs_redraw(&self) -> bool {
        self.state().needs_redraw
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    pub fn zoom_index(&self) -> usize {
        self.state().zoom_index
    }

    pub fn zoom_factor(&self) -> Point {
        self.state().zoom_factor
    }

    /// Effective meters per pixel, base scale times zoom factor
    pub fn scale(&self) -> Point {
        self.state().buffer_scale()
    }

    pub fn focus(&self) -> Point {
        self.state().focus
    }

    pub fn view_size(&self) -> (i32, i32) {
        let state = self.state();
        (state.view_width, state.view_height)
    }

    pub fn buffer_size(&self) -> (i32, i32) {
        let state = self.state();
        (state.buf_width, state.buf_height)
    }

    /// Buffer corners of the last `draw` in radians
    pub fn corner_refs(&self) -> [Point; 4] {
        self.state().refs
    }

    pub fn active_buffer_index(&self) -> usize {
        self.state().buf_index
    }

    /// Number of render passes started so far
    pub fn render_count(&self) -> u64 {
        self.state().render_count
    }

    /// Read access to the displayed buffer slot
    pub fn with_active_buffer<R>(&self, f: impl FnOnce(&BufferSlot) -> R) -> R {
        let state = self.state();
        let slot = self.shared.buffers.slot(state.buf_index);
        f(&slot)
    }

    /// Zooms to a table index, clamped into the table
    pub fn zoom(&self, idx: isize) {
        let mut state = self.state();
        let idx = state.table.clamp_index(idx);
        let factor = state.table.scales()[idx];

        if state.zoom_index != idx || state.zoom_factor.x != factor {
            state.zoom_index = idx;
            state.zoom_factor = Point::new(factor, factor);
            state.needs_redraw = true;
            self.shared.events.emit(DrawContextEvent::NeedsRedraw);
            self.shared
                .events
                .emit(DrawContextEvent::ScaleChanged(state.buffer_scale()));
        }
    }

    /// Steps one level in or out and flags a full redraw
    pub fn zoom_step(&self, zoom_in: bool, needs_redraw: &mut RedrawFlags) {
        let idx = {
            let state = self.state();
            if state.projection.is_none() {
                return;
            }
            state.zoom_index as isize
        };
        self.zoom(idx + if zoom_in { -1 } else { 1 });
        *needs_redraw = RedrawFlags::ALL;
    }

    /// Picks the most detailed level that shows all of `rect`
    pub fn zoom_rect(&self, rect: &GeoRect) {
        let (levels, point_zoom, inner) = {
            let state = self.state();
            if state.projection.is_none() {
                return;
            }
            (
                state.table.len(),
                state.table.point_zoom_index(),
                Point::new(
                    (state.buf_width - 2 * BUFFER_BORDER) as f64,
                    (state.buf_height - 2 * BUFFER_BORDER) as f64,
                ),
            )
        };

        // special case for elements with no extent
        if rect.is_degenerate() {
            self.zoom(point_zoom as isize);
            return;
        }

        // zoom out from the closest level until the rect fits
        for i in 0..levels {
            self.zoom(i as isize);

            let state = self.state();
            let pt1 = state.rad_to_px(rect.top_left);
            let pt2 = state.rad_to_px(rect.bottom_right);
            let d = pt2 - pt1;
            if d.x.abs() <= inner.x && d.y.abs() <= inner.y {
                break;
            }
        }
    }

    pub fn convert_rad_to_m(&self, p: Point) -> Point {
        self.state().rad_to_m(p)
    }

    pub fn convert_m_to_rad(&self, p: Point) -> Point {
        self.state().m_to_rad(p)
    }

    pub fn convert_px_to_rad(&self, p: Point) -> Point {
        self.state().px_to_rad(p)
    }

    pub fn convert_rad_to_px(&self, p: Point) -> Point {
        self.state().rad_to_px(p)
    }

    pub fn convert_rad_to_px_polygon(&self, poly: &mut [Point]) {
        self.state().rad_to_px_polygon(poly)
    }

    /// Draws the active buffer and schedules a redraw if `needs_redraw`
    /// hits this context's mask.
    ///
    /// `focus` is the geographic point to show in the middle of the view.
    pub fn draw(&self, surface: &mut dyn Surface, needs_redraw: RedrawFlags, focus: Point) {
        let mut state = self.state();
        if state.projection.is_none() {
            return;
        }

        state.focus = focus;
        let f1 = state.rad_to_m(focus);
        let buffer_scale = state.buffer_scale();

        // derive references for all corners of the buffer
        let hw = (state.buf_width / 2) as f64;
        let hh = (state.buf_height / 2) as f64;
        let mut refs = [
            state.m_to_rad(f1 + Point::new(-hw, -hh) * buffer_scale),
            state.m_to_rad(f1 + Point::new(hw, -hh) * buffer_scale),
            state.m_to_rad(f1 + Point::new(hw, hh) * buffer_scale),
            state.m_to_rad(f1 + Point::new(-hw, hh) * buffer_scale),
        ];
        adjust_antimeridian(&mut refs);
        state.refs = refs;

        {
            let slot = self.shared.buffers.slot(state.buf_index);
            let snapshot = slot.snapshot();

            // the buffer's top left corner in the current projection
            let reference = state.rad_to_m(snapshot.refs[0]);

            // offset relative to the view center, which is the surface origin
            let offset = (reference - f1) / snapshot.buffer_scale();
            let scale = snapshot.zoom_factor / state.zoom_factor;
            surface.blit(slot.image(), scale, offset);
        }

        let triggered = needs_redraw.intersects(self.shared.redraw_mask);
        if triggered {
            // reset by the worker
            state.needs_redraw = true;
            self.shared.events.emit(DrawContextEvent::NeedsRedraw);
        }

        if triggered && !state.running && !state.closing {
            self.start_worker(&mut state);
        }
    }

    /// Starts the worker, the caller holds the state lock
    fn start_worker(&self, state: &mut ViewState) {
        let mut handle = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = handle.take() {
            // already left its loop, only the thread exit is pending
            let _ = previous.join();
        }

        state.running = true;
        self.shared.events.emit(DrawContextEvent::StartThread);
        match worker::spawn(self.shared.clone()) {
            Ok(h) => *handle = Some(h),
            Err(e) => {
                log::error!("draw context {}: cannot start render worker: {}", self.name(), e);
                state.running = false;
                self.shared.events.emit(DrawContextEvent::StopThread);
            }
        }
    }

    /// Waits until no render is in flight. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.state();
        let (state, _) = self
            .shared
            .idle
            .wait_timeout_while(state, timeout, |s| s.running)
            .unwrap_or_else(|e| e.into_inner());
        !state.running
    }
}

/// View extent and buffer extent for one axis, if both fit an `i32`
fn bordered(extent: u32) -> Option<(i32, i32)> {
    let view = i32::try_from(extent).ok()?;
    let buffer = view.checked_add(2 * BUFFER_BORDER)?;
    Some((view, buffer))
}

/// Shifts corners by a full turn when the buffer spans the antimeridian.
///
/// With a wrapped transform the western corners come back east of the
/// eastern ones. Whichever side has the larger magnitude is the one that
/// wrapped, and that side is moved by ±360°.
fn adjust_antimeridian(refs: &mut [Point; 4]) {
    let [ref1, ref2, ref3, ref4] = refs;
    if ref1.x > ref2.x {
        if ref1.x.abs() > ref2.x.abs() {
            ref1.x += -2.0 * PI;
        }
        if ref4.x.abs() > ref3.x.abs() {
            ref4.x += -2.0 * PI;
        }

        if ref1.x.abs() < ref2.x.abs() {
            ref2.x += 2.0 * PI;
        }
        if ref4.x.abs() < ref3.x.abs() {
            ref3.x += 2.0 * PI;
        }
    }
}

impl Drop for DrawContext {
    fn drop(&mut self) {
        self.state().closing = true;
        let handle = self
            .worker
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for DrawContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("DrawContext")
            .field("name", &self.shared.name)
            .field("projection", &state.projection_src)
            .field("zoom_index", &state.zoom_index)
            .field("view", &(state.view_width, state.view_height))
            .field("running", &state.running)
            .finish()
    }
}
