//! The render worker of a draw context.
//!
//! A worker is started on demand when a redraw is requested and nothing is
//! rendering. It renders into the inactive slot until no further redraw is
//! pending, then swaps the slots and exits. Only the snapshot copy and the
//! flag checks happen under the context lock; clearing and painting the
//! raster run unlocked so the UI thread is never blocked by a slow painter.

use crate::core::events::DrawContextEvent;
use crate::rendering::painter::{RedrawRequester, RenderTarget};
use crate::rendering::state::Shared;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Spawns a worker thread for `shared`.
///
/// The caller must have set `running` under the context lock before.
pub(crate) fn spawn(shared: Arc<Shared>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{}-render", shared.name))
        .spawn(move || run(&shared))
}

/// The worker loop
pub(crate) fn run(shared: &Arc<Shared>) {
    let started = Instant::now();
    let requester = RedrawRequester::new(Arc::downgrade(shared));
    let mut passes = 0u32;

    let mut state = shared.lock_state();
    log::debug!("start render worker {}", shared.name);

    // the displayed slot does not change while this worker runs
    let target = 1 - state.buf_index;

    while state.needs_redraw && !state.closing {
        // copy all projection information the painter needs
        shared
            .buffers
            .slot(target)
            .freeze(state.snapshot(), state.projection.clone());
        state.needs_redraw = false;
        state.render_count += 1;
        let pass = state.render_count;
        drop(state);

        {
            let mut slot = shared.buffers.slot(target);
            slot.clear();
            let mut render_target = RenderTarget::new(&mut slot, requester.clone(), pass);
            shared.painter.paint(&mut render_target);
        }
        passes += 1;

        state = shared.lock_state();
    }

    state.buf_index = target;
    state.running = false;
    shared.idle.notify_all();
    shared.events.emit(DrawContextEvent::Repaint);
    shared.events.emit(DrawContextEvent::StopThread);
    drop(state);

    log::debug!(
        "stop render worker {} after {} pass(es) in {} ms",
        shared.name,
        passes,
        started.elapsed().as_millis()
    );
}
