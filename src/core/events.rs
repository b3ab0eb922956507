use crate::core::geo::Point;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::sync::Mutex;

/// Bit mask naming which parts of the canvas need a redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedrawFlags(u32);

impl RedrawFlags {
    pub const NONE: Self = Self(0);
    pub const MAP: Self = Self(0x01);
    pub const DEM: Self = Self(0x02);
    pub const GIS: Self = Self(0x04);
    pub const MOUSE: Self = Self(0x08);
    pub const ALL: Self = Self(0xFFFF_FFFF);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if any bit is set in both masks
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for RedrawFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RedrawFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for RedrawFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Notifications emitted by a draw context
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawContextEvent {
    /// The context wants a new buffer
    NeedsRedraw,
    /// Effective meters per pixel changed (base scale times zoom factor)
    ScaleChanged(Point),
    /// A render finished and the canvas should repaint
    Repaint,
    /// Asks the canvas to redraw the given layers
    CanvasUpdate(RedrawFlags),
    /// The render worker was started
    StartThread,
    /// The render worker finished and swapped buffers
    StopThread,
}

/// Per-context subscriber list.
///
/// Each subscriber owns an unbounded receiver, so emitting never blocks the
/// emitting thread. Subscribers that dropped their receiver are pruned on the
/// next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<DrawContextEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<DrawContextEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    pub fn emit(&self, event: DrawContextEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_intersection() {
        let mask = RedrawFlags::MAP | RedrawFlags::DEM;
        assert!(mask.intersects(RedrawFlags::MAP));
        assert!(!mask.intersects(RedrawFlags::GIS));
        assert!(RedrawFlags::ALL.intersects(RedrawFlags::MOUSE));
        assert!(!RedrawFlags::NONE.intersects(RedrawFlags::ALL));
        assert_eq!((mask & RedrawFlags::DEM), RedrawFlags::DEM);
    }

    #[test]
    fn test_bus_delivers_to_all_subscribers() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.emit(DrawContextEvent::NeedsRedraw);

        assert_eq!(a.try_recv(), Ok(DrawContextEvent::NeedsRedraw));
        assert_eq!(b.try_recv(), Ok(DrawContextEvent::NeedsRedraw));
    }

    #[test]
    fn test_bus_prunes_dropped_subscribers() {
        let bus = EventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(DrawContextEvent::StopThread);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.try_recv(), Ok(DrawContextEvent::StopThread));
    }
}
