//! Interaction state for one mounted puzzle.
//!
//! One of these lives inside each [`Engine`](super::Engine); puzzles mounted
//! side by side never share it.

use super::TileId;
use super::pointer::DropTarget;
use super::surface::{GhostHandle, HighlightTarget};

/// Viewport coordinate in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Idle,
    /// Finger down on a tile but still inside the drag threshold.
    PendingDrag,
    Dragging,
}

/// Sub-state of a touch gesture that started on a tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchDrag {
    pub tile: TileId,
    pub origin: Point,
    pub current: Point,
    pub dragging: bool,
    pub ghost: Option<GhostHandle>,
    /// Target currently under the finger.
    pub hover: Option<DropTarget>,
}

/// Last single activation, kept for double-activation detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ActivationRecord {
    pub tile: TileId,
    pub at_ms: f64,
}

#[derive(Debug, Default)]
pub struct InteractionState {
    pub(crate) dragged: Option<TileId>,
    pub(crate) selected: Option<TileId>,
    pub(crate) processing: bool,
    pub(crate) touch: Option<TouchDrag>,
    pub(crate) last_activation: Option<ActivationRecord>,
    pub(crate) pointer_hover: Option<DropTarget>,
    /// Surface elements currently showing `drag-over`.
    pub(crate) highlighted: Vec<HighlightTarget>,
    /// Document-level touch listeners are attached by the host.
    pub(crate) document_capture: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragged(&self) -> Option<TileId> {
        self.dragged
    }

    pub fn selected(&self) -> Option<TileId> {
        self.selected
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn touch(&self) -> Option<&TouchDrag> {
        self.touch.as_ref()
    }

    pub fn touch_phase(&self) -> TouchPhase {
        match &self.touch {
            None => TouchPhase::Idle,
            Some(t) if t.dragging => TouchPhase::Dragging,
            Some(_) => TouchPhase::PendingDrag,
        }
    }

    pub fn document_capture(&self) -> bool {
        self.document_capture
    }
}
