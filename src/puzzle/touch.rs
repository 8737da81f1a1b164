//! Touch adapter: synthesises a drag from raw touch events.
//!
//! `Idle → PendingDrag → Dragging → Idle`. A touch that never travels the
//! drag threshold is a tap and goes through the shared activation logic. Hit
//! testing (`elementFromPoint`) is the host's job; it hands the result in as
//! a [`DropTarget`].

use log::debug;

use super::engine::{Engine, Modality, Outcome};
use super::interaction::{self, Activation};
use super::pointer::{self, DropTarget};
use super::state::{Point, TouchDrag};
use super::surface::Surface;
use super::TileId;
use crate::error::PlacementResult;

/// What the host must do with the native event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchResponse {
    /// Call `preventDefault` (suppresses scrolling / the synthetic click).
    pub prevent_default: bool,
    /// `Some(true)`: attach document-level move/end/cancel listeners.
    /// `Some(false)`: detach them.
    pub capture_document: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchAction {
    Tapped(Activation),
    Dropped(Outcome),
    /// Gesture ended with nothing to do.
    Ignored,
}

pub fn touch_start<S: Surface>(
    engine: &mut Engine<S>,
    tile: TileId,
    at: Point,
) -> PlacementResult<TouchResponse> {
    engine.ensure_movable(tile)?;
    // A second finger or a lost touchend: start over from a clean state.
    let mut response = cleanup(engine);
    engine.state_mut().touch = Some(TouchDrag {
        tile,
        origin: at,
        current: at,
        dragging: false,
        ghost: None,
        hover: None,
    });
    response.prevent_default = false;
    Ok(response)
}

pub fn touch_move<S: Surface>(
    engine: &mut Engine<S>,
    at: Point,
    hit: Option<DropTarget>,
) -> TouchResponse {
    let threshold = engine.tuning().touch_threshold_px;
    let Some(touch) = engine.state_mut().touch.as_mut() else {
        return TouchResponse::default();
    };
    touch.current = at;
    let tile = touch.tile;
    let mut response = TouchResponse {
        prevent_default: true,
        capture_document: None,
    };

    if !touch.dragging {
        if touch.origin.distance(at) < threshold {
            return TouchResponse::default();
        }
        touch.dragging = true;
        let ghost = engine.surface_mut().show_ghost(tile, at);
        engine.surface_mut().set_dragging(tile, true);
        let state = engine.state_mut();
        if let Some(touch) = state.touch.as_mut() {
            touch.ghost = ghost;
        }
        if !state.document_capture {
            state.document_capture = true;
            response.capture_document = Some(true);
        }
        debug!("touch on {tile} became a drag");
    } else if let Some(ghost) = touch.ghost {
        engine.surface_mut().move_ghost(ghost, at);
    }

    let hover = hit.filter(|t| pointer::accepts(engine.board(), tile, *t));
    if let Some(touch) = engine.state_mut().touch.as_mut() {
        touch.hover = hover;
    }
    pointer::set_highlight(engine, hover);
    response
}

pub fn touch_end<S: Surface>(
    engine: &mut Engine<S>,
    at: Point,
    hit: Option<DropTarget>,
    now_ms: f64,
) -> (TouchResponse, PlacementResult<TouchAction>) {
    let Some(touch) = engine.state().touch().cloned() else {
        return (cleanup(engine), Ok(TouchAction::Ignored));
    };
    let mut response = cleanup(engine);
    response.prevent_default = true;

    if !touch.dragging {
        let result = interaction::tap(engine, touch.tile, now_ms, Modality::Touch)
            .map(TouchAction::Tapped);
        return (response, result);
    }
    let result = match hit {
        Some(target) => pointer::apply_drop(engine, touch.tile, target, Modality::Touch)
            .map(TouchAction::Dropped),
        None => {
            debug!("touch drag of {} ended over nothing at {at:?}", touch.tile);
            Ok(TouchAction::Ignored)
        }
    };
    (response, result)
}

pub fn touch_cancel<S: Surface>(engine: &mut Engine<S>) -> TouchResponse {
    cleanup(engine)
}

/// Tear the gesture down. Safe to call any number of times.
fn cleanup<S: Surface>(engine: &mut Engine<S>) -> TouchResponse {
    let mut response = TouchResponse::default();
    if let Some(touch) = engine.state_mut().touch.take() {
        if let Some(ghost) = touch.ghost {
            engine.surface_mut().remove_ghost(ghost);
        }
        if touch.dragging {
            engine.surface_mut().set_dragging(touch.tile, false);
        }
    }
    pointer::set_highlight(engine, None);
    let state = engine.state_mut();
    if state.document_capture {
        state.document_capture = false;
        response.capture_document = Some(false);
    }
    response
}
