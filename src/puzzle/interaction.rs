//! Click/tap semantics shared by mouse clicks, touch taps and Enter/Space.

use log::debug;

use super::engine::{Engine, Modality, Outcome};
use super::state::ActivationRecord;
use super::surface::Surface;
use super::{Location, TileId};
use crate::error::{PlacementError, PlacementResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Selected(TileId),
    Deselected(TileId),
    Moved(Outcome),
}

/// One activation of `tile`.
///
/// - activating the selected tile again deselects it;
/// - with another tile selected, activating a slotted tile places the
///   selected one there, and activating a pooled tile while the selected
///   one sits in a slot places the pooled tile into that slot;
/// - otherwise the activated tile becomes the selection.
pub fn activate<S: Surface>(
    engine: &mut Engine<S>,
    tile: TileId,
    modality: Modality,
) -> PlacementResult<Activation> {
    engine.ensure_movable(tile)?;
    let Some(selected) = engine.state().selected() else {
        engine.select(Some(tile));
        return Ok(Activation::Selected(tile));
    };
    if selected == tile {
        engine.select(None);
        return Ok(Activation::Deselected(tile));
    }
    let board = engine.board();
    match (board.location(tile), board.location(selected)) {
        (Some(Location::Slot(slot)), _) => {
            let out = engine.place_tile(selected, slot, modality)?;
            engine.select(None);
            Ok(Activation::Moved(out))
        }
        (Some(Location::Pool), Some(Location::Slot(slot))) => {
            let out = engine.place_tile(tile, slot, modality)?;
            engine.select(None);
            Ok(Activation::Moved(out))
        }
        _ => {
            engine.select(Some(tile));
            Ok(Activation::Selected(tile))
        }
    }
}

/// Double-click / double-tap shortcut: a slotted tile goes back to the pool,
/// a pooled tile goes to the first empty unlocked slot.
pub fn double_activate<S: Surface>(
    engine: &mut Engine<S>,
    tile: TileId,
    modality: Modality,
) -> PlacementResult<Outcome> {
    engine.ensure_movable(tile)?;
    let out = match engine.board().location(tile) {
        Some(Location::Slot(slot)) => engine.remove_tile(slot, modality)?,
        Some(Location::Pool) => {
            let slot = engine.board().first_empty_slot().ok_or(PlacementError::NoTarget)?;
            engine.place_tile(tile, slot, modality)?
        }
        None => {
            return Err(PlacementError::UnknownTile {
                letter: tile.letter,
                index: tile.index,
            });
        }
    };
    engine.select(None);
    engine.state_mut().last_activation = None;
    Ok(out)
}

/// Record an activation at `now_ms`; true when it completes a double
/// activation of the same tile.
pub fn register_activation<S: Surface>(engine: &mut Engine<S>, tile: TileId, now_ms: f64) -> bool {
    let window = engine.tuning().double_activation_ms;
    let state = engine.state_mut();
    let double = state
        .last_activation
        .is_some_and(|prev| prev.tile == tile && now_ms - prev.at_ms <= window);
    state.last_activation = if double {
        None
    } else {
        Some(ActivationRecord { tile, at_ms: now_ms })
    };
    double
}

/// A resolved tap: single or double activation depending on timing.
pub fn tap<S: Surface>(
    engine: &mut Engine<S>,
    tile: TileId,
    now_ms: f64,
    modality: Modality,
) -> PlacementResult<Activation> {
    if register_activation(engine, tile, now_ms) {
        debug!("double activation on {tile}");
        double_activate(engine, tile, modality).map(Activation::Moved)
    } else {
        activate(engine, tile, modality)
    }
}
