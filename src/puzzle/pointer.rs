//! Native drag-and-drop adapter.
//!
//! `dragstart` records the tile, `dragover`/`dragleave` only toggle the
//! `drag-over` highlight, and `drop` consumes the recorded tile and turns the
//! target into one engine call. Because the drop takes the dragged tile out
//! of the state, a second handler firing for the same drop finds nothing to
//! do.

use log::debug;

use super::engine::{Engine, Modality, Outcome};
use super::surface::{HighlightTarget, Surface};
use super::{Board, Location, SlotId, TileId};
use crate::error::{PlacementError, PlacementResult};

/// What a drag (or touch drag) ended over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropTarget {
    Slot(SlotId),
    /// A tile, either in a slot (swap target) or in the pool.
    Tile(TileId),
    /// The pool container itself.
    Pool,
}

pub fn drag_start<S: Surface>(engine: &mut Engine<S>, tile: TileId) -> PlacementResult<()> {
    engine.ensure_movable(tile)?;
    if let Some(prev) = engine.state_mut().dragged.replace(tile) {
        engine.surface_mut().set_dragging(prev, false);
    }
    engine.surface_mut().set_dragging(tile, true);
    Ok(())
}

/// Returns true when the target accepts the drop (the host then calls
/// `preventDefault` and sets `dropEffect = "move"`).
pub fn drag_over<S: Surface>(engine: &mut Engine<S>, target: DropTarget) -> bool {
    let Some(tile) = engine.state().dragged() else {
        return false;
    };
    let accepted = accepts(engine.board(), tile, target);
    let hover = accepted.then_some(target);
    engine.state_mut().pointer_hover = hover;
    set_highlight(engine, hover);
    accepted
}

pub fn drag_leave<S: Surface>(engine: &mut Engine<S>, target: DropTarget) {
    if engine.state().pointer_hover == Some(target) {
        engine.state_mut().pointer_hover = None;
        set_highlight(engine, None);
    }
}

pub fn drop<S: Surface>(engine: &mut Engine<S>, target: DropTarget) -> PlacementResult<Outcome> {
    let tile = engine
        .state_mut()
        .dragged
        .take()
        .ok_or(PlacementError::NoTarget)?;
    engine.state_mut().pointer_hover = None;
    set_highlight(engine, None);
    engine.surface_mut().set_dragging(tile, false);
    apply_drop(engine, tile, target, Modality::Pointer)
}

/// `dragend` fires after `drop` and also when the drag is abandoned.
pub fn drag_end<S: Surface>(engine: &mut Engine<S>) {
    if let Some(tile) = engine.state_mut().dragged.take() {
        engine.surface_mut().set_dragging(tile, false);
    }
    engine.state_mut().pointer_hover = None;
    set_highlight(engine, None);
}

pub(crate) fn accepts(board: &Board, dragged: TileId, target: DropTarget) -> bool {
    match target {
        DropTarget::Slot(slot) => board.slot(slot).is_some_and(|s| {
            !s.locked() && s.occupant().is_none_or(|t| board.is_tile_movable(t))
        }),
        // Pool onto pool would be a no-op; one side has to be slotted.
        DropTarget::Tile(tile) => {
            let slotted = |t: TileId| matches!(board.location(t), Some(Location::Slot(_)));
            tile != dragged && board.is_tile_movable(tile) && (slotted(tile) || slotted(dragged))
        }
        DropTarget::Pool => matches!(board.location(dragged), Some(Location::Slot(_))),
    }
}

fn lit_targets(board: &Board, target: DropTarget) -> Vec<HighlightTarget> {
    match target {
        DropTarget::Slot(slot) => {
            let mut lit = vec![HighlightTarget::Slot(slot)];
            lit.extend(board.occupant(slot).map(HighlightTarget::Tile));
            lit
        }
        DropTarget::Tile(tile) => {
            let mut lit = vec![HighlightTarget::Tile(tile)];
            if let Some(Location::Slot(slot)) = board.location(tile) {
                lit.push(HighlightTarget::Slot(slot));
            }
            lit
        }
        DropTarget::Pool => vec![HighlightTarget::Pool],
    }
}

/// Move the `drag-over` highlight to `target` (or clear it).
pub(crate) fn set_highlight<S: Surface>(engine: &mut Engine<S>, target: Option<DropTarget>) {
    let next = target.map_or_else(Vec::new, |t| lit_targets(engine.board(), t));
    let prev = std::mem::take(&mut engine.state_mut().highlighted);
    for h in prev.iter().filter(|h| !next.contains(h)) {
        engine.surface_mut().set_highlight(*h, false);
    }
    for h in next.iter().filter(|h| !prev.contains(h)) {
        engine.surface_mut().set_highlight(*h, true);
    }
    engine.state_mut().highlighted = next;
}

/// Turn a finished drag of `tile` over `target` into an engine call.
pub(crate) fn apply_drop<S: Surface>(
    engine: &mut Engine<S>,
    tile: TileId,
    target: DropTarget,
    modality: Modality,
) -> PlacementResult<Outcome> {
    let from = engine.board().location(tile);
    let result = match target {
        DropTarget::Slot(slot) => engine.place_tile(tile, slot, modality),
        DropTarget::Tile(other) if other == tile => Ok(Outcome::Unchanged),
        DropTarget::Tile(other) => match engine.board().location(other) {
            Some(Location::Slot(slot)) => engine.place_tile(tile, slot, modality),
            Some(Location::Pool) => to_pool(engine, from, modality),
            None => Err(PlacementError::UnknownTile {
                letter: other.letter,
                index: other.index,
            }),
        },
        DropTarget::Pool => to_pool(engine, from, modality),
    };
    if let Err(err) = &result {
        debug!("drop of {tile} on {target:?} ignored: {err}");
    }
    result
}

fn to_pool<S: Surface>(
    engine: &mut Engine<S>,
    from: Option<Location>,
    modality: Modality,
) -> PlacementResult<Outcome> {
    match from {
        Some(Location::Slot(slot)) => engine.remove_tile(slot, modality),
        _ => Ok(Outcome::Unchanged),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::MemorySurface;

    fn engine() -> Engine<MemorySurface> {
        let board = Board::new("SNOWFLAKE", [4, 5]).unwrap();
        let surface = MemorySurface::with_pool(board.pool());
        Engine::new(board, surface)
    }

    fn t(e: &Engine<MemorySurface>, i: usize) -> TileId {
        e.board().tiles()[i].id()
    }

    fn drag(e: &mut Engine<MemorySurface>, tile: TileId, target: DropTarget) -> PlacementResult<Outcome> {
        drag_start(e, tile)?;
        drag_over(e, target);
        let out = drop(e, target);
        drag_end(e);
        e.settle();
        out
    }

    #[test]
    fn drag_start_rejects_locked_tiles() {
        let mut e = engine();
        e.reveal(SlotId::new(0, 0), 'S').unwrap();
        e.settle();
        let s = t(&e, 0);
        assert_eq!(drag_start(&mut e, s), Err(PlacementError::LockedTile(s)));
        assert_eq!(e.state().dragged(), None);
    }

    #[test]
    fn drag_over_highlights_slot_and_occupant_without_mutation() {
        let mut e = engine();
        let (s, n) = (t(&e, 0), t(&e, 1));
        let slot = SlotId::new(0, 0);
        drag(&mut e, n, DropTarget::Slot(slot)).unwrap();
        drag_start(&mut e, s).unwrap();
        assert!(e.surface().is_dragging(s));
        assert!(drag_over(&mut e, DropTarget::Slot(slot)));
        assert!(e.surface().is_highlighted(HighlightTarget::Slot(slot)));
        assert!(e.surface().is_highlighted(HighlightTarget::Tile(n)));
        assert_eq!(e.board().occupant(slot), Some(n));
        drag_leave(&mut e, DropTarget::Slot(slot));
        assert!(!e.surface().is_highlighted(HighlightTarget::Slot(slot)));
        assert!(!e.surface().is_highlighted(HighlightTarget::Tile(n)));
    }

    #[test]
    fn leaving_a_different_target_keeps_highlight() {
        let mut e = engine();
        let s = t(&e, 0);
        let slot = SlotId::new(1, 0);
        drag_start(&mut e, s).unwrap();
        drag_over(&mut e, DropTarget::Slot(slot));
        drag_leave(&mut e, DropTarget::Pool);
        assert!(e.surface().is_highlighted(HighlightTarget::Slot(slot)));
    }

    #[test]
    fn drop_on_occupant_tile_swaps() {
        let mut e = engine();
        let (s, f) = (t(&e, 0), t(&e, 4));
        let slot = SlotId::new(0, 0);
        drag(&mut e, s, DropTarget::Slot(slot)).unwrap();
        let out = drag(&mut e, f, DropTarget::Tile(s)).unwrap();
        assert!(matches!(out, Outcome::Swapped { placed, displaced, .. } if placed == f && displaced == s));
        assert_eq!(e.board().occupant(slot), Some(f));
        assert_eq!(e.board().pool().last(), Some(&s));
    }

    #[test]
    fn second_drop_handler_is_a_no_op() {
        let mut e = engine();
        let s = t(&e, 0);
        let slot = SlotId::new(0, 2);
        drag_start(&mut e, s).unwrap();
        assert!(drop(&mut e, DropTarget::Slot(slot)).is_ok());
        assert_eq!(drop(&mut e, DropTarget::Slot(slot)), Err(PlacementError::NoTarget));
        assert_eq!(e.surface().node_count(s), 1);
    }

    #[test]
    fn dropping_slotted_tile_on_pool_removes_it() {
        let mut e = engine();
        let k = t(&e, 7);
        let slot = SlotId::new(1, 3);
        drag(&mut e, k, DropTarget::Slot(slot)).unwrap();
        assert_eq!(drag(&mut e, k, DropTarget::Pool), Ok(Outcome::Removed { tile: k, slot }));
        drag(&mut e, k, DropTarget::Slot(slot)).unwrap();
        let a = t(&e, 6);
        assert_eq!(drag(&mut e, k, DropTarget::Tile(a)), Ok(Outcome::Removed { tile: k, slot }));
        assert_eq!(drag(&mut e, k, DropTarget::Pool), Ok(Outcome::Unchanged));
    }

    #[test]
    fn drop_on_locked_slot_is_rejected_and_clears_drag() {
        let mut e = engine();
        e.lock_slot(SlotId::new(0, 1)).unwrap();
        let o = t(&e, 2);
        drag_start(&mut e, o).unwrap();
        assert!(!drag_over(&mut e, DropTarget::Slot(SlotId::new(0, 1))));
        assert_eq!(
            drop(&mut e, DropTarget::Slot(SlotId::new(0, 1))),
            Err(PlacementError::LockedSlot(SlotId::new(0, 1)))
        );
        assert!(!e.surface().is_dragging(o));
        assert!(e.board().pool().contains(&o));
    }

    #[test]
    fn pool_tile_over_pool_tile_is_refused() {
        let mut e = engine();
        let (s, n) = (t(&e, 0), t(&e, 1));
        drag_start(&mut e, s).unwrap();
        assert!(!drag_over(&mut e, DropTarget::Tile(n)));
        assert!(!e.surface().is_highlighted(HighlightTarget::Tile(n)));
        drag_end(&mut e);
    }

    #[test]
    fn tile_held_by_locked_slot_cannot_be_dragged_or_swapped() {
        let mut e = engine();
        let (s, n) = (t(&e, 0), t(&e, 1));
        let slot = SlotId::new(0, 0);
        drag(&mut e, s, DropTarget::Slot(slot)).unwrap();
        e.lock_slot(slot).unwrap();
        assert_eq!(drag_start(&mut e, s), Err(PlacementError::LockedSlot(slot)));
        drag_start(&mut e, n).unwrap();
        assert!(!drag_over(&mut e, DropTarget::Tile(s)));
        assert_eq!(drop(&mut e, DropTarget::Tile(s)), Err(PlacementError::LockedSlot(slot)));
        assert_eq!(e.board().occupant(slot), Some(s));
    }
}
