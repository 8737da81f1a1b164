//! Validation and recovery for handles read from outside the engine.
//!
//! Adapters never trust a tile or slot reference they picked up from an event:
//! the element may have been replaced by a relocation that ran in between.
//! Handles are re-resolved by identity here, and a tile whose representation
//! has gone missing is rebuilt through [`Engine::return_to_pool`].

use log::{error, warn};

use super::engine::Engine;
use super::surface::Surface;
use super::{SlotId, TileId};
use crate::error::{PlacementError, PlacementResult};

/// Tile reference as read from the outside world, possibly incomplete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileHandle {
    pub letter: Option<char>,
    pub index: Option<usize>,
}

impl TileHandle {
    /// Parse `data-letter` / `data-tile-index` style attribute values.
    pub fn from_attrs(letter: Option<&str>, index: Option<&str>) -> Self {
        let mut chars = letter.map(str::trim).unwrap_or_default().chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c.to_ascii_uppercase()),
            _ => None,
        };
        Self {
            letter,
            index: index.and_then(|s| s.trim().parse().ok()),
        }
    }
}

impl From<TileId> for TileHandle {
    fn from(id: TileId) -> Self {
        Self {
            letter: Some(id.letter),
            index: Some(id.index),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotHandle {
    pub word: Option<usize>,
    pub slot: Option<usize>,
}

impl SlotHandle {
    /// Parse `data-word-index` / `data-slot-index` attribute values.
    pub fn from_attrs(word: Option<&str>, slot: Option<&str>) -> Self {
        Self {
            word: word.and_then(|s| s.trim().parse().ok()),
            slot: slot.and_then(|s| s.trim().parse().ok()),
        }
    }
}

impl From<SlotId> for SlotHandle {
    fn from(id: SlotId) -> Self {
        Self {
            word: Some(id.word),
            slot: Some(id.slot),
        }
    }
}

fn missing(what: &'static str) -> PlacementError {
    // Every rendered tile and slot carries its identity; reaching this means
    // something upstream built an entity without it.
    error!("entity handle without {what}; dropping the operation");
    PlacementError::MissingIdentity(what)
}

/// Resolve a tile handle to a live tile, rebuilding it if its
/// representation was lost.
pub fn resolve_tile<S: Surface>(
    engine: &mut Engine<S>,
    handle: TileHandle,
) -> PlacementResult<TileId> {
    let letter = handle.letter.ok_or_else(|| missing("letter"))?;
    let index = handle.index.ok_or_else(|| missing("tile index"))?;
    let id = TileId::new(letter.to_ascii_uppercase(), index);
    if !engine.board().contains_tile(id) {
        return Err(PlacementError::UnknownTile { letter, index });
    }
    if !engine.surface().is_live(id) {
        warn!("stale handle for {id}, reconstructing");
        engine.return_to_pool(id.letter, id.index)?;
    }
    Ok(id)
}

pub fn resolve_slot<S: Surface>(engine: &Engine<S>, handle: SlotHandle) -> PlacementResult<SlotId> {
    let word = handle.word.ok_or_else(|| missing("word index"))?;
    let slot = handle.slot.ok_or_else(|| missing("slot index"))?;
    let id = SlotId::new(word, slot);
    engine
        .board()
        .slot(id)
        .map(|s| s.id())
        .ok_or(PlacementError::UnknownSlot(id))
}

/// Rebuild every tile that has no live representation. Returns the tiles
/// that needed it.
pub fn audit<S: Surface>(engine: &mut Engine<S>) -> Vec<TileId> {
    let lost: Vec<TileId> = engine
        .board()
        .tiles()
        .iter()
        .map(|t| t.id())
        .filter(|id| !engine.surface().is_live(*id))
        .collect();
    for id in &lost {
        if let Err(err) = engine.return_to_pool(id.letter, id.index) {
            warn!("could not restore {id}: {err}");
        }
    }
    lost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{Board, Location, MemorySurface, Modality};

    fn engine() -> Engine<MemorySurface> {
        let board = Board::new("SNOW", [2, 2]).unwrap();
        let surface = MemorySurface::with_pool(board.pool());
        Engine::new(board, surface)
    }

    #[test]
    fn attribute_parsing_tolerates_noise() {
        let h = TileHandle::from_attrs(Some(" s "), Some("3"));
        assert_eq!(h, TileHandle { letter: Some('S'), index: Some(3) });
        let h = TileHandle::from_attrs(Some("SN"), None);
        assert_eq!(h, TileHandle::default());
        let h = SlotHandle::from_attrs(Some("1"), Some("x"));
        assert_eq!(h, SlotHandle { word: Some(1), slot: None });
    }

    #[test]
    fn missing_identity_aborts() {
        let mut e = engine();
        let h = TileHandle { letter: Some('S'), index: None };
        assert_eq!(
            resolve_tile(&mut e, h),
            Err(PlacementError::MissingIdentity("tile index"))
        );
        assert_eq!(
            resolve_slot(&e, SlotHandle { word: None, slot: Some(0) }),
            Err(PlacementError::MissingIdentity("word index"))
        );
    }

    #[test]
    fn unknown_identity_is_rejected() {
        let mut e = engine();
        let h = TileHandle { letter: Some('Z'), index: Some(0) };
        assert_eq!(
            resolve_tile(&mut e, h),
            Err(PlacementError::UnknownTile { letter: 'Z', index: 0 })
        );
        let h = SlotHandle::from(SlotId::new(0, 9));
        assert_eq!(
            resolve_slot(&e, h),
            Err(PlacementError::UnknownSlot(SlotId::new(0, 9)))
        );
    }

    #[test]
    fn stale_handle_is_rebuilt_before_use() {
        let mut e = engine();
        let n = TileId::new('N', 1);
        e.surface_mut().forget(n);
        assert_eq!(resolve_tile(&mut e, n.into()), Ok(n));
        assert!(e.surface().is_live(n));
        assert_eq!(e.board().location(n), Some(Location::Pool));
    }

    #[test]
    fn audit_restores_everything_lost() {
        let mut e = engine();
        let s = TileId::new('S', 0);
        let w = TileId::new('W', 3);
        e.place_tile(s, SlotId::new(1, 1), Modality::Pointer).unwrap();
        e.settle();
        e.surface_mut().forget(s);
        e.surface_mut().forget(w);
        assert_eq!(audit(&mut e), vec![s, w]);
        assert!(e.board().tiles().iter().all(|t| e.surface().is_live(t.id())));
        assert!(e.board().is_consistent());
        assert!(audit(&mut e).is_empty());
    }
}
