//! Rendering seam between the engine and whatever displays the puzzle.
//!
//! Relocations are two-phase: the engine first calls [`Surface::materialize`]
//! at the destination, commits the board, and only then calls
//! [`Surface::release`] at the source. A tile therefore always has at least
//! one representation somewhere, even if the second phase never runs.

use std::collections::{HashMap, HashSet};

use super::state::Point;
use super::{FocusTarget, Location, SlotId, TileId};

/// What a rendered slot needs to know after a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotView {
    pub filled: bool,
    pub locked: bool,
    /// The single element of {slot, occupant} that sits in the Tab order.
    pub focus: FocusTarget,
}

/// Things that can carry the `drag-over` highlight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightTarget {
    Slot(SlotId),
    Tile(TileId),
    Pool,
}

/// Opaque handle to the floating clone shown during a touch drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostHandle(pub u32);

pub trait Surface {
    /// Make `tile` visible at `to`. May leave a second copy elsewhere until
    /// the matching [`release`](Surface::release).
    fn materialize(&mut self, tile: TileId, to: Location);

    /// Drop the representation of `tile` at `from`, if one is there.
    fn release(&mut self, tile: TileId, from: Location);

    /// Whether some live representation of `tile` exists.
    fn is_live(&self, tile: TileId) -> bool;

    fn sync_slot(&mut self, slot: SlotId, view: SlotView);

    fn mark_locked(&mut self, _tile: TileId) {}

    fn set_selected(&mut self, _tile: TileId, _on: bool) {}

    fn set_dragging(&mut self, _tile: TileId, _on: bool) {}

    fn set_highlight(&mut self, _target: HighlightTarget, _on: bool) {}

    fn show_ghost(&mut self, _tile: TileId, _at: Point) -> Option<GhostHandle> {
        None
    }

    fn move_ghost(&mut self, _ghost: GhostHandle, _at: Point) {}

    fn remove_ghost(&mut self, _ghost: GhostHandle) {}
}

/// Headless surface that keeps representations in memory.
///
/// Used by host tests and by any embedding that renders from engine events
/// instead of DOM nodes. Records every tile that was ever left without a
/// representation so tests can check the clone-before-remove order.
#[derive(Debug, Default)]
pub struct MemorySurface {
    nodes: Vec<(TileId, Location)>,
    slot_views: HashMap<SlotId, SlotView>,
    locked: HashSet<TileId>,
    selected: HashSet<TileId>,
    dragging: HashSet<TileId>,
    highlights: HashSet<HighlightTarget>,
    ghost: Option<(GhostHandle, TileId, Point)>,
    next_ghost: u32,
    vanished: Vec<TileId>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one representation per pool tile, as a renderer would on mount.
    pub fn with_pool(pool: &[TileId]) -> Self {
        let mut s = Self::new();
        s.nodes = pool.iter().map(|t| (*t, Location::Pool)).collect();
        s
    }

    pub fn nodes_at(&self, at: Location) -> Vec<TileId> {
        self.nodes
            .iter()
            .filter(|(_, loc)| *loc == at)
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn node_count(&self, tile: TileId) -> usize {
        self.nodes.iter().filter(|(t, _)| *t == tile).count()
    }

    /// Simulate a representation lost behind the engine's back.
    pub fn forget(&mut self, tile: TileId) {
        self.nodes.retain(|(t, _)| *t != tile);
    }

    pub fn slot_view(&self, slot: SlotId) -> Option<SlotView> {
        self.slot_views.get(&slot).copied()
    }

    pub fn is_locked(&self, tile: TileId) -> bool {
        self.locked.contains(&tile)
    }

    pub fn is_selected(&self, tile: TileId) -> bool {
        self.selected.contains(&tile)
    }

    pub fn is_dragging(&self, tile: TileId) -> bool {
        self.dragging.contains(&tile)
    }

    pub fn is_highlighted(&self, target: HighlightTarget) -> bool {
        self.highlights.contains(&target)
    }

    pub fn ghost(&self) -> Option<(TileId, Point)> {
        self.ghost.map(|(_, t, p)| (t, p))
    }

    /// Tiles that were at some point left with no representation at all.
    pub fn vanished(&self) -> &[TileId] {
        &self.vanished
    }
}

impl Surface for MemorySurface {
    fn materialize(&mut self, tile: TileId, to: Location) {
        self.nodes.push((tile, to));
    }

    fn release(&mut self, tile: TileId, from: Location) {
        if let Some(pos) = self.nodes.iter().position(|n| *n == (tile, from)) {
            self.nodes.remove(pos);
            if !self.is_live(tile) {
                self.vanished.push(tile);
            }
        }
    }

    fn is_live(&self, tile: TileId) -> bool {
        self.nodes.iter().any(|(t, _)| *t == tile)
    }

    fn sync_slot(&mut self, slot: SlotId, view: SlotView) {
        self.slot_views.insert(slot, view);
    }

    fn mark_locked(&mut self, tile: TileId) {
        self.locked.insert(tile);
    }

    fn set_selected(&mut self, tile: TileId, on: bool) {
        if on {
            self.selected.insert(tile);
        } else {
            self.selected.remove(&tile);
        }
    }

    fn set_dragging(&mut self, tile: TileId, on: bool) {
        if on {
            self.dragging.insert(tile);
        } else {
            self.dragging.remove(&tile);
        }
    }

    fn set_highlight(&mut self, target: HighlightTarget, on: bool) {
        if on {
            self.highlights.insert(target);
        } else {
            self.highlights.remove(&target);
        }
    }

    fn show_ghost(&mut self, tile: TileId, at: Point) -> Option<GhostHandle> {
        self.next_ghost += 1;
        let handle = GhostHandle(self.next_ghost);
        self.ghost = Some((handle, tile, at));
        Some(handle)
    }

    fn move_ghost(&mut self, ghost: GhostHandle, at: Point) {
        if let Some((h, _, p)) = self.ghost.as_mut() {
            if *h == ghost {
                *p = at;
            }
        }
    }

    fn remove_ghost(&mut self, ghost: GhostHandle) {
        if self.ghost.is_some_and(|(h, _, _)| h == ghost) {
            self.ghost = None;
        }
    }
}
