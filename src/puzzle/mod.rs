//! Tile placement core: entity model, interaction state, placement engine and
//! the three modality adapters that feed it.
//!
//! Nothing in this module touches the browser. Rendering goes through the
//! [`Surface`] trait so the same engine drives the DOM in production and a
//! [`MemorySurface`] in host tests.
//!
//! Entities:
//! - [`TileId`]: a letter plus its original index, fixed for the puzzle's life.
//! - [`SlotId`]: a position inside word 0 or word 1.
//! - [`Location`]: where a tile currently is. Derived from pool and slot
//!   occupancy, never stored on the tile itself.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::config::PuzzleConfig;
use crate::error::PuzzleError;

pub mod engine;
pub mod interaction;
pub mod keyboard;
pub mod pointer;
pub mod recovery;
pub mod state;
pub mod surface;
pub mod touch;

pub use engine::{Engine, Modality, Outcome, PuzzleEvent, SettleTask};
pub use state::{InteractionState, Point, TouchDrag, TouchPhase};
pub use surface::{HighlightTarget, MemorySurface, SlotView, Surface};

/// Number of target words in a puzzle.
pub const WORD_COUNT: usize = 2;

/// Identity of a tile: its letter and its index in the original letter list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TileId {
    pub letter: char,
    pub index: usize,
}

impl TileId {
    pub const fn new(letter: char, index: usize) -> Self {
        Self { letter, index }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.letter, self.index)
    }
}

/// Identity of a slot: which word, and the position within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SlotId {
    pub word: usize,
    pub slot: usize,
}

impl SlotId {
    pub const fn new(word: usize, slot: usize) -> Self {
        Self { word, slot }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.word, self.slot)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Location {
    Pool,
    Slot(SlotId),
}

/// An element that can hold keyboard focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    Tile(TileId),
    Slot(SlotId),
    HintButton,
    SubmitButton,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    id: TileId,
    locked: bool,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn locked(&self) -> bool {
        self.locked
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    id: SlotId,
    locked: bool,
    occupant: Option<TileId>,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub fn occupant(&self) -> Option<TileId> {
        self.occupant
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Snapshot of which letters sit in which slots.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FillState {
    pub words: [Vec<Option<char>>; WORD_COUNT],
}

impl FillState {
    pub fn is_complete(&self) -> bool {
        self.words.iter().flatten().all(Option::is_some)
    }
}

/// Tiles, pool and slots of one puzzle instance.
///
/// The board is the single source of truth for occupancy. Only the engine
/// mutates it; everything else reads through the query methods.
#[derive(Clone, Debug)]
pub struct Board {
    tiles: Vec<Tile>,          // indexed by original index
    pool: Vec<TileId>,         // ordered for Tab / arrow navigation
    words: [Vec<Slot>; WORD_COUNT],
}

impl Board {
    /// Build a board with every tile in the pool, in letter order.
    pub fn new(letters: &str, word_lengths: [usize; WORD_COUNT]) -> Result<Self, PuzzleError> {
        let mut tiles = Vec::with_capacity(letters.len());
        for (index, c) in letters.chars().enumerate() {
            if !c.is_ascii_alphabetic() {
                return Err(PuzzleError::InvalidLetter(c));
            }
            tiles.push(Tile {
                id: TileId::new(c.to_ascii_uppercase(), index),
                locked: false,
            });
        }
        for (word, len) in word_lengths.iter().enumerate() {
            if *len == 0 {
                return Err(PuzzleError::EmptyWord(word));
            }
        }
        let slots: usize = word_lengths.iter().sum();
        if tiles.len() != slots {
            return Err(PuzzleError::LetterCount {
                letters: tiles.len(),
                slots,
            });
        }
        let words = [0, 1].map(|word| {
            (0..word_lengths[word])
                .map(|slot| Slot {
                    id: SlotId::new(word, slot),
                    locked: false,
                    occupant: None,
                })
                .collect::<Vec<_>>()
        });
        let pool = tiles.iter().map(|t| t.id).collect();
        Ok(Self { tiles, pool, words })
    }

    pub fn from_config(cfg: &PuzzleConfig) -> Result<Self, PuzzleError> {
        Self::new(&cfg.letters, cfg.word_lengths)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Look a tile up by full identity; a letter mismatch counts as unknown.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.index).filter(|t| t.id == id)
    }

    pub fn tile_by_index(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn contains_tile(&self, id: TileId) -> bool {
        self.tile(id).is_some()
    }

    pub fn is_tile_locked(&self, id: TileId) -> bool {
        self.tile(id).is_some_and(Tile::locked)
    }

    /// The locked slot currently holding `id`, if any.
    pub fn locked_holder(&self, id: TileId) -> Option<SlotId> {
        self.slots()
            .find(|s| s.locked && s.occupant == Some(id))
            .map(Slot::id)
    }

    /// A known tile that is neither locked itself nor held by a locked slot.
    pub fn is_tile_movable(&self, id: TileId) -> bool {
        self.contains_tile(id) && !self.is_tile_locked(id) && self.locked_holder(id).is_none()
    }

    pub fn word_len(&self, word: usize) -> usize {
        self.words.get(word).map_or(0, Vec::len)
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.words.get(id.word)?.get(id.slot)
    }

    fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.words.get_mut(id.word)?.get_mut(id.slot)
    }

    /// All slots in reading order: word 0 first, low index first.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.words.iter().flatten()
    }

    pub fn word_slots(&self, word: usize) -> &[Slot] {
        self.words.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pool(&self) -> &[TileId] {
        &self.pool
    }

    pub fn occupant(&self, slot: SlotId) -> Option<TileId> {
        self.slot(slot).and_then(Slot::occupant)
    }

    pub fn location(&self, tile: TileId) -> Option<Location> {
        if !self.contains_tile(tile) {
            return None;
        }
        if self.pool.contains(&tile) {
            return Some(Location::Pool);
        }
        self.slots()
            .find(|s| s.occupant == Some(tile))
            .map(|s| Location::Slot(s.id))
    }

    /// First empty, unlocked slot in reading order.
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.slots()
            .find(|s| s.is_empty() && !s.locked)
            .map(Slot::id)
    }

    /// Next unlocked slot after `slot` in reading order, without wrapping.
    pub fn next_open_slot(&self, slot: SlotId) -> Option<SlotId> {
        self.slots()
            .skip_while(|s| s.id != slot)
            .skip(1)
            .find(|s| !s.locked)
            .map(Slot::id)
    }

    /// Letters of one word with `_` for empty slots.
    pub fn word_text(&self, word: usize) -> String {
        self.word_slots(word)
            .iter()
            .map(|s| s.occupant.map_or('_', |t| t.letter))
            .collect()
    }

    pub fn fill_state(&self) -> FillState {
        FillState {
            words: [0, 1].map(|w| {
                self.word_slots(w)
                    .iter()
                    .map(|s| s.occupant.map(|t| t.letter))
                    .collect()
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.slots().all(|s| s.occupant.is_some())
    }

    /// Which element owns keyboard focus for a slot.
    ///
    /// An empty or locked slot is focusable itself; a slot holding an unlocked
    /// tile hands focus to that tile so the two never nest in the Tab order.
    pub fn focus_owner(&self, slot: SlotId) -> FocusTarget {
        match self.slot(slot) {
            Some(s) if !s.locked => match s.occupant {
                Some(t) if !self.is_tile_locked(t) => FocusTarget::Tile(t),
                _ => FocusTarget::Slot(slot),
            },
            _ => FocusTarget::Slot(slot),
        }
    }

    /// Flat Tab order: pool tiles, slot owners in reading order, then buttons.
    pub fn tab_sequence(&self, hint_enabled: bool) -> Vec<FocusTarget> {
        let mut seq: Vec<FocusTarget> = self.pool.iter().map(|t| FocusTarget::Tile(*t)).collect();
        seq.extend(self.slots().map(|s| self.focus_owner(s.id)));
        if hint_enabled {
            seq.push(FocusTarget::HintButton);
        }
        seq.push(FocusTarget::SubmitButton);
        seq
    }

    /// Sorted identities of every tile found in the pool or a slot.
    pub fn identity_multiset(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = self
            .pool
            .iter()
            .copied()
            .chain(self.slots().filter_map(Slot::occupant))
            .collect();
        ids.sort();
        ids
    }

    /// True when every tile sits in exactly one place.
    pub fn is_consistent(&self) -> bool {
        let mut expected: Vec<TileId> = self.tiles.iter().map(|t| t.id).collect();
        expected.sort();
        self.identity_multiset() == expected
    }

    // --- mutation, engine only ---------------------------------------------

    pub(crate) fn take_from_pool(&mut self, tile: TileId) -> bool {
        match self.pool.iter().position(|t| *t == tile) {
            Some(pos) => {
                self.pool.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn push_pool(&mut self, tile: TileId) {
        if !self.pool.contains(&tile) {
            self.pool.push(tile);
        }
    }

    /// Replace a slot's occupant, returning the previous one.
    pub(crate) fn set_occupant(&mut self, slot: SlotId, tile: Option<TileId>) -> Option<TileId> {
        self.slot_mut(slot)
            .and_then(|s| std::mem::replace(&mut s.occupant, tile))
    }

    /// Detach a tile from wherever it is. Returns where it was.
    pub(crate) fn detach(&mut self, tile: TileId) -> Option<Location> {
        let loc = self.location(tile)?;
        match loc {
            Location::Pool => {
                self.take_from_pool(tile);
            }
            Location::Slot(s) => {
                self.set_occupant(s, None);
            }
        }
        Some(loc)
    }

    pub(crate) fn attach(&mut self, tile: TileId, to: Location) {
        match to {
            Location::Pool => self.push_pool(tile),
            Location::Slot(s) => {
                self.set_occupant(s, Some(tile));
            }
        }
    }

    pub(crate) fn lock_tile(&mut self, tile: TileId) -> bool {
        match self.tiles.get_mut(tile.index).filter(|t| t.id == tile) {
            Some(t) if !t.locked => {
                t.locked = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn lock_slot(&mut self, slot: SlotId) -> bool {
        match self.slot_mut(slot) {
            Some(s) if !s.locked => {
                s.locked = true;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snowflake() -> Board {
        Board::new("SNOWFLAKE", [4, 5]).unwrap()
    }

    #[test]
    fn new_board_puts_every_tile_in_the_pool() {
        let b = snowflake();
        assert_eq!(b.pool().len(), 9);
        assert_eq!(b.pool()[0], TileId::new('S', 0));
        assert_eq!(b.pool()[8], TileId::new('E', 8));
        assert!(b.slots().all(Slot::is_empty));
        assert_eq!(b.word_text(0), "____");
        assert!(b.is_consistent());
    }

    #[test]
    fn construction_rejects_bad_input() {
        assert_eq!(
            Board::new("SNOW", [4, 5]).unwrap_err(),
            PuzzleError::LetterCount { letters: 4, slots: 9 }
        );
        assert_eq!(Board::new("SN0W", [2, 2]).unwrap_err(), PuzzleError::InvalidLetter('0'));
        assert_eq!(Board::new("AB", [2, 0]).unwrap_err(), PuzzleError::EmptyWord(1));
    }

    #[test]
    fn lowercase_letters_are_normalised() {
        let b = Board::new("ab", [1, 1]).unwrap();
        assert_eq!(b.tiles()[1].id(), TileId::new('B', 1));
    }

    #[test]
    fn tile_lookup_requires_matching_letter() {
        let b = snowflake();
        assert!(b.tile(TileId::new('S', 0)).is_some());
        assert!(b.tile(TileId::new('X', 0)).is_none());
        assert!(b.tile(TileId::new('S', 42)).is_none());
    }

    #[test]
    fn location_is_derived_from_occupancy() {
        let mut b = snowflake();
        let s = TileId::new('S', 0);
        let slot = SlotId::new(0, 0);
        assert_eq!(b.location(s), Some(Location::Pool));
        b.detach(s);
        b.attach(s, Location::Slot(slot));
        assert_eq!(b.location(s), Some(Location::Slot(slot)));
        assert_eq!(b.word_text(0), "S___");
        assert!(b.is_consistent());
    }

    #[test]
    fn focus_owner_follows_occupancy_and_locks() {
        let mut b = snowflake();
        let slot = SlotId::new(1, 2);
        assert_eq!(b.focus_owner(slot), FocusTarget::Slot(slot));
        let a = TileId::new('A', 6);
        b.detach(a);
        b.attach(a, Location::Slot(slot));
        assert_eq!(b.focus_owner(slot), FocusTarget::Tile(a));
        b.lock_tile(a);
        assert_eq!(b.focus_owner(slot), FocusTarget::Slot(slot));
    }

    #[test]
    fn tab_sequence_lists_pool_then_slots_then_buttons() {
        let b = Board::new("AB", [1, 1]).unwrap();
        let seq = b.tab_sequence(true);
        assert_eq!(
            seq,
            vec![
                FocusTarget::Tile(TileId::new('A', 0)),
                FocusTarget::Tile(TileId::new('B', 1)),
                FocusTarget::Slot(SlotId::new(0, 0)),
                FocusTarget::Slot(SlotId::new(1, 0)),
                FocusTarget::HintButton,
                FocusTarget::SubmitButton,
            ]
        );
        assert!(!b.tab_sequence(false).contains(&FocusTarget::HintButton));
    }

    #[test]
    fn first_empty_and_next_open_skip_locked_slots() {
        let mut b = snowflake();
        b.lock_slot(SlotId::new(0, 0));
        assert_eq!(b.first_empty_slot(), Some(SlotId::new(0, 1)));
        b.lock_slot(SlotId::new(1, 0));
        assert_eq!(b.next_open_slot(SlotId::new(0, 3)), Some(SlotId::new(1, 1)));
        assert_eq!(b.next_open_slot(SlotId::new(1, 4)), None);
    }

    #[test]
    fn locks_are_one_way() {
        let mut b = snowflake();
        assert!(b.lock_slot(SlotId::new(0, 0)));
        assert!(!b.lock_slot(SlotId::new(0, 0)));
        assert!(b.slot(SlotId::new(0, 0)).unwrap().locked());
    }
}
