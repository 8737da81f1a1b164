//! Placement engine: the only code allowed to change where a tile lives.
//!
//! Four primitives cover every input modality: [`Engine::place_tile`],
//! [`Engine::remove_tile`], [`Engine::swap_tiles`] and
//! [`Engine::return_to_pool`]. A successful mutation leaves the engine
//! `processing` until the host runs [`Engine::settle`] on the next frame;
//! calls arriving in between are rejected with [`PlacementError::Busy`].

use log::{debug, warn};

use super::state::InteractionState;
use super::surface::{SlotView, Surface};
use super::{Board, FocusTarget, Location, SlotId, TileId};
use crate::config::{InputTuning, PuzzleConfig};
use crate::error::{PlacementError, PlacementResult, PuzzleError};

/// Which adapter an operation came from. Only keyboard operations move focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modality {
    Pointer,
    Touch,
    Keyboard,
    /// Hint/solution reveal and recovery.
    Programmatic,
}

/// Result of an accepted operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Placed {
        tile: TileId,
        slot: SlotId,
    },
    Swapped {
        placed: TileId,
        displaced: TileId,
        slot: SlotId,
        displaced_to: Location,
    },
    Removed {
        tile: TileId,
        slot: SlotId,
    },
    /// A lost representation was rebuilt.
    Restored {
        tile: TileId,
        at: Location,
    },
    Unchanged,
}

/// Notifications for collaborators (score display, completion checks, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PuzzleEvent {
    TilePlaced {
        tile: TileId,
        slot: SlotId,
        from: Location,
    },
    TileRemoved {
        tile: TileId,
        slot: SlotId,
    },
    TilesSwapped {
        placed: TileId,
        displaced: TileId,
        slot: SlotId,
        displaced_to: Location,
    },
    TileRestored {
        tile: TileId,
        at: Location,
    },
    TileLocked(TileId),
    SlotLocked(SlotId),
    SelectionChanged(Option<TileId>),
}

/// Work deferred until the current gesture's mutations have settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleTask {
    Focus(FocusTarget),
    UpdateScore,
    CheckAutoComplete,
}

type Observer = Box<dyn FnMut(&PuzzleEvent)>;

pub struct Engine<S: Surface> {
    board: Board,
    state: InteractionState,
    surface: S,
    tuning: InputTuning,
    hint_enabled: bool,
    observers: Vec<Observer>,
    pending: Vec<SettleTask>,
}

impl<S: Surface> Engine<S> {
    /// Wrap a board and a surface that already shows the board's pool.
    pub fn new(board: Board, surface: S) -> Self {
        let mut engine = Self {
            board,
            state: InteractionState::new(),
            surface,
            tuning: InputTuning::default(),
            hint_enabled: true,
            observers: Vec::new(),
            pending: Vec::new(),
        };
        let slots: Vec<SlotId> = engine.board.slots().map(|s| s.id()).collect();
        for slot in slots {
            engine.sync_slot(slot);
        }
        engine
    }

    pub fn from_config(cfg: &PuzzleConfig, surface: S) -> Result<Self, PuzzleError> {
        cfg.validate()?;
        let board = Board::from_config(cfg)?;
        Ok(Self::new(board, surface)
            .with_tuning(cfg.input)
            .with_hint(cfg.hint_enabled))
    }

    pub fn with_tuning(mut self, tuning: InputTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_hint(mut self, enabled: bool) -> Self {
        self.hint_enabled = enabled;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut InteractionState {
        &mut self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn tuning(&self) -> InputTuning {
        self.tuning
    }

    pub fn hint_enabled(&self) -> bool {
        self.hint_enabled
    }

    pub fn is_processing(&self) -> bool {
        self.state.processing
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&PuzzleEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: PuzzleEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }

    // --- deferred continuations -------------------------------------------

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Release the processing mutex and hand back the deferred tasks.
    pub fn settle(&mut self) -> Vec<SettleTask> {
        self.state.processing = false;
        std::mem::take(&mut self.pending)
    }

    fn queue(&mut self, task: SettleTask) {
        if !self.pending.contains(&task) {
            self.pending.push(task);
        }
    }

    /// Replace any queued focus move with `target`.
    pub(crate) fn request_focus(&mut self, target: FocusTarget) {
        self.pending.retain(|t| !matches!(t, SettleTask::Focus(_)));
        self.pending.push(SettleTask::Focus(target));
    }

    fn commit(&mut self, modality: Modality, focus_slot: Option<SlotId>) {
        self.state.processing = true;
        self.queue(SettleTask::UpdateScore);
        self.queue(SettleTask::CheckAutoComplete);
        if let (Modality::Keyboard, Some(slot)) = (modality, focus_slot) {
            let owner = self.board.focus_owner(slot);
            self.request_focus(owner);
        }
    }

    fn guard(&self) -> PlacementResult<()> {
        if self.state.processing {
            return Err(PlacementError::Busy);
        }
        Ok(())
    }

    // --- selection --------------------------------------------------------

    /// Change the selected tile, keeping the surface highlight in step.
    pub fn select(&mut self, tile: Option<TileId>) {
        if self.state.selected == tile {
            return;
        }
        if let Some(prev) = self.state.selected.take() {
            self.surface.set_selected(prev, false);
        }
        if let Some(next) = tile {
            self.surface.set_selected(next, true);
        }
        self.state.selected = tile;
        self.emit(PuzzleEvent::SelectionChanged(tile));
    }

    // --- accessibility ------------------------------------------------------

    fn sync_slot(&mut self, slot: SlotId) {
        if let Some(s) = self.board.slot(slot) {
            let view = SlotView {
                filled: !s.is_empty(),
                locked: s.locked(),
                focus: self.board.focus_owner(slot),
            };
            self.surface.sync_slot(slot, view);
        }
    }

    fn sync_location(&mut self, at: Location) {
        if let Location::Slot(slot) = at {
            self.sync_slot(slot);
        }
    }

    // --- checks -------------------------------------------------------------

    /// Known, unlocked, and not sitting in a locked slot.
    pub fn ensure_movable(&self, tile: TileId) -> PlacementResult<()> {
        let t = self.board.tile(tile).ok_or(PlacementError::UnknownTile {
            letter: tile.letter,
            index: tile.index,
        })?;
        if t.locked() {
            return Err(PlacementError::LockedTile(tile));
        }
        if let Some(slot) = self.board.locked_holder(tile) {
            return Err(PlacementError::LockedSlot(slot));
        }
        Ok(())
    }

    fn check_tile(&self, tile: TileId) -> PlacementResult<Location> {
        self.ensure_movable(tile)?;
        self.board.location(tile).ok_or(PlacementError::UnknownTile {
            letter: tile.letter,
            index: tile.index,
        })
    }

    fn check_slot(&self, slot: SlotId) -> PlacementResult<Option<TileId>> {
        let s = self.board.slot(slot).ok_or(PlacementError::UnknownSlot(slot))?;
        if s.locked() {
            return Err(PlacementError::LockedSlot(slot));
        }
        Ok(s.occupant())
    }

    /// Two-phase move: destination first, then the board, then the source.
    fn relocate(&mut self, tile: TileId, from: Location, to: Location) {
        self.surface.materialize(tile, to);
        self.board.detach(tile);
        self.board.attach(tile, to);
        self.surface.release(tile, from);
        if self.state.selected == Some(tile) {
            self.surface.set_selected(tile, true);
        }
    }

    // --- primitives ---------------------------------------------------------

    /// Put `tile` into `slot`, swapping with an unlocked occupant.
    pub fn place_tile(
        &mut self,
        tile: TileId,
        slot: SlotId,
        modality: Modality,
    ) -> PlacementResult<Outcome> {
        self.guard()?;
        self.place_inner(tile, slot, modality)
    }

    fn place_inner(
        &mut self,
        tile: TileId,
        slot: SlotId,
        modality: Modality,
    ) -> PlacementResult<Outcome> {
        let occupant = self.check_slot(slot)?;
        let from = self.check_tile(tile)?;
        match occupant {
            Some(current) if current == tile => Ok(Outcome::Unchanged),
            Some(current) => self.swap_inner(tile, current, slot, modality),
            None => {
                let to = Location::Slot(slot);
                self.relocate(tile, from, to);
                self.sync_location(from);
                self.sync_slot(slot);
                debug!("placed {tile} into {slot}");
                self.emit(PuzzleEvent::TilePlaced { tile, slot, from });
                self.commit(modality, Some(slot));
                Ok(Outcome::Placed { tile, slot })
            }
        }
    }

    /// Move the tile in `slot` back to the pool.
    pub fn remove_tile(&mut self, slot: SlotId, modality: Modality) -> PlacementResult<Outcome> {
        self.guard()?;
        let tile = self
            .check_slot(slot)?
            .ok_or(PlacementError::EmptySlot(slot))?;
        self.check_tile(tile)?;
        self.pool_from_slot(tile, slot);
        self.commit(modality, Some(slot));
        Ok(Outcome::Removed { tile, slot })
    }

    fn pool_from_slot(&mut self, tile: TileId, slot: SlotId) {
        self.relocate(tile, Location::Slot(slot), Location::Pool);
        self.sync_slot(slot);
        debug!("returned {tile} from {slot} to the pool");
        self.emit(PuzzleEvent::TileRemoved { tile, slot });
    }

    /// Move `a` into `slot` and its occupant `b` to wherever `a` was.
    pub fn swap_tiles(
        &mut self,
        a: TileId,
        b: TileId,
        slot: SlotId,
        modality: Modality,
    ) -> PlacementResult<Outcome> {
        self.guard()?;
        self.swap_inner(a, b, slot, modality)
    }

    fn swap_inner(
        &mut self,
        a: TileId,
        b: TileId,
        slot: SlotId,
        modality: Modality,
    ) -> PlacementResult<Outcome> {
        if a == b {
            return Err(PlacementError::SameTile(a));
        }
        let occupant = self.check_slot(slot)?;
        if occupant != Some(b) {
            return Err(PlacementError::NotOccupant { tile: b, slot });
        }
        let from_a = self.check_tile(a)?;
        self.check_tile(b)?;
        let target = Location::Slot(slot);

        self.surface.materialize(a, target);
        self.surface.materialize(b, from_a);
        self.board.detach(a);
        self.board.detach(b);
        self.board.attach(a, target);
        self.board.attach(b, from_a);
        self.surface.release(a, from_a);
        self.surface.release(b, target);
        for tile in [a, b] {
            if self.state.selected == Some(tile) {
                self.surface.set_selected(tile, true);
            }
        }

        self.sync_slot(slot);
        self.sync_location(from_a);
        debug!("swapped {a} into {slot}, {b} moved to {from_a:?}");
        self.emit(PuzzleEvent::TilesSwapped {
            placed: a,
            displaced: b,
            slot,
            displaced_to: from_a,
        });
        self.commit(modality, Some(slot));
        Ok(Outcome::Swapped {
            placed: a,
            displaced: b,
            slot,
            displaced_to: from_a,
        })
    }

    /// Put the tile with this identity back in the pool, rebuilding its
    /// representation if it was lost.
    ///
    /// Rebuilding never waits for the processing mutex: a tile whose
    /// representation vanished is restored in place when the engine is busy
    /// or the tile is locked, and moved to the pool otherwise.
    pub fn return_to_pool(&mut self, letter: char, index: usize) -> PlacementResult<Outcome> {
        let tile = TileId::new(letter.to_ascii_uppercase(), index);
        let locked = self
            .board
            .tile(tile)
            .ok_or(PlacementError::UnknownTile { letter, index })?
            .locked();
        let live = self.surface.is_live(tile);
        let at = match self.board.location(tile) {
            Some(at) => at,
            None => {
                // Not in the pool or any slot: the board itself lost it.
                warn!("{tile} missing from the board, re-adding to the pool");
                self.board.attach(tile, Location::Pool);
                Location::Pool
            }
        };
        match at {
            Location::Pool if live => Ok(Outcome::Unchanged),
            Location::Slot(slot) => {
                let slot_locked = self.board.slot(slot).is_some_and(|s| s.locked());
                let movable = !locked && !slot_locked && !self.state.processing;
                if movable {
                    self.pool_from_slot(tile, slot);
                    self.commit(Modality::Programmatic, None);
                    if !live {
                        warn!("restored lost {tile} to the pool");
                        self.emit(PuzzleEvent::TileRestored {
                            tile,
                            at: Location::Pool,
                        });
                    }
                    Ok(Outcome::Removed { tile, slot })
                } else if live {
                    Err(if locked {
                        PlacementError::LockedTile(tile)
                    } else if slot_locked {
                        PlacementError::LockedSlot(slot)
                    } else {
                        PlacementError::Busy
                    })
                } else {
                    Ok(self.restore(tile, at))
                }
            }
            Location::Pool => Ok(self.restore(tile, at)),
        }
    }

    fn restore(&mut self, tile: TileId, at: Location) -> Outcome {
        warn!("rebuilding lost representation of {tile} at {at:?}");
        self.surface.materialize(tile, at);
        if self.board.is_tile_locked(tile) {
            self.surface.mark_locked(tile);
        }
        if self.state.selected == Some(tile) {
            self.surface.set_selected(tile, true);
        }
        self.sync_location(at);
        self.emit(PuzzleEvent::TileRestored { tile, at });
        Outcome::Restored { tile, at }
    }

    // --- locking (hint / solution reveal) --------------------------------------

    pub fn lock_tile(&mut self, tile: TileId) -> PlacementResult<()> {
        if !self.board.contains_tile(tile) {
            return Err(PlacementError::UnknownTile {
                letter: tile.letter,
                index: tile.index,
            });
        }
        if self.board.lock_tile(tile) {
            self.surface.mark_locked(tile);
            if self.state.selected == Some(tile) {
                self.select(None);
            }
            if let Some(at) = self.board.location(tile) {
                self.sync_location(at);
            }
            self.emit(PuzzleEvent::TileLocked(tile));
        }
        Ok(())
    }

    pub fn lock_slot(&mut self, slot: SlotId) -> PlacementResult<()> {
        if self.board.slot(slot).is_none() {
            return Err(PlacementError::UnknownSlot(slot));
        }
        if self.board.lock_slot(slot) {
            let occupant = self.board.occupant(slot);
            if occupant.is_some() && self.state.selected == occupant {
                self.select(None);
            }
            self.sync_slot(slot);
            self.emit(PuzzleEvent::SlotLocked(slot));
        }
        Ok(())
    }

    /// Place a tile showing `letter` into `slot` and lock both.
    ///
    /// The tile is the first movable match in pool order, then slot reading
    /// order. An occupant is displaced following the usual swap rule.
    pub fn reveal(&mut self, slot: SlotId, letter: char) -> PlacementResult<Outcome> {
        self.guard()?;
        self.reveal_inner(slot, letter.to_ascii_uppercase())
    }

    fn reveal_inner(&mut self, slot: SlotId, letter: char) -> PlacementResult<Outcome> {
        match reveal_pick(&self.board, slot, letter)? {
            None => {
                if let Some(current) = self.board.occupant(slot) {
                    self.lock_tile(current)?;
                }
                self.lock_slot(slot)?;
                Ok(Outcome::Unchanged)
            }
            Some(candidate) => {
                let outcome = self.place_inner(candidate, slot, Modality::Programmatic)?;
                self.lock_tile(candidate)?;
                self.lock_slot(slot)?;
                Ok(outcome)
            }
        }
    }

    /// Reveal every slot of both words. Nothing moves unless every letter can
    /// be supplied.
    pub fn reveal_solution(&mut self, words: [&str; 2]) -> PlacementResult<()> {
        self.guard()?;
        for (word, text) in words.iter().enumerate() {
            if text.chars().count() != self.board.word_len(word) {
                return Err(PlacementError::NoTarget);
            }
        }
        let plan: Vec<(SlotId, char)> = words
            .iter()
            .enumerate()
            .flat_map(|(word, text)| {
                text.chars()
                    .enumerate()
                    .map(move |(slot, letter)| (SlotId::new(word, slot), letter.to_ascii_uppercase()))
            })
            .collect();

        // Dry run on a copy; the real board is only touched once it succeeds.
        let mut trial = self.board.clone();
        for &(slot, letter) in &plan {
            let tile = match reveal_pick(&trial, slot, letter)? {
                Some(tile) => {
                    let from = trial.detach(tile).ok_or(PlacementError::UnknownTile {
                        letter: tile.letter,
                        index: tile.index,
                    })?;
                    if let Some(current) = trial.occupant(slot) {
                        trial.detach(current);
                        trial.attach(current, from);
                    }
                    trial.attach(tile, Location::Slot(slot));
                    tile
                }
                None => trial.occupant(slot).ok_or(PlacementError::EmptySlot(slot))?,
            };
            trial.lock_tile(tile);
            trial.lock_slot(slot);
        }

        for (slot, letter) in plan {
            self.reveal_inner(slot, letter)?;
        }
        Ok(())
    }
}

/// What revealing `letter` in `slot` needs: `None` when the occupant already
/// shows it, otherwise the tile to move in.
fn reveal_pick(board: &Board, slot: SlotId, letter: char) -> PlacementResult<Option<TileId>> {
    let s = board.slot(slot).ok_or(PlacementError::UnknownSlot(slot))?;
    if s.occupant().is_some_and(|t| t.letter == letter) {
        return Ok(None);
    }
    if s.locked() {
        return Err(PlacementError::LockedSlot(slot));
    }
    if let Some(current) = s.occupant() {
        if board.is_tile_locked(current) {
            return Err(PlacementError::LockedTile(current));
        }
    }
    board
        .pool()
        .iter()
        .copied()
        .chain(board.slots().filter_map(|s| s.occupant()))
        .find(|t| t.letter == letter && board.is_tile_movable(*t))
        .map(Some)
        .ok_or(PlacementError::NoTarget)
}
