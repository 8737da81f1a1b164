//! Keyboard adapter.
//!
//! Navigation keys return the element to focus right away. Keys that move a
//! tile leave their focus change queued on the engine, to be applied after
//! the move settles.

use log::debug;

use super::engine::{Engine, Modality, Outcome};
use super::interaction;
use super::surface::Surface;
use super::{Board, FocusTarget, Location, SlotId, TileId};
use crate::error::{PlacementError, PlacementResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Delete,
    Backspace,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// An A–Z letter, uppercased.
    Letter(char),
    Other,
}

impl Key {
    /// Map a `KeyboardEvent.key` value.
    pub fn parse(key: &str) -> Self {
        match key {
            "Enter" => Key::Enter,
            " " | "Spacebar" => Key::Space,
            "Escape" | "Esc" => Key::Escape,
            "Delete" | "Del" => Key::Delete,
            "Backspace" => Key::Backspace,
            "Tab" => Key::Tab,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => Key::Letter(c.to_ascii_uppercase()),
                    _ => Key::Other,
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
    /// Ctrl, Alt or Meta held. Letters are left to the browser then.
    pub modified: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            modified: false,
        }
    }

    pub fn shifted(key: Key) -> Self {
        Self {
            key,
            shift: true,
            modified: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyResponse {
    /// The host should call `preventDefault`.
    pub handled: bool,
    /// Move focus here now.
    pub focus: Option<FocusTarget>,
}

impl KeyResponse {
    const IGNORED: Self = Self {
        handled: false,
        focus: None,
    };

    const HANDLED: Self = Self {
        handled: true,
        focus: None,
    };

    fn focus(target: FocusTarget) -> Self {
        Self {
            handled: true,
            focus: Some(target),
        }
    }
}

/// Handle one `keydown` while `focus` holds keyboard focus.
pub fn handle_key<S: Surface>(
    engine: &mut Engine<S>,
    input: KeyInput,
    focus: FocusTarget,
) -> PlacementResult<KeyResponse> {
    match input.key {
        Key::Enter | Key::Space => activate(engine, input.key, focus),
        Key::Escape => {
            if engine.state().selected().is_none() {
                return Ok(KeyResponse::IGNORED);
            }
            engine.select(None);
            Ok(KeyResponse::HANDLED)
        }
        Key::Letter(_) if input.modified => Ok(KeyResponse::IGNORED),
        Key::Letter(letter) => type_to_place(engine, letter, focus),
        Key::Delete | Key::Backspace => delete(engine, focus),
        Key::ArrowLeft => Ok(step_row(engine.board(), focus, false)),
        Key::ArrowRight => Ok(step_row(engine.board(), focus, true)),
        Key::ArrowUp => Ok(step_column(engine.board(), focus, false)),
        Key::ArrowDown => Ok(step_column(engine.board(), focus, true)),
        Key::Tab => Ok(tab(engine, focus, !input.shift)),
        Key::Other => Ok(KeyResponse::IGNORED),
    }
}

fn activate<S: Surface>(
    engine: &mut Engine<S>,
    key: Key,
    focus: FocusTarget,
) -> PlacementResult<KeyResponse> {
    match focus {
        FocusTarget::Tile(tile) => {
            interaction::activate(engine, tile, Modality::Keyboard)?;
            Ok(KeyResponse::HANDLED)
        }
        FocusTarget::Slot(slot) => {
            if let Some(selected) = engine.state().selected() {
                engine.place_tile(selected, slot, Modality::Keyboard)?;
                engine.select(None);
                return Ok(KeyResponse::HANDLED);
            }
            match engine.board().occupant(slot) {
                Some(tile) if engine.board().is_tile_movable(tile) => {
                    engine.select(Some(tile));
                    Ok(KeyResponse::HANDLED)
                }
                // Space on a focused button-like slot would otherwise scroll.
                _ => Ok(if key == Key::Space {
                    KeyResponse::HANDLED
                } else {
                    KeyResponse::IGNORED
                }),
            }
        }
        FocusTarget::HintButton | FocusTarget::SubmitButton => Ok(KeyResponse::IGNORED),
    }
}

/// Slot the focused element stands for, if any.
fn focused_slot(board: &Board, focus: FocusTarget) -> Option<SlotId> {
    match focus {
        FocusTarget::Slot(slot) => Some(slot),
        FocusTarget::Tile(tile) => match board.location(tile)? {
            Location::Slot(slot) => Some(slot),
            Location::Pool => None,
        },
        FocusTarget::HintButton | FocusTarget::SubmitButton => None,
    }
}

/// First movable tile showing `letter`: pool order, then slot reading order.
fn find_letter(board: &Board, letter: char) -> Option<TileId> {
    board
        .pool()
        .iter()
        .copied()
        .chain(board.slots().filter_map(|s| s.occupant()))
        .find(|t| t.letter == letter && board.is_tile_movable(*t))
}

fn type_to_place<S: Surface>(
    engine: &mut Engine<S>,
    letter: char,
    focus: FocusTarget,
) -> PlacementResult<KeyResponse> {
    let board = engine.board();
    let slot = match focused_slot(board, focus) {
        Some(slot) => slot,
        None => board.first_empty_slot().ok_or(PlacementError::NoTarget)?,
    };
    let tile = find_letter(board, letter).ok_or(PlacementError::NoTarget)?;
    let outcome = engine.place_tile(tile, slot, Modality::Keyboard)?;
    if outcome == Outcome::Unchanged {
        debug!("{tile} already sits in {slot}");
    }
    if engine.state().selected() == Some(tile) {
        engine.select(None);
    }
    let board = engine.board();
    let next = board.next_open_slot(slot).unwrap_or(slot);
    let owner = board.focus_owner(next);
    engine.request_focus(owner);
    Ok(KeyResponse::HANDLED)
}

fn delete<S: Surface>(engine: &mut Engine<S>, focus: FocusTarget) -> PlacementResult<KeyResponse> {
    let Some(slot) = focused_slot(engine.board(), focus) else {
        return Ok(KeyResponse::IGNORED);
    };
    engine.remove_tile(slot, Modality::Keyboard)?;
    Ok(KeyResponse::HANDLED)
}

// --- arrow grid -------------------------------------------------------------
//
// Row 0 is the pool, rows 1 and 2 are the slots of word 0 and word 1.

const ROWS: usize = 3;

fn row_len(board: &Board, row: usize) -> usize {
    match row {
        0 => board.pool().len(),
        r => board.word_len(r - 1),
    }
}

fn grid_position(board: &Board, focus: FocusTarget) -> Option<(usize, usize)> {
    match focus {
        FocusTarget::Slot(slot) => Some((slot.word + 1, slot.slot)),
        FocusTarget::Tile(tile) => match board.location(tile)? {
            Location::Pool => {
                let col = board.pool().iter().position(|t| *t == tile)?;
                Some((0, col))
            }
            Location::Slot(slot) => Some((slot.word + 1, slot.slot)),
        },
        FocusTarget::HintButton | FocusTarget::SubmitButton => None,
    }
}

fn grid_target(board: &Board, row: usize, col: usize) -> Option<FocusTarget> {
    match row {
        0 => board.pool().get(col).map(|t| FocusTarget::Tile(*t)),
        r => board
            .slot(SlotId::new(r - 1, col))
            .map(|s| board.focus_owner(s.id())),
    }
}

fn step_row(board: &Board, focus: FocusTarget, forward: bool) -> KeyResponse {
    let Some((row, col)) = grid_position(board, focus) else {
        return KeyResponse::IGNORED;
    };
    let len = row_len(board, row);
    if len == 0 {
        return KeyResponse::HANDLED;
    }
    let col = if forward {
        (col + 1) % len
    } else {
        (col + len - 1) % len
    };
    grid_target(board, row, col).map_or(KeyResponse::HANDLED, KeyResponse::focus)
}

fn step_column(board: &Board, focus: FocusTarget, down: bool) -> KeyResponse {
    let Some((row, col)) = grid_position(board, focus) else {
        return KeyResponse::IGNORED;
    };
    let mut next = row;
    loop {
        next = match (down, next) {
            (true, r) if r + 1 < ROWS => r + 1,
            (false, r) if r > 0 => r - 1,
            // Edge of the grid: stay put.
            _ => return KeyResponse::HANDLED,
        };
        let len = row_len(board, next);
        if len > 0 {
            let col = col.min(len - 1);
            return grid_target(board, next, col).map_or(KeyResponse::HANDLED, KeyResponse::focus);
        }
    }
}

// --- tab order --------------------------------------------------------------

fn tab<S: Surface>(engine: &Engine<S>, focus: FocusTarget, forward: bool) -> KeyResponse {
    let board = engine.board();
    let seq = board.tab_sequence(engine.hint_enabled());
    if seq.is_empty() {
        return KeyResponse::IGNORED;
    }
    // A slot and its occupant share one stop.
    let current = match focused_slot(board, focus) {
        Some(slot) => board.focus_owner(slot),
        None => focus,
    };
    let next = match seq.iter().position(|t| *t == current) {
        Some(pos) if forward => (pos + 1) % seq.len(),
        Some(pos) => (pos + seq.len() - 1) % seq.len(),
        None if forward => 0,
        None => seq.len() - 1,
    };
    KeyResponse::focus(seq[next])
}
