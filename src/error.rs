//! Error types for puzzle construction and tile placement.

use crate::puzzle::{SlotId, TileId};

/// Errors raised while building a puzzle instance from its configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// A letter outside A–Z was supplied
    #[error("invalid letter {0:?}: tiles must be A-Z")]
    InvalidLetter(char),

    /// The number of tiles does not fill both words exactly
    #[error("{letters} letters cannot fill words of {slots} slots")]
    LetterCount { letters: usize, slots: usize },

    /// One of the two words has no slots
    #[error("word {0} has no slots")]
    EmptyWord(usize),

    /// Instance prefix is empty or not usable as a DOM id fragment
    #[error("invalid instance prefix {0:?}")]
    InvalidPrefix(String),

    /// Configuration could not be decoded
    #[error("configuration error: {0}")]
    Config(String),
}

/// Reasons a placement operation was rejected.
///
/// Every variant describes a no-op: when an engine call returns one of these
/// the board and its rendered representation are unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Another placement is still waiting for its after-settle continuation
    #[error("placement already in progress")]
    Busy,

    #[error("tile {0} is locked")]
    LockedTile(TileId),

    #[error("slot {0} is locked")]
    LockedSlot(SlotId),

    #[error("no tile {letter}#{index} in this puzzle")]
    UnknownTile { letter: char, index: usize },

    #[error("no slot {0} in this puzzle")]
    UnknownSlot(SlotId),

    /// An outside handle lacked the data needed to identify an entity
    #[error("handle is missing its {0}")]
    MissingIdentity(&'static str),

    #[error("slot {0} is empty")]
    EmptySlot(SlotId),

    #[error("cannot swap tile {0} with itself")]
    SameTile(TileId),

    /// `swap_tiles` was asked to displace a tile that is not in the target slot
    #[error("tile {tile} is not the occupant of slot {slot}")]
    NotOccupant { tile: TileId, slot: SlotId },

    /// Nothing to do: no empty slot, no matching letter, no drag in flight
    #[error("no target available")]
    NoTarget,
}

/// Result type for engine operations.
pub type PlacementResult<T> = Result<T, PlacementError>;
