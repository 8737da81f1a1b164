//! Word Tiles core crate.
//!
//! Letter tiles are dragged, tapped or typed into the slots of two target
//! words. The placement engine and the three input adapters live in
//! [`puzzle`] and run anywhere; [`dom`] mounts them into a browser page.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod logging;
pub mod puzzle;

#[cfg(feature = "serde_json")]
pub mod dom;

pub use config::{InputTuning, InstanceKind, PuzzleConfig};
pub use error::{PlacementError, PlacementResult, PuzzleError};
pub use puzzle::{Board, Engine, FocusTarget, Location, Modality, Outcome, SlotId, TileId};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init();
}
