// End-to-end placement scenarios (native).
// These drive the engine through the pointer adapter with an in-memory
// surface, so they run under plain `cargo test`.

use std::cell::RefCell;
use std::rc::Rc;

use word_tiles::puzzle::pointer::{self, DropTarget};
use word_tiles::puzzle::{Board, Engine, MemorySurface, PuzzleEvent, SettleTask};
use word_tiles::{Location, Modality, Outcome, PuzzleConfig, SlotId, TileId};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine(letters: &str, lens: [usize; 2]) -> Engine<MemorySurface> {
    init_logging();
    let board = Board::new(letters, lens).unwrap();
    let surface = MemorySurface::with_pool(board.pool());
    Engine::new(board, surface)
}

fn tile(e: &Engine<MemorySurface>, index: usize) -> TileId {
    e.board().tiles()[index].id()
}

fn pool_letters(e: &Engine<MemorySurface>) -> String {
    e.board().pool().iter().map(|t| t.letter).collect()
}

fn drag(e: &mut Engine<MemorySurface>, tile: TileId, target: DropTarget) -> Outcome {
    pointer::drag_start(e, tile).unwrap();
    assert!(pointer::drag_over(e, target), "{target:?} refused {tile}");
    let out = pointer::drop(e, target).unwrap();
    pointer::drag_end(e);
    e.settle();
    out
}

#[test]
fn snowflake_drag_and_swap() {
    let mut e = engine("SNOWFLAKE", [4, 5]);
    for i in 0..4 {
        let t = tile(&e, i);
        drag(&mut e, t, DropTarget::Slot(SlotId::new(0, i)));
    }
    assert_eq!(e.board().word_text(0), "SNOW");
    assert_eq!(pool_letters(&e), "FLAKE");

    let (s, f) = (tile(&e, 0), tile(&e, 4));
    let out = drag(&mut e, f, DropTarget::Slot(SlotId::new(0, 0)));
    assert_eq!(
        out,
        Outcome::Swapped {
            placed: f,
            displaced: s,
            slot: SlotId::new(0, 0),
            displaced_to: Location::Pool,
        }
    );
    assert_eq!(e.board().word_text(0), "FNOW");
    assert_eq!(pool_letters(&e), "LAKES");
    assert!(e.board().is_consistent());
    assert!(e.surface().vanished().is_empty());
}

#[test]
fn pool_tile_swaps_with_slot_occupant() {
    let mut e = engine("SNOW", [2, 2]);
    let (s, n) = (tile(&e, 0), tile(&e, 1));
    let slot0 = SlotId::new(0, 0);
    e.place_tile(n, slot0, Modality::Pointer).unwrap();
    e.settle();
    e.place_tile(s, slot0, Modality::Pointer).unwrap();
    assert_eq!(e.board().occupant(slot0), Some(s));
    assert!(e.board().pool().contains(&n));
    assert!(!e.board().pool().contains(&s));
}

#[test]
fn re_placing_the_occupant_is_idempotent() {
    let mut e = engine("SNOW", [2, 2]);
    let s = tile(&e, 0);
    let slot = SlotId::new(1, 1);
    drag(&mut e, s, DropTarget::Slot(slot));
    let before = e.surface().nodes_at(Location::Slot(slot));
    assert_eq!(drag(&mut e, s, DropTarget::Slot(slot)), Outcome::Unchanged);
    assert_eq!(e.surface().nodes_at(Location::Slot(slot)), before);
    assert_eq!(e.surface().node_count(s), 1);
}

#[test]
fn collaborators_hear_about_every_move() {
    let mut e = engine("SNOW", [2, 2]);
    let seen: Rc<RefCell<Vec<PuzzleEvent>>> = Rc::default();
    let sink = seen.clone();
    e.subscribe(move |ev| sink.borrow_mut().push(*ev));

    let (s, n) = (tile(&e, 0), tile(&e, 1));
    drag(&mut e, s, DropTarget::Slot(SlotId::new(0, 0)));
    drag(&mut e, n, DropTarget::Tile(s));
    drag(&mut e, n, DropTarget::Pool);

    let kinds: Vec<&str> = seen
        .borrow()
        .iter()
        .map(|ev| match ev {
            PuzzleEvent::TilePlaced { .. } => "placed",
            PuzzleEvent::TilesSwapped { .. } => "swapped",
            PuzzleEvent::TileRemoved { .. } => "removed",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["placed", "swapped", "removed"]);
}

#[test]
fn completion_is_reported_after_settle() {
    let mut e = engine("AB", [1, 1]);
    let (a, b) = (tile(&e, 0), tile(&e, 1));
    e.place_tile(a, SlotId::new(0, 0), Modality::Touch).unwrap();
    e.settle();
    e.place_tile(b, SlotId::new(1, 0), Modality::Touch).unwrap();
    assert!(e.board().is_complete());
    assert!(e.settle().contains(&SettleTask::CheckAutoComplete));
    let fill = e.board().fill_state();
    assert!(fill.is_complete());
    assert_eq!(fill.words[0], vec![Some('A')]);
}

#[test]
fn config_drives_tuning_and_hint_button() {
    init_logging();
    let mut cfg = PuzzleConfig::new("test-1", "snowflake", [4, 5]);
    cfg.hint_enabled = false;
    cfg.input.touch_threshold_px = 24.0;
    let board = Board::from_config(&cfg).unwrap();
    let surface = MemorySurface::with_pool(board.pool());
    let e = Engine::from_config(&cfg, surface).unwrap();
    assert_eq!(e.tuning().touch_threshold_px, 24.0);
    assert!(!e.hint_enabled());
    assert_eq!(e.board().tiles()[0].id(), TileId::new('S', 0));
}
