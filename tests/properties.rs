// Property tests: arbitrary operation sequences against the placement engine.

use proptest::prelude::*;

use word_tiles::puzzle::recovery;
use word_tiles::puzzle::{Board, Engine, MemorySurface, Surface};
use word_tiles::{FocusTarget, Modality, SlotId, TileId};

const LETTERS: &str = "SNOWFLAKE";
const LENS: [usize; 2] = [4, 5];
const SLOTS: usize = 9;

#[derive(Clone, Debug)]
enum Op {
    Place(usize, usize),
    Remove(usize),
    Swap(usize, usize, usize),
    Return(usize),
    Reveal(usize, usize),
    LockSlot(usize),
    Forget(usize),
    Settle,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..SLOTS, 0..SLOTS).prop_map(|(t, s)| Op::Place(t, s)),
        2 => (0..SLOTS).prop_map(Op::Remove),
        2 => (0..SLOTS, 0..SLOTS, 0..SLOTS).prop_map(|(a, b, s)| Op::Swap(a, b, s)),
        1 => (0..SLOTS).prop_map(Op::Return),
        1 => (0..SLOTS, 0..SLOTS).prop_map(|(s, l)| Op::Reveal(s, l)),
        1 => (0..SLOTS).prop_map(Op::LockSlot),
        1 => (0..SLOTS).prop_map(Op::Forget),
        4 => Just(Op::Settle),
    ]
}

fn slot_at(flat: usize) -> SlotId {
    if flat < LENS[0] {
        SlotId::new(0, flat)
    } else {
        SlotId::new(1, flat - LENS[0])
    }
}

fn engine() -> Engine<MemorySurface> {
    let board = Board::new(LETTERS, LENS).unwrap();
    let surface = MemorySurface::with_pool(board.pool());
    Engine::new(board, surface)
}

fn tile(e: &Engine<MemorySurface>, index: usize) -> TileId {
    e.board().tiles()[index].id()
}

fn apply(e: &mut Engine<MemorySurface>, op: &Op) {
    // Rejections are expected; they must simply leave state alone.
    let _ = match *op {
        Op::Place(t, s) => {
            let id = tile(e, t);
            e.place_tile(id, slot_at(s), Modality::Pointer).map(|_| ())
        }
        Op::Remove(s) => e.remove_tile(slot_at(s), Modality::Keyboard).map(|_| ()),
        Op::Swap(a, b, s) => {
            let (a, b) = (tile(e, a), tile(e, b));
            e.swap_tiles(a, b, slot_at(s), Modality::Touch).map(|_| ())
        }
        Op::Return(t) => {
            let id = tile(e, t);
            e.return_to_pool(id.letter, id.index).map(|_| ())
        }
        Op::Reveal(s, l) => {
            let letter = LETTERS.as_bytes()[l] as char;
            e.reveal(slot_at(s), letter).map(|_| ())
        }
        Op::LockSlot(s) => e.lock_slot(slot_at(s)),
        Op::Forget(t) => {
            let id = tile(e, t);
            e.surface_mut().forget(id);
            Ok(())
        }
        Op::Settle => {
            e.settle();
            Ok(())
        }
    };
}

fn locked_snapshot(e: &Engine<MemorySurface>) -> Vec<(SlotId, Option<TileId>)> {
    e.board()
        .slots()
        .filter(|s| s.locked())
        .map(|s| (s.id(), s.occupant()))
        .collect()
}

proptest! {
    /// The multiset of tile identities never changes.
    #[test]
    fn tiles_are_conserved(ops in proptest::collection::vec(op(), 0..60)) {
        let mut e = engine();
        let expected = e.board().identity_multiset();
        for op in &ops {
            apply(&mut e, op);
            prop_assert_eq!(e.board().identity_multiset(), expected.clone(), "after {:?}", op);
            prop_assert!(e.board().is_consistent());
        }
    }

    /// Clone-before-remove: no tile is ever left without a representation by
    /// a relocation, and an audit brings back anything lost externally.
    #[test]
    fn representations_survive_relocation(ops in proptest::collection::vec(op(), 0..60)) {
        let mut e = engine();
        for op in &ops {
            apply(&mut e, op);
        }
        prop_assert!(e.surface().vanished().is_empty());
        recovery::audit(&mut e);
        e.settle();
        for t in e.board().tiles() {
            prop_assert!(e.surface().is_live(t.id()), "{} has no representation", t.id());
        }
        prop_assert!(e.board().is_consistent());
    }

    /// Locked slots keep their tile for good, whether or not the tile itself
    /// was locked.
    #[test]
    fn locks_are_permanent(
        before in proptest::collection::vec(op(), 0..30),
        after in proptest::collection::vec(op(), 0..30),
    ) {
        let mut e = engine();
        for op in &before {
            apply(&mut e, op);
        }
        let locked = locked_snapshot(&e);
        for op in &after {
            apply(&mut e, op);
        }
        for (slot, occupant) in locked {
            let s = e.board().slot(slot).unwrap();
            prop_assert!(s.locked());
            prop_assert_eq!(s.occupant(), occupant);
        }
    }

    /// Exactly one of {slot, occupant} is a Tab stop, and a rendered slot
    /// agrees with the board about which.
    #[test]
    fn roving_focus_holds_when_settled(ops in proptest::collection::vec(op(), 0..60)) {
        let mut e = engine();
        for op in &ops {
            apply(&mut e, op);
        }
        e.settle();
        let seq = e.board().tab_sequence(true);
        for s in e.board().slots() {
            let owner = e.board().focus_owner(s.id());
            let slot_stop = seq.contains(&FocusTarget::Slot(s.id()));
            let tile_stop = s.occupant().is_some_and(|t| seq.contains(&FocusTarget::Tile(t)));
            prop_assert!(slot_stop != tile_stop, "slot {} has {} tab stops", s.id(), u8::from(slot_stop) + u8::from(tile_stop));
            if let Some(view) = e.surface().slot_view(s.id()) {
                prop_assert_eq!(view.focus, owner);
                prop_assert_eq!(view.filled, !s.is_empty());
            }
        }
    }
}

#[test]
fn double_activation_fills_in_reading_order_until_full() {
    use word_tiles::puzzle::interaction;

    let board = Board::new("ABC", [2, 1]).unwrap();
    let surface = MemorySurface::with_pool(board.pool());
    let mut e = Engine::new(board, surface);
    let mut now = 0.0;
    for (i, expected) in [SlotId::new(0, 0), SlotId::new(0, 1), SlotId::new(1, 0)]
        .into_iter()
        .enumerate()
    {
        let t = tile(&e, i);
        interaction::tap(&mut e, t, now, Modality::Pointer).unwrap();
        interaction::tap(&mut e, t, now + 120.0, Modality::Pointer).unwrap();
        e.settle();
        assert_eq!(e.board().occupant(expected), Some(t));
        now += 1000.0;
    }
    assert!(e.board().first_empty_slot().is_none());
}
