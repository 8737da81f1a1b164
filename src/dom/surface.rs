//! [`Surface`] over the real DOM.
//!
//! Every representation is an element carrying the attribute contract other
//! subsystems read: `data-letter`, `data-tile-index`, `data-word-index`,
//! `data-slot-index`, `data-locked`, and the classes `tile`, `slot`, `filled`,
//! `dragging`, `drag-over`, `selected`.

use log::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::puzzle::state::Point;
use crate::puzzle::surface::GhostHandle;
use crate::puzzle::{FocusTarget, HighlightTarget, Location, SlotId, SlotView, Surface, TileId};

pub(crate) fn tile_selector(tile: TileId) -> String {
    format!(
        ".tile[data-letter=\"{}\"][data-tile-index=\"{}\"]",
        tile.letter, tile.index
    )
}

pub(crate) fn slot_selector(slot: SlotId) -> String {
    format!(
        ".slot[data-word-index=\"{}\"][data-slot-index=\"{}\"]",
        slot.word, slot.slot
    )
}

/// Fresh element for a tile sitting in the pool.
pub(crate) fn build_tile(doc: &Document, tile: TileId) -> Result<Element, JsValue> {
    let el = doc.create_element("div")?;
    el.set_class_name("tile");
    el.set_attribute("data-letter", &tile.letter.to_string())?;
    el.set_attribute("data-tile-index", &tile.index.to_string())?;
    el.set_attribute("draggable", "true")?;
    el.set_attribute("role", "button")?;
    el.set_attribute("tabindex", "0")?;
    el.set_attribute("aria-label", &format!("Letter {}", tile.letter))?;
    el.set_text_content(Some(&tile.letter.to_string()));
    Ok(el)
}

pub(crate) fn build_slot(doc: &Document, slot: SlotId) -> Result<Element, JsValue> {
    let el = doc.create_element("div")?;
    el.set_class_name("slot");
    el.set_attribute("data-word-index", &slot.word.to_string())?;
    el.set_attribute("data-slot-index", &slot.slot.to_string())?;
    el.set_attribute("role", "button")?;
    el.set_attribute("tabindex", "0")?;
    Ok(el)
}

fn toggle(el: &Element, class: &str, on: bool) {
    // DomTokenList only fails on malformed tokens; ours are constants.
    let _ = el.class_list().toggle_with_force(class, on);
}

pub struct DomSurface {
    doc: Document,
    root: Element,
    pool: Element,
    ghost: Option<(GhostHandle, HtmlElement)>,
    next_ghost: u32,
}

impl DomSurface {
    pub fn new(doc: Document, root: Element, pool: Element) -> Self {
        Self {
            doc,
            root,
            pool,
            ghost: None,
            next_ghost: 0,
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    fn find(&self, scope: &Element, selector: &str) -> Option<Element> {
        scope.query_selector(selector).ok().flatten()
    }

    pub(crate) fn slot_element(&self, slot: SlotId) -> Option<Element> {
        self.find(&self.root, &slot_selector(slot))
    }

    pub(crate) fn tile_element(&self, tile: TileId) -> Option<Element> {
        self.find(&self.root, &tile_selector(tile))
    }

    fn container(&self, at: Location) -> Option<Element> {
        match at {
            Location::Pool => Some(self.pool.clone()),
            Location::Slot(slot) => self.slot_element(slot),
        }
    }

    fn tile_in(&self, tile: TileId, at: Location) -> Option<Element> {
        let container = self.container(at)?;
        self.find(&container, &format!(":scope > {}", tile_selector(tile)))
    }

    /// Element to focus for a target, if it is rendered.
    pub(crate) fn focus_element(&self, target: FocusTarget) -> Option<HtmlElement> {
        let el = match target {
            FocusTarget::Tile(tile) => self.tile_element(tile),
            FocusTarget::Slot(slot) => self.slot_element(slot),
            FocusTarget::HintButton => self.find(&self.root, ".hint-button"),
            FocusTarget::SubmitButton => self.find(&self.root, ".submit-button"),
        }?;
        el.dyn_into::<HtmlElement>().ok()
    }

    fn copy_of(&self, tile: TileId) -> Result<Element, JsValue> {
        match self.tile_element(tile) {
            Some(existing) => {
                let el: Element = existing.clone_node_with_deep(true)?.dyn_into()?;
                toggle(&el, "dragging", false);
                toggle(&el, "drag-over", false);
                Ok(el)
            }
            None => build_tile(&self.doc, tile),
        }
    }

    fn place_ghost(el: &HtmlElement, at: Point) {
        let style = el.style();
        let _ = style.set_property("left", &format!("{}px", at.x));
        let _ = style.set_property("top", &format!("{}px", at.y));
    }
}

impl Surface for DomSurface {
    fn materialize(&mut self, tile: TileId, to: Location) {
        let Some(container) = self.container(to) else {
            warn!("no container for {to:?}; {tile} not materialized");
            return;
        };
        let appended = self
            .copy_of(tile)
            .and_then(|el| container.append_child(&el));
        if let Err(err) = appended {
            warn!("materializing {tile} failed: {err:?}");
        }
    }

    fn release(&mut self, tile: TileId, from: Location) {
        if let Some(el) = self.tile_in(tile, from) {
            el.remove();
        }
    }

    fn is_live(&self, tile: TileId) -> bool {
        self.tile_element(tile).is_some()
    }

    fn sync_slot(&mut self, slot: SlotId, view: SlotView) {
        let Some(el) = self.slot_element(slot) else {
            return;
        };
        toggle(&el, "filled", view.filled);
        if view.locked {
            let _ = el.set_attribute("data-locked", "true");
        } else {
            let _ = el.remove_attribute("data-locked");
        }
        let slot_focusable = view.focus == FocusTarget::Slot(slot);
        let _ = el.set_attribute("tabindex", if slot_focusable { "0" } else { "-1" });
        if slot_focusable {
            let _ = el.set_attribute("role", "button");
        } else {
            let _ = el.remove_attribute("role");
        }
        match view.focus {
            FocusTarget::Tile(tile) => {
                if let Some(t) = self.tile_in(tile, Location::Slot(slot)) {
                    let _ = t.set_attribute("tabindex", "0");
                }
            }
            // The slot owns focus, so whatever it holds must leave the Tab order.
            _ => {
                if let Some(t) = self.find(&el, ":scope > .tile") {
                    let _ = t.set_attribute("tabindex", "-1");
                    let _ = t.set_attribute("draggable", "false");
                }
            }
        }
        let label = format!(
            "Word {} letter {}{}",
            slot.word + 1,
            slot.slot + 1,
            if view.filled { "" } else { ", empty" }
        );
        let _ = el.set_attribute("aria-label", &label);
    }

    fn mark_locked(&mut self, tile: TileId) {
        if let Some(el) = self.tile_element(tile) {
            let _ = el.set_attribute("data-locked", "true");
            let _ = el.set_attribute("draggable", "false");
            let _ = el.set_attribute("tabindex", "-1");
            let _ = el.set_attribute("aria-disabled", "true");
        }
    }

    fn set_selected(&mut self, tile: TileId, on: bool) {
        if let Some(el) = self.tile_element(tile) {
            toggle(&el, "selected", on);
            let _ = el.set_attribute("aria-pressed", if on { "true" } else { "false" });
        }
    }

    fn set_dragging(&mut self, tile: TileId, on: bool) {
        if let Some(el) = self.tile_element(tile) {
            toggle(&el, "dragging", on);
        }
    }

    fn set_highlight(&mut self, target: HighlightTarget, on: bool) {
        let el = match target {
            HighlightTarget::Slot(slot) => self.slot_element(slot),
            HighlightTarget::Tile(tile) => self.tile_element(tile),
            HighlightTarget::Pool => Some(self.pool.clone()),
        };
        if let Some(el) = el {
            toggle(&el, "drag-over", on);
        }
    }

    fn show_ghost(&mut self, tile: TileId, at: Point) -> Option<GhostHandle> {
        if let Some((_, stale)) = self.ghost.take() {
            stale.remove();
        }
        let source = self.tile_element(tile)?;
        let ghost: HtmlElement = source.clone_node_with_deep(true).ok()?.dyn_into().ok()?;
        let _ = ghost.set_attribute("class", "tile tile-ghost");
        let _ = ghost.remove_attribute("tabindex");
        let _ = ghost.set_attribute("aria-hidden", "true");
        let style = ghost.style();
        let _ = style.set_property("position", "fixed");
        let _ = style.set_property("pointer-events", "none");
        let _ = style.set_property("transform", "translate(-50%, -50%)");
        let _ = style.set_property("z-index", "1000");
        Self::place_ghost(&ghost, at);
        let body = self.doc.body()?;
        body.append_child(&ghost).ok()?;
        self.next_ghost += 1;
        let handle = GhostHandle(self.next_ghost);
        self.ghost = Some((handle, ghost));
        Some(handle)
    }

    fn move_ghost(&mut self, ghost: GhostHandle, at: Point) {
        if let Some((handle, el)) = &self.ghost {
            if *handle == ghost {
                Self::place_ghost(el, at);
            }
        }
    }

    fn remove_ghost(&mut self, ghost: GhostHandle) {
        if self.ghost.as_ref().is_some_and(|(h, _)| *h == ghost) {
            if let Some((_, el)) = self.ghost.take() {
                el.remove();
            }
        }
    }
}

impl Drop for DomSurface {
    fn drop(&mut self) {
        if let Some((_, el)) = self.ghost.take() {
            el.remove();
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::puzzle::{Board, Engine, Modality};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// Detached markup for a one-letter-per-word board.
    fn engine(letters: &str) -> Engine<DomSurface> {
        let doc = web_sys::window().unwrap().document().unwrap();
        let board = Board::new(letters, [1, 1]).unwrap();
        let root = doc.create_element("div").unwrap();
        let pool = doc.create_element("div").unwrap();
        pool.set_class_name("tile-pool");
        for tile in board.pool() {
            let el = build_tile(&doc, *tile).unwrap();
            pool.append_child(&el).unwrap();
        }
        root.append_child(&pool).unwrap();
        for slot in board.slots() {
            let el = build_slot(&doc, slot.id()).unwrap();
            root.append_child(&el).unwrap();
        }
        Engine::new(board, DomSurface::new(doc, root, pool))
    }

    #[wasm_bindgen_test]
    fn locked_slot_takes_the_tab_stop_from_its_tile() {
        let mut e = engine("AB");
        let a = e.board().tiles()[0].id();
        let slot = SlotId::new(0, 0);
        e.place_tile(a, slot, Modality::Pointer).unwrap();
        e.settle();
        let tile_el = e.surface().tile_element(a).unwrap();
        let slot_el = e.surface().slot_element(slot).unwrap();
        assert_eq!(tile_el.get_attribute("tabindex").as_deref(), Some("0"));
        assert_eq!(slot_el.get_attribute("tabindex").as_deref(), Some("-1"));

        e.lock_slot(slot).unwrap();
        assert_eq!(tile_el.get_attribute("tabindex").as_deref(), Some("-1"));
        assert_eq!(slot_el.get_attribute("tabindex").as_deref(), Some("0"));
        assert_eq!(slot_el.get_attribute("data-locked").as_deref(), Some("true"));
    }
}
