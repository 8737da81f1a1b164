//! Delegated event listeners.
//!
//! One listener per event type sits on the puzzle root. The innermost `.tile`
//! is resolved before the enclosing `.slot`, so a drop or click on a slotted
//! tile is handled once, as a tile-level action.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    window, AddEventListenerOptions, DragEvent, Element, Event, EventTarget, KeyboardEvent, Node,
    TouchEvent,
};

use super::{after, Session, SessionRef, EVENT_HINT, EVENT_SUBMIT};
use crate::error::{PlacementError, PlacementResult};
use crate::puzzle::keyboard::{self, Key, KeyInput};
use crate::puzzle::pointer::{self, DropTarget};
use crate::puzzle::recovery::{self, SlotHandle, TileHandle};
use crate::puzzle::touch::{self, TouchResponse};
use crate::puzzle::{interaction, FocusTarget, Location, Modality, Point};

const ROOT_EVENTS: &[&str] = &[
    "click",
    "keydown",
    "dragstart",
    "dragover",
    "dragleave",
    "drop",
    "dragend",
    "touchstart",
    "touchmove",
    "touchend",
    "touchcancel",
];

const DOCUMENT_EVENTS: &[&str] = &["touchmove", "touchend", "touchcancel"];

/// An attached listener. Detaches itself when dropped.
pub(crate) struct Listener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        capture: bool,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let options = AddEventListenerOptions::new();
        options.set_capture(capture);
        // touchmove must be able to cancel scrolling.
        options.set_passive(false);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            kind,
            callback.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self {
            target: target.clone(),
            kind,
            capture,
            callback,
        })
    }

    fn detach(&self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Detach now, free later: the listener being retired may be the one that
/// is currently running.
pub(crate) fn retire(listeners: Vec<Listener>) {
    if listeners.is_empty() {
        return;
    }
    for l in &listeners {
        l.detach();
    }
    let release = Closure::once_into_js(move || drop(listeners));
    if let Some(w) = window() {
        let _ = w.set_timeout_with_callback(release.unchecked_ref());
    }
}

pub(crate) fn install(session: &SessionRef) -> Result<Vec<Listener>, JsValue> {
    let root: EventTarget = session.borrow().engine.surface().root().clone().into();
    let mut installed = Vec::with_capacity(ROOT_EVENTS.len());
    for &kind in ROOT_EVENTS {
        let weak = Rc::downgrade(session);
        installed.push(Listener::attach(&root, kind, false, move |ev| {
            run(&weak, kind, &ev, false)
        })?);
    }
    Ok(installed)
}

fn run(weak: &Weak<RefCell<Session>>, kind: &str, ev: &Event, from_document: bool) {
    let Some(session) = weak.upgrade() else {
        return;
    };
    {
        let Ok(mut s) = session.try_borrow_mut() else {
            debug!("nested {kind} ignored");
            return;
        };
        let result = match kind {
            "click" => on_click(&mut s, ev),
            "keydown" => on_keydown(&mut s, ev),
            "dragstart" => on_drag_start(&mut s, ev),
            "dragover" => on_drag_over(&mut s, ev),
            "dragleave" => on_drag_leave(&mut s, ev),
            "drop" => on_drop(&mut s, ev),
            "dragend" => {
                pointer::drag_end(&mut s.engine);
                Ok(())
            }
            "touchstart" => on_touch_start(&mut s, weak, ev),
            "touchmove" | "touchend" | "touchcancel" => {
                // While a drag is captured the document listeners own the
                // gesture; the root copy of the same event is skipped.
                if s.engine.state().document_capture() != from_document {
                    Ok(())
                } else {
                    on_touch(&mut s, weak, kind, ev)
                }
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            debug!("{}: {kind} ignored: {err}", s.prefix);
        }
    }
    after(&session);
}

// --- resolution -------------------------------------------------------------

fn event_element(ev: &Event) -> Option<Element> {
    ev.target()?.dyn_into::<Element>().ok()
}

fn closest(el: &Element, selector: &str) -> Option<Element> {
    el.closest(selector).ok().flatten()
}

fn tile_handle(el: &Element) -> TileHandle {
    TileHandle::from_attrs(
        el.get_attribute("data-letter").as_deref(),
        el.get_attribute("data-tile-index").as_deref(),
    )
}

fn slot_handle(el: &Element) -> SlotHandle {
    SlotHandle::from_attrs(
        el.get_attribute("data-word-index").as_deref(),
        el.get_attribute("data-slot-index").as_deref(),
    )
}

fn drop_target(s: &mut Session, el: &Element) -> PlacementResult<Option<DropTarget>> {
    if let Some(tile) = closest(el, ".tile") {
        let id = recovery::resolve_tile(&mut s.engine, tile_handle(&tile))?;
        return Ok(Some(DropTarget::Tile(id)));
    }
    if let Some(slot) = closest(el, ".slot") {
        let id = recovery::resolve_slot(&s.engine, slot_handle(&slot))?;
        return Ok(Some(DropTarget::Slot(id)));
    }
    Ok(closest(el, ".tile-pool").map(|_| DropTarget::Pool))
}

fn focus_target(s: &mut Session, el: &Element) -> PlacementResult<Option<FocusTarget>> {
    if let Some(tile) = closest(el, ".tile") {
        let id = recovery::resolve_tile(&mut s.engine, tile_handle(&tile))?;
        return Ok(Some(FocusTarget::Tile(id)));
    }
    if let Some(slot) = closest(el, ".slot") {
        let id = recovery::resolve_slot(&s.engine, slot_handle(&slot))?;
        return Ok(Some(FocusTarget::Slot(id)));
    }
    if closest(el, ".hint-button").is_some() {
        return Ok(Some(FocusTarget::HintButton));
    }
    if closest(el, ".submit-button").is_some() {
        return Ok(Some(FocusTarget::SubmitButton));
    }
    Ok(None)
}

// --- click ------------------------------------------------------------------

fn on_click(s: &mut Session, ev: &Event) -> PlacementResult<()> {
    let Some(el) = event_element(ev) else {
        return Ok(());
    };
    match focus_target(s, &el)? {
        Some(FocusTarget::Tile(tile)) => {
            interaction::tap(&mut s.engine, tile, ev.time_stamp(), Modality::Pointer)?;
        }
        Some(FocusTarget::Slot(slot)) => {
            if let Some(selected) = s.engine.state().selected() {
                s.engine.place_tile(selected, slot, Modality::Pointer)?;
                s.engine.select(None);
            }
        }
        Some(FocusTarget::HintButton) => {
            let detail = JsValue::from_str(&s.prefix);
            s.emit(EVENT_HINT, detail);
        }
        Some(FocusTarget::SubmitButton) => {
            let detail = s.fill_json();
            s.emit(EVENT_SUBMIT, detail);
        }
        None if closest(&el, ".tile-pool").is_some() => {
            // Clicking the pool sends a selected slotted tile home.
            let Some(selected) = s.engine.state().selected() else {
                return Ok(());
            };
            if let Some(Location::Slot(slot)) = s.engine.board().location(selected) {
                s.engine.remove_tile(slot, Modality::Pointer)?;
                s.engine.select(None);
            }
        }
        None => {}
    }
    Ok(())
}

// --- keyboard ---------------------------------------------------------------

fn on_keydown(s: &mut Session, ev: &Event) -> PlacementResult<()> {
    let Some(kev) = ev.dyn_ref::<KeyboardEvent>() else {
        return Ok(());
    };
    let Some(el) = event_element(ev) else {
        return Ok(());
    };
    let Some(focus) = focus_target(s, &el)? else {
        return Ok(());
    };
    let input = KeyInput {
        key: Key::parse(&kev.key()),
        shift: kev.shift_key(),
        modified: kev.ctrl_key() || kev.alt_key() || kev.meta_key(),
    };
    let response = keyboard::handle_key(&mut s.engine, input, focus);
    if matches!(input.key, Key::Letter(_)) && !input.modified {
        // Typed letters never fall through to page shortcuts.
        ev.prevent_default();
    }
    let response = response?;
    if response.handled {
        ev.prevent_default();
    }
    if let Some(target) = response.focus {
        if let Some(el) = s.engine.surface().focus_element(target) {
            s.outbox.push(super::Effect::Focus(el));
        }
    }
    Ok(())
}

// --- native drag ------------------------------------------------------------

fn on_drag_start(s: &mut Session, ev: &Event) -> PlacementResult<()> {
    let Some(el) = event_element(ev) else {
        return Ok(());
    };
    let Some(tile_el) = closest(&el, ".tile") else {
        return Ok(());
    };
    let started = recovery::resolve_tile(&mut s.engine, tile_handle(&tile_el))
        .and_then(|tile| pointer::drag_start(&mut s.engine, tile).map(|_| tile));
    let tile = match started {
        Ok(tile) => tile,
        Err(err) => {
            ev.prevent_default();
            return Err(err);
        }
    };
    if let Some(dt) = ev.dyn_ref::<DragEvent>().and_then(DragEvent::data_transfer) {
        dt.set_effect_allowed("move");
        let _ = dt.set_data("text/plain", &tile.to_string());
    }
    Ok(())
}

fn on_drag_over(s: &mut Session, ev: &Event) -> PlacementResult<()> {
    let Some(el) = event_element(ev) else {
        return Ok(());
    };
    let Some(target) = drop_target(s, &el)? else {
        return Ok(());
    };
    if pointer::drag_over(&mut s.engine, target) {
        ev.prevent_default();
        if let Some(dt) = ev.dyn_ref::<DragEvent>().and_then(DragEvent::data_transfer) {
            dt.set_drop_effect("move");
        }
    }
    Ok(())
}

fn on_drag_leave(s: &mut Session, ev: &Event) -> PlacementResult<()> {
    let Some(el) = event_element(ev) else {
        return Ok(());
    };
    if let Some(target) = drop_target(s, &el)? {
        pointer::drag_leave(&mut s.engine, target);
    }
    Ok(())
}

fn on_drop(s: &mut Session, ev: &Event) -> PlacementResult<()> {
    ev.prevent_default();
    let Some(el) = event_element(ev) else {
        return Ok(());
    };
    let target = drop_target(s, &el)?.ok_or(PlacementError::NoTarget)?;
    pointer::drop(&mut s.engine, target)?;
    Ok(())
}

// --- touch ------------------------------------------------------------------

fn touch_point(ev: &TouchEvent) -> Option<Point> {
    let t = ev.changed_touches().get(0)?;
    Some(Point::new(f64::from(t.client_x()), f64::from(t.client_y())))
}

/// Resolve whatever sits under `at`, ignoring anything outside this puzzle.
fn hit_test(s: &mut Session, at: Point) -> PlacementResult<Option<DropTarget>> {
    let Some(el) = s.doc.element_from_point(at.x as f32, at.y as f32) else {
        return Ok(None);
    };
    let node: &Node = &el;
    if !s.engine.surface().root().contains(Some(node)) {
        return Ok(None);
    }
    drop_target(s, &el)
}

fn apply_touch_response(
    s: &mut Session,
    weak: &Weak<RefCell<Session>>,
    ev: &Event,
    response: TouchResponse,
) {
    if response.prevent_default {
        ev.prevent_default();
    }
    match response.capture_document {
        Some(true) => {
            let doc: EventTarget = s.doc.clone().into();
            for &kind in DOCUMENT_EVENTS {
                let weak = weak.clone();
                match Listener::attach(&doc, kind, true, move |ev| run(&weak, kind, &ev, true)) {
                    Ok(l) => s.doc_listeners.push(l),
                    Err(err) => debug!("document {kind} listener not attached: {err:?}"),
                }
            }
        }
        Some(false) => retire(std::mem::take(&mut s.doc_listeners)),
        None => {}
    }
}

fn on_touch_start(
    s: &mut Session,
    weak: &Weak<RefCell<Session>>,
    ev: &Event,
) -> PlacementResult<()> {
    let Some(tev) = ev.dyn_ref::<TouchEvent>() else {
        return Ok(());
    };
    if tev.touches().length() > 1 {
        // Multi-finger gestures (pinch zoom) are never drags.
        let response = touch::touch_cancel(&mut s.engine);
        apply_touch_response(s, weak, ev, response);
        return Ok(());
    }
    let Some(el) = event_element(ev) else {
        return Ok(());
    };
    let Some(tile_el) = closest(&el, ".tile") else {
        return Ok(());
    };
    let Some(at) = touch_point(tev) else {
        return Ok(());
    };
    let tile = recovery::resolve_tile(&mut s.engine, tile_handle(&tile_el))?;
    let response = touch::touch_start(&mut s.engine, tile, at)?;
    apply_touch_response(s, weak, ev, response);
    Ok(())
}

fn on_touch(
    s: &mut Session,
    weak: &Weak<RefCell<Session>>,
    kind: &str,
    ev: &Event,
) -> PlacementResult<()> {
    if kind == "touchcancel" {
        let response = touch::touch_cancel(&mut s.engine);
        apply_touch_response(s, weak, ev, response);
        return Ok(());
    }
    let Some(tev) = ev.dyn_ref::<TouchEvent>() else {
        return Ok(());
    };
    let Some(at) = touch_point(tev) else {
        return Ok(());
    };
    if s.engine.state().touch().is_none() {
        return Ok(());
    }
    let hit = hit_test(s, at).unwrap_or_else(|err| {
        debug!("hit test at {at:?} failed: {err}");
        None
    });
    if kind == "touchmove" {
        let response = touch::touch_move(&mut s.engine, at, hit);
        apply_touch_response(s, weak, ev, response);
        return Ok(());
    }
    let (response, result) = touch::touch_end(&mut s.engine, at, hit, ev.time_stamp());
    apply_touch_response(s, weak, ev, response);
    result.map(|_| ())
}
