//! Browser host: mounts puzzles into the page and wires DOM events to the
//! modality adapters.
//!
//! Each mounted puzzle is a [`Session`] in a registry keyed by its prefix, so
//! today's puzzle, an archive entry and a test board can share one page
//! without sharing interaction state. Listener closures only hold weak
//! references to their session.
//!
//! Outward notifications are `CustomEvent`s dispatched on the puzzle root:
//! `wordtiles:score`, `wordtiles:autocomplete`, `wordtiles:hint` and
//! `wordtiles:submit`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, CustomEvent, CustomEventInit, Document, Element, HtmlElement};

use crate::config::PuzzleConfig;
use crate::puzzle::recovery;
use crate::puzzle::{touch, Board, Engine, SettleTask, SlotId, WORD_COUNT};

mod listeners;
pub mod surface;

use listeners::Listener;
pub use surface::DomSurface;

pub const EVENT_SCORE: &str = "wordtiles:score";
pub const EVENT_AUTOCOMPLETE: &str = "wordtiles:autocomplete";
pub const EVENT_HINT: &str = "wordtiles:hint";
pub const EVENT_SUBMIT: &str = "wordtiles:submit";

/// Side effects run once the session borrow is released, since both can
/// re-enter the exported functions synchronously.
pub(crate) enum Effect {
    Focus(HtmlElement),
    Emit { name: &'static str, detail: JsValue },
}

pub(crate) struct Session {
    pub(crate) prefix: String,
    pub(crate) engine: Engine<DomSurface>,
    pub(crate) doc: Document,
    listeners: Vec<Listener>,
    /// Document-level touch listeners, present only while a touch drag runs.
    pub(crate) doc_listeners: Vec<Listener>,
    frame_pending: bool,
    pub(crate) outbox: Vec<Effect>,
}

impl Session {
    fn needs_frame(&self) -> bool {
        !self.frame_pending && (self.engine.is_processing() || self.engine.has_pending())
    }

    pub(crate) fn emit(&mut self, name: &'static str, detail: JsValue) {
        self.outbox.push(Effect::Emit { name, detail });
    }

    pub(crate) fn fill_json(&self) -> JsValue {
        match serde_json::to_string(&self.engine.board().fill_state()) {
            Ok(text) => JsValue::from_str(&text),
            Err(err) => {
                warn!("fill state not serializable: {err}");
                JsValue::NULL
            }
        }
    }
}

pub(crate) type SessionRef = Rc<RefCell<Session>>;

thread_local! {
    static SESSIONS: RefCell<HashMap<String, SessionRef>> = RefCell::new(HashMap::new());
}

fn to_js(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn lookup(prefix: &str) -> Result<SessionRef, JsValue> {
    SESSIONS
        .with(|m| m.borrow().get(prefix).cloned())
        .ok_or_else(|| JsValue::from_str(&format!("no puzzle mounted as {prefix:?}")))
}

// --- markup -----------------------------------------------------------------

fn render(doc: &Document, cfg: &PuzzleConfig, board: &Board) -> Result<(Element, Element), JsValue> {
    let root_id = format!("{}-root", cfg.prefix);
    let root = match doc.get_element_by_id(&root_id) {
        Some(el) => el,
        None => {
            let el = doc.create_element("div")?;
            el.set_id(&root_id);
            let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
            body.append_child(&el)?;
            el
        }
    };
    root.set_inner_html("");
    root.class_list().add_1("word-tiles")?;
    root.set_attribute("data-prefix", &cfg.prefix)?;
    root.set_attribute("data-kind", &format!("{:?}", cfg.kind).to_lowercase())?;

    let pool = doc.create_element("div")?;
    pool.set_class_name("tile-pool");
    pool.set_id(&format!("{}-pool", cfg.prefix));
    pool.set_attribute("role", "group")?;
    pool.set_attribute("aria-label", "Letter tiles")?;
    for tile in board.pool() {
        let el = surface::build_tile(doc, *tile)?;
        pool.append_child(&el)?;
    }
    root.append_child(&pool)?;

    let words = doc.create_element("div")?;
    words.set_class_name("words");
    for word in 0..WORD_COUNT {
        let row = doc.create_element("div")?;
        row.set_class_name("word");
        row.set_attribute("data-word-index", &word.to_string())?;
        row.set_attribute("role", "group")?;
        row.set_attribute("aria-label", &format!("Word {}", word + 1))?;
        for slot in board.word_slots(word) {
            let el = surface::build_slot(doc, slot.id())?;
            row.append_child(&el)?;
        }
        words.append_child(&row)?;
    }
    root.append_child(&words)?;

    let controls = doc.create_element("div")?;
    controls.set_class_name("controls");
    if cfg.hint_enabled {
        let hint = doc.create_element("button")?;
        hint.set_class_name("hint-button");
        hint.set_attribute("type", "button")?;
        hint.set_text_content(Some("Hint"));
        controls.append_child(&hint)?;
    }
    let submit = doc.create_element("button")?;
    submit.set_class_name("submit-button");
    submit.set_attribute("type", "button")?;
    submit.set_text_content(Some("Submit"));
    controls.append_child(&submit)?;
    root.append_child(&controls)?;

    Ok((root, pool))
}

// --- lifecycle --------------------------------------------------------------

/// Mount a puzzle from an already decoded configuration.
pub fn mount(cfg: PuzzleConfig) -> Result<(), JsValue> {
    cfg.validate().map_err(to_js)?;
    if SESSIONS.with(|m| m.borrow().contains_key(&cfg.prefix)) {
        unmount(&cfg.prefix)?;
    }
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let board = Board::from_config(&cfg).map_err(to_js)?;
    let (root, pool) = render(&doc, &cfg, &board)?;
    let surface = DomSurface::new(doc.clone(), root, pool);
    let engine = Engine::new(board, surface)
        .with_tuning(cfg.input)
        .with_hint(cfg.hint_enabled);

    let session = Rc::new(RefCell::new(Session {
        prefix: cfg.prefix.clone(),
        engine,
        doc,
        listeners: Vec::new(),
        doc_listeners: Vec::new(),
        frame_pending: false,
        outbox: Vec::new(),
    }));
    let installed = listeners::install(&session)?;
    session.borrow_mut().listeners = installed;
    SESSIONS.with(|m| m.borrow_mut().insert(cfg.prefix.clone(), session));
    info!("mounted puzzle {} ({:?})", cfg.prefix, cfg.kind);
    Ok(())
}

/// Tear a puzzle down: listeners, ghost, markup and registry entry.
pub fn unmount(prefix: &str) -> Result<(), JsValue> {
    let Some(session) = SESSIONS.with(|m| m.borrow_mut().remove(prefix)) else {
        return Ok(());
    };
    let mut s = session
        .try_borrow_mut()
        .map_err(|_| JsValue::from_str("puzzle is handling an event"))?;
    touch::touch_cancel(&mut s.engine);
    let mut retired = std::mem::take(&mut s.listeners);
    retired.append(&mut s.doc_listeners);
    listeners::retire(retired);
    s.engine.surface().root().set_inner_html("");
    info!("unmounted puzzle {prefix}");
    Ok(())
}

// --- deferred continuations -------------------------------------------------

/// Run after every handler: schedule the settle frame if one is needed, then
/// perform queued side effects.
pub(crate) fn after(session: &SessionRef) {
    let needs_frame = session.try_borrow().is_ok_and(|s| s.needs_frame());
    if needs_frame {
        schedule_frame(session);
    }
    flush(session);
}

fn schedule_frame(session: &SessionRef) {
    let weak = Rc::downgrade(session);
    let callback = Closure::once_into_js(move |_ts: f64| {
        if let Some(session) = weak.upgrade() {
            run_frame(&session);
        }
    });
    let scheduled = window().is_some_and(|w| {
        w.request_animation_frame(callback.unchecked_ref())
            .is_ok()
    });
    if scheduled {
        if let Ok(mut s) = session.try_borrow_mut() {
            s.frame_pending = true;
        }
    } else {
        warn!("no animation frame available, settling immediately");
        run_frame(session);
    }
}

fn run_frame(session: &SessionRef) {
    {
        let Ok(mut s) = session.try_borrow_mut() else {
            warn!("settle frame found the session busy");
            return;
        };
        s.frame_pending = false;
        for task in s.engine.settle() {
            match task {
                SettleTask::Focus(target) => {
                    if let Some(el) = s.engine.surface().focus_element(target) {
                        s.outbox.push(Effect::Focus(el));
                    }
                }
                SettleTask::UpdateScore => {
                    let detail = JsValue::from_str(&s.prefix);
                    s.emit(EVENT_SCORE, detail);
                }
                SettleTask::CheckAutoComplete => {
                    if s.engine.board().is_complete() {
                        let detail = s.fill_json();
                        s.emit(EVENT_AUTOCOMPLETE, detail);
                    }
                }
            }
        }
        let restored = recovery::audit(&mut s.engine);
        if !restored.is_empty() {
            warn!("{}: rebuilt {} lost tile(s)", s.prefix, restored.len());
        }
    }
    after(session);
}

fn flush(session: &SessionRef) {
    let (root, effects) = match session.try_borrow_mut() {
        Ok(mut s) => (
            s.engine.surface().root().clone(),
            std::mem::take(&mut s.outbox),
        ),
        Err(_) => return,
    };
    for effect in effects {
        match effect {
            Effect::Focus(el) => {
                let _ = el.focus();
            }
            Effect::Emit { name, detail } => dispatch(&root, name, &detail),
        }
    }
}

fn dispatch(root: &Element, name: &str, detail: &JsValue) {
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_detail(detail);
    match CustomEvent::new_with_event_init_dict(name, &init) {
        Ok(event) => {
            let _ = root.dispatch_event(&event);
        }
        Err(err) => warn!("could not build {name}: {err:?}"),
    }
}

/// Run `f` against a mounted session, then let deferred work proceed.
fn with_session<T>(
    prefix: &str,
    f: impl FnOnce(&mut Session) -> Result<T, JsValue>,
) -> Result<T, JsValue> {
    let session = lookup(prefix)?;
    let out = {
        let mut s = session
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("puzzle is handling an event"))?;
        f(&mut s)
    };
    after(&session);
    out
}

// --- exports ----------------------------------------------------------------

/// Mount a puzzle described by a JSON [`PuzzleConfig`].
#[wasm_bindgen]
pub fn mount_puzzle(config_json: &str) -> Result<(), JsValue> {
    let cfg = PuzzleConfig::from_json(config_json).map_err(to_js)?;
    mount(cfg)
}

#[wasm_bindgen]
pub fn unmount_puzzle(prefix: &str) -> Result<(), JsValue> {
    unmount(prefix)
}

/// Hint entry point: place `letter` into the slot and lock both.
#[wasm_bindgen]
pub fn reveal_letter(prefix: &str, word: usize, slot: usize, letter: char) -> Result<(), JsValue> {
    with_session(prefix, |s| {
        s.engine
            .reveal(SlotId::new(word, slot), letter)
            .map(|_| ())
            .map_err(to_js)
    })
}

/// Solution entry point: fill and lock both words.
#[wasm_bindgen]
pub fn lock_solution(prefix: &str, word0: &str, word1: &str) -> Result<(), JsValue> {
    with_session(prefix, |s| {
        s.engine.reveal_solution([word0, word1]).map_err(to_js)
    })
}

/// Current occupancy as JSON: `{"words":[["S",null,...],[...]]}`.
#[wasm_bindgen]
pub fn fill_state(prefix: &str) -> Result<String, JsValue> {
    with_session(prefix, |s| {
        serde_json::to_string(&s.engine.board().fill_state()).map_err(to_js)
    })
}

/// Letters of one word, `_` for empty slots.
#[wasm_bindgen]
pub fn word_text(prefix: &str, word: usize) -> Result<String, JsValue> {
    with_session(prefix, |s| {
        if word >= WORD_COUNT {
            return Err(JsValue::from_str("word index out of range"));
        }
        Ok(s.engine.board().word_text(word))
    })
}
