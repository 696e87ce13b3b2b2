//! WASM bridge for PN: exposes the editor core to the browser page.
//!
//! Compiled via `wasm-pack build --target web`. The page provides the SVG
//! anchors and the inspector panel; this crate wires a `WebSocket` to the
//! editor and renders into the SVG through `SvgSurface`.

mod svg;

use pn_core::{EditorConfig, NodeId};
use pn_editor::{
    ConnectionState, EditingMode, Editor, InputEvent, InspectorState, Notice, Transport,
};
use pn_render::Surface;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use svg::SvgSurface;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Element, MessageEvent, WebSocket};

pub const INSPECTOR_ID: &str = "pn-inspector";

// ─── Transport ───────────────────────────────────────────────────────────

struct SocketTransport {
    socket: WebSocket,
}

impl Transport for SocketTransport {
    fn send_text(&mut self, text: &str) -> Result<(), String> {
        self.socket
            .send_with_str(text)
            .map_err(|e| format!("{e:?}"))
    }
}

type BrowserEditor = Editor<SocketTransport, SvgSurface>;

// ─── Session ─────────────────────────────────────────────────────────────

/// State shared between the JS-facing handle and the socket callbacks.
struct Session {
    editor: RefCell<BrowserEditor>,
    inspector: Element,
    /// Markup currently in the inspector panel, to avoid clobbering edits.
    shown: RefCell<Option<String>>,
    notice_handler: RefCell<Option<js_sys::Function>>,
}

impl Session {
    fn with<R>(&self, f: impl FnOnce(&mut BrowserEditor) -> R) -> R {
        let result = f(&mut self.editor.borrow_mut());
        self.refresh();
        result
    }

    /// Push inspector and notice changes out to the page. Runs with the
    /// editor borrow released, since notice handlers may call back in.
    fn refresh(&self) {
        let (markup, notices) = {
            let mut editor = self.editor.borrow_mut();
            (inspector_markup(editor.inspector()), editor.take_notices())
        };

        if *self.shown.borrow() != markup {
            match &markup {
                Some(html) => {
                    self.inspector.set_inner_html(html);
                    if let Err(e) = self.inspector.remove_attribute("hidden") {
                        log::error!("cannot show inspector: {e:?}");
                    }
                }
                None => {
                    self.inspector.set_inner_html("");
                    if let Err(e) = self.inspector.set_attribute("hidden", "") {
                        log::error!("cannot hide inspector: {e:?}");
                    }
                }
            }
            *self.shown.borrow_mut() = markup;
        }

        if notices.is_empty() {
            return;
        }
        let handler = self.notice_handler.borrow().clone();
        for notice in notices {
            let payload = notice_json(&notice).to_string();
            match &handler {
                Some(f) => {
                    if let Err(e) = f.call1(&JsValue::NULL, &JsValue::from_str(&payload)) {
                        log::error!("notice handler failed: {e:?}");
                    }
                }
                None => log::info!("notice: {payload}"),
            }
        }
    }
}

/// Inspector panel content, or `None` when the panel is hidden.
fn inspector_markup(state: &InspectorState) -> Option<String> {
    match state {
        InspectorState::Hidden => None,
        InspectorState::Loading { node_id } => Some(format!(
            r#"<p class="pn-loading" data-node-id="{}">Loading…</p>"#,
            node_id.get()
        )),
        InspectorState::Showing { html, .. } => Some(html.clone()),
    }
}

fn notice_json(notice: &Notice) -> Value {
    match notice {
        Notice::Saved => json!({"kind": "saved"}),
        Notice::Disconnected => json!({"kind": "disconnected", "blocking": true}),
        Notice::CommandRejected { reason } => json!({"kind": "command_rejected", "reason": reason}),
    }
}

fn connection_name(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connecting => "connecting",
        ConnectionState::Open => "open",
        ConnectionState::Disconnected => "disconnected",
    }
}

fn state_json<T: Transport, S: Surface>(editor: &Editor<T, S>) -> Value {
    let view = editor.view();
    let history = editor.history();
    json!({
        "mode": editor.mode().as_str(),
        "zoom": view.zoom,
        "pan": {"x": view.pan.x, "y": view.pan.y},
        "selection": editor.selection().map(NodeId::get),
        "pending_connect": editor.pending_connect().map(NodeId::get),
        "can_undo": history.can_undo,
        "can_redo": history.can_redo,
        "collaborators": editor.collaborators(),
        "connection": connection_name(editor.connection_state()),
        "node_count": editor.model().node_count(),
        "edge_count": editor.model().edge_count(),
    })
}

// ─── JS handle ───────────────────────────────────────────────────────────

/// The browser-facing editor. One per page and session.
#[wasm_bindgen]
pub struct PnEditor {
    session: Rc<Session>,
    socket: WebSocket,
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

#[wasm_bindgen]
impl PnEditor {
    /// Connect to `url` and join `model_id`.
    ///
    /// `config_json` is a (possibly empty) `EditorConfig` object; a
    /// `log_level` field sets console verbosity. Fails if the config is
    /// invalid or a required page element is missing.
    #[wasm_bindgen(constructor)]
    pub fn new(url: &str, model_id: &str, config_json: &str) -> Result<PnEditor, JsValue> {
        console_error_panic_hook_setup();
        let level = log_level_from(config_json);
        if console_log::init_with_level(level).is_err() {
            // a logger is already installed by an earlier editor on this page
            log::set_max_level(level.to_level_filter());
        }

        let config = EditorConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e))?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let surface =
            SvgSurface::mount(&document, config.node_size).map_err(|e| JsValue::from_str(&e))?;
        let inspector = document
            .get_element_by_id(INSPECTOR_ID)
            .ok_or_else(|| JsValue::from_str(&format!("required element #{INSPECTOR_ID} is missing")))?;

        let socket = WebSocket::new(url)?;
        log::info!("connecting to {url} for {model_id}");
        let editor = Editor::new(
            config,
            model_id,
            SocketTransport {
                socket: socket.clone(),
            },
            surface,
        );
        let session = Rc::new(Session {
            editor: RefCell::new(editor),
            inspector,
            shown: RefCell::new(Some(String::new())),
            notice_handler: RefCell::new(None),
        });
        session.refresh();

        let on_open = {
            let session = Rc::clone(&session);
            Closure::<dyn FnMut()>::new(move || session.with(|ed| ed.on_open()))
        };
        let on_message = {
            let session = Rc::clone(&session);
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                match event.data().as_string() {
                    Some(text) => {
                        session.with(|ed| ed.on_message(&text));
                    }
                    None => log::warn!("ignoring non-text frame"),
                }
            })
        };
        let on_close = {
            let session = Rc::clone(&session);
            Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
                log::info!("socket closed ({}): {}", event.code(), event.reason());
                session.with(|ed| ed.on_close());
            })
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(PnEditor {
            session,
            socket,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
        })
    }

    /// Called with a JSON notice (`{"kind": ...}`) for saves, rejections
    /// and the blocking disconnect.
    pub fn set_notice_handler(&mut self, handler: js_sys::Function) {
        *self.session.notice_handler.borrow_mut() = Some(handler);
    }

    // ── Pointer & keyboard ──

    /// Handle pointer down (SVG-root pixels). Returns true if anything changed.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerDown { x, y })
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerMove { x, y })
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerUp { x, y })
    }

    pub fn pointer_leave(&mut self, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerLeave { x, y })
    }

    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.input(InputEvent::Wheel { delta_y })
    }

    /// Handle a key event. Returns true if it was bound; the host should
    /// then `preventDefault()`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        self.input(InputEvent::Key {
            key: key.to_string(),
            ctrl,
            shift,
            alt,
            meta,
        })
    }

    fn input(&mut self, event: InputEvent) -> bool {
        self.session.with(|ed| ed.handle_input(&event))
    }

    // ── Modes & selection ──

    /// Toggle a mode by name (`move`, `create_place`, `create_transition`,
    /// `connect`, `delete`). Returns the resulting mode name.
    pub fn toggle_mode(&mut self, name: &str) -> String {
        match EditingMode::parse(name) {
            Some(mode) => self.session.with(|ed| ed.toggle_mode(mode)).as_str().to_string(),
            None => {
                log::warn!("unknown mode {name:?}");
                self.get_mode()
            }
        }
    }

    pub fn get_mode(&self) -> String {
        self.session.editor.borrow().mode().as_str().to_string()
    }

    /// Select a node by id, or clear the selection with `undefined`.
    pub fn select(&mut self, node_id: Option<u32>) {
        self.session.with(|ed| ed.select(node_id.map(NodeId::new)));
    }

    /// Submit inspector edits as a JSON object of field → value.
    pub fn submit_properties(&mut self, fields_json: &str) -> Result<bool, JsValue> {
        let fields: BTreeMap<String, Value> = serde_json::from_str(fields_json)
            .map_err(|e| JsValue::from_str(&format!("invalid properties: {e}")))?;
        Ok(self.session.with(|ed| ed.submit_properties(fields)))
    }

    // ── Commands ──

    pub fn undo(&mut self) -> bool {
        self.session.with(|ed| ed.undo())
    }

    pub fn redo(&mut self) -> bool {
        self.session.with(|ed| ed.redo())
    }

    pub fn save(&mut self) -> bool {
        self.session.with(|ed| ed.save())
    }

    pub fn clear_model(&mut self) -> bool {
        self.session.with(|ed| ed.clear_model())
    }

    pub fn reset_view(&mut self) {
        self.session.with(|ed| ed.reset_view());
    }

    // ── State ──

    /// Snapshot of UI-relevant state as JSON.
    pub fn get_state_json(&self) -> String {
        let editor = self.session.editor.borrow();
        state_json(&*editor).to_string()
    }

    pub fn is_disconnected(&self) -> bool {
        self.session.editor.borrow().connection_state() == ConnectionState::Disconnected
    }
}

impl Drop for PnEditor {
    fn drop(&mut self) {
        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onclose(None);
        if let Err(e) = self.socket.close() {
            log::debug!("socket close failed: {e:?}");
        }
    }
}

/// Console verbosity from the config's `log_level`; unknown names mean `Info`.
fn log_level_from(config_json: &str) -> log::Level {
    serde_json::from_str::<Value>(config_json)
        .ok()
        .and_then(|v| {
            v.get("log_level")
                .and_then(Value::as_str)
                .and_then(|name| name.parse().ok())
        })
        .unwrap_or(log::Level::Info)
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("PN WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pn_render::RetainedScene;
    use pretty_assertions::assert_eq;

    struct Null;

    impl Transport for Null {
        fn send_text(&mut self, _text: &str) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn inspector_markup_per_state() {
        assert_eq!(inspector_markup(&InspectorState::Hidden), None);
        assert_eq!(
            inspector_markup(&InspectorState::Loading { node_id: NodeId(4) }).as_deref(),
            Some(r#"<p class="pn-loading" data-node-id="4">Loading…</p>"#)
        );
        assert_eq!(
            inspector_markup(&InspectorState::Showing {
                node_id: NodeId(4),
                html: "<form></form>".into()
            })
            .as_deref(),
            Some("<form></form>")
        );
    }

    #[test]
    fn notices_as_json() {
        assert_eq!(
            notice_json(&Notice::Disconnected),
            json!({"kind": "disconnected", "blocking": true})
        );
        assert_eq!(
            notice_json(&Notice::CommandRejected {
                reason: "nope".into()
            }),
            json!({"kind": "command_rejected", "reason": "nope"})
        );
    }

    #[test]
    fn state_snapshot() {
        let mut editor = Editor::new(EditorConfig::default(), "m", Null, RetainedScene::new());
        editor.on_open();
        editor.toggle_mode(EditingMode::Connect);
        let state = state_json(&editor);
        assert_eq!(state["mode"], json!("connect"));
        assert_eq!(state["zoom"], json!(1.0));
        assert_eq!(state["selection"], Value::Null);
        assert_eq!(state["connection"], json!("open"));
        assert_eq!(state["collaborators"], json!([]));
    }

    #[test]
    fn log_level_comes_from_config() {
        assert_eq!(log_level_from(""), log::Level::Info);
        assert_eq!(log_level_from(r#"{"log_level": "trace"}"#), log::Level::Trace);
        assert_eq!(log_level_from(r#"{"log_level": "WARN"}"#), log::Level::Warn);
        assert_eq!(log_level_from(r#"{"log_level": "chatty"}"#), log::Level::Info);
    }
}
