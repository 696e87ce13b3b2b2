//! The editor controller.
//!
//! One `Editor` owns everything for a session: view state, the active tool,
//! the last snapshot, the reconciler and its surface, the command channel
//! and the inspector binding. Hosts feed it input and transport callbacks
//! and read state back; nothing lives in globals.

use crate::channel::{ChannelError, CommandChannel, ConnectionState, Transport};
use crate::commands::{HistoryState, Intent};
use crate::input::InputEvent;
use crate::inspector::{InspectorState, SelectionBinder};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync::{ReconcileReport, Reconciler};
use crate::tools::{
    Action, Actions, ConnectTool, CreateTool, DeleteTool, EditingMode, Gesture, Hit, MoveTool,
    NodeHit, Pointer, PointerPhase, Tool,
};
use pn_core::protocol::Event;
use pn_core::transform::wheel_factor;
use pn_core::{EditorConfig, Model, NodeId, NodeType, Point, Request, ViewState, to_graph_space};
use pn_render::{Surface, hit_test, hit_test_edge};
use std::collections::BTreeMap;

/// User-facing notifications the host should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved,
    /// Blocking: the session is over.
    Disconnected,
    CommandRejected { reason: String },
}

pub struct Editor<T: Transport, S: Surface> {
    config: EditorConfig,
    view: ViewState,
    mode: EditingMode,

    move_tool: MoveTool,
    place_tool: CreateTool,
    transition_tool: CreateTool,
    connect_tool: ConnectTool,
    delete_tool: DeleteTool,

    /// Last authoritative snapshot.
    model: Model,
    reconciler: Reconciler<S>,
    surface: S,
    channel: CommandChannel<T>,
    inspector: SelectionBinder,
    history: HistoryState,
    collaborators: Vec<String>,
    notices: Vec<Notice>,
}

impl<T: Transport, S: Surface> Editor<T, S> {
    pub fn new(
        config: EditorConfig,
        model_id: impl Into<String>,
        transport: T,
        mut surface: S,
    ) -> Self {
        let view = ViewState::default();
        surface.set_view(&view);
        let move_tool = if config.is_spectator() {
            MoveTool::read_only()
        } else {
            MoveTool::new()
        };
        Self {
            reconciler: Reconciler::new(config.edge_margin()),
            channel: CommandChannel::new(transport, model_id, config.role),
            config,
            view,
            mode: EditingMode::Move,
            move_tool,
            place_tool: CreateTool::new(NodeType::Place),
            transition_tool: CreateTool::new(NodeType::Transition),
            connect_tool: ConnectTool::new(),
            delete_tool: DeleteTool,
            model: Model::new(),
            surface,
            inspector: SelectionBinder::new(),
            history: HistoryState::default(),
            collaborators: Vec::new(),
            notices: Vec::new(),
        }
    }

    // ─── State ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> EditingMode {
        self.mode
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn gesture(&self) -> Gesture {
        self.move_tool.gesture()
    }

    pub fn pending_connect(&self) -> Option<NodeId> {
        self.connect_tool.pending()
    }

    /// The highlighted node. For collaborators this is also the node the
    /// inspector is bound to.
    pub fn selection(&self) -> Option<NodeId> {
        self.reconciler.highlighted()
    }

    pub fn inspector(&self) -> &InspectorState {
        self.inspector.state()
    }

    pub fn history(&self) -> HistoryState {
        self.history
    }

    pub fn collaborators(&self) -> &[String] {
        &self.collaborators
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    pub fn channel(&self) -> &CommandChannel<T> {
        &self.channel
    }

    /// Drain pending notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event. Returns true if anything happened.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y } => self.pointer(PointerPhase::Down, Point::new(*x, *y)),
            InputEvent::PointerMove { x, y } => self.pointer(PointerPhase::Move, Point::new(*x, *y)),
            InputEvent::PointerUp { x, y } => self.pointer(PointerPhase::Up, Point::new(*x, *y)),
            InputEvent::PointerLeave { x, y } => {
                self.pointer(PointerPhase::Leave, Point::new(*x, *y))
            }
            InputEvent::Wheel { delta_y } => self.wheel(*delta_y),
            InputEvent::Key {
                key,
                ctrl,
                shift,
                alt,
                meta,
            } => self.key(key, *ctrl, *shift, *alt, *meta),
        }
    }

    fn active_tool(&mut self) -> &mut dyn Tool {
        match self.mode {
            EditingMode::Move => &mut self.move_tool,
            EditingMode::CreatePlace => &mut self.place_tool,
            EditingMode::CreateTransition => &mut self.transition_tool,
            EditingMode::Connect => &mut self.connect_tool,
            EditingMode::Delete => &mut self.delete_tool,
        }
    }

    fn pointer(&mut self, phase: PointerPhase, screen: Point) -> bool {
        let graph = to_graph_space(screen, &self.view);
        let hit = if phase == PointerPhase::Down {
            self.hit_at(graph)
        } else {
            Hit::NOTHING
        };
        let actions = self.active_tool().handle(phase, Pointer { screen, graph }, &hit);
        let changed = !actions.is_empty();
        self.apply(actions);
        changed
    }

    fn hit_at(&self, graph: Point) -> Hit {
        let shapes = self.reconciler.hit_shapes();
        let node = hit_test(&shapes, graph, self.config.node_size).and_then(|id| {
            self.reconciler
                .rendered_position(id)
                .map(|center| NodeHit { id, center })
        });
        let edge = if node.is_none() && self.mode == EditingMode::Delete {
            hit_test_edge(
                self.reconciler.edge_lines(),
                graph,
                self.config.edge_hit_tolerance,
            )
        } else {
            None
        };
        Hit { node, edge }
    }

    fn apply(&mut self, actions: Actions) {
        // whether the last move intent actually reached the channel
        let mut move_sent = false;
        for action in actions {
            match action {
                Action::Emit(intent) => {
                    let is_move = matches!(intent, Intent::MoveNode { .. });
                    let sent = self.dispatch(intent);
                    if is_move {
                        move_sent = sent;
                    }
                }
                Action::Select(id) => self.select(id),
                Action::BeginDrag { id } => self.reconciler.pin(id),
                Action::PreviewMove { id, position } => {
                    self.reconciler.preview_move(id, position, &mut self.surface);
                }
                Action::EndDrag { id, committed } => {
                    // a move that was never sent snaps back like a no-op drag
                    let committed = committed && move_sent;
                    self.reconciler
                        .release(id, committed, &self.model, &mut self.surface);
                }
                Action::Pan(delta) => {
                    self.view.pan_by(delta);
                    self.surface.set_view(&self.view);
                }
            }
        }
    }

    /// Zoom by one wheel notch, anchored at the graph origin.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.zoom_by(wheel_factor(delta_y, self.config.zoom_step))
    }

    fn zoom_by(&mut self, factor: f64) -> bool {
        let before = self.view.zoom;
        self.view
            .zoom_by(factor, self.config.min_zoom, self.config.max_zoom);
        if self.view.zoom == before {
            return false;
        }
        self.surface.set_view(&self.view);
        true
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
        self.surface.set_view(&self.view);
    }

    pub fn key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return false;
        };
        log::debug!("shortcut {key:?} -> {action:?}");
        match action {
            ShortcutAction::Mode(mode) => {
                self.toggle_mode(mode);
                true
            }
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Save => self.save(),
            ShortcutAction::ClearModel => self.clear_model(),
            ShortcutAction::ZoomIn => self.zoom_by(self.config.zoom_step),
            ShortcutAction::ZoomOut => self.zoom_by(1.0 / self.config.zoom_step),
            ShortcutAction::ResetView => {
                self.reset_view();
                true
            }
        }
    }

    // ─── Modes & selection ───────────────────────────────────────────────

    /// Activate `requested`, or fall back to Move if it is already active.
    /// Any switch drops the pending connect pick, cancels the gesture and
    /// clears the selection. Spectators stay in Move.
    pub fn toggle_mode(&mut self, requested: EditingMode) -> EditingMode {
        let next = self.mode.toggled(requested);
        if self.config.is_spectator() && next != EditingMode::Move {
            log::debug!("spectators cannot enter {}", next.as_str());
            return self.mode;
        }
        let cancelled = self.active_tool().cancel();
        self.apply(cancelled);
        self.connect_tool.cancel();
        if next != self.mode {
            log::debug!("mode {} -> {}", self.mode.as_str(), next.as_str());
        }
        self.mode = next;
        self.select(None);
        self.mode
    }

    /// Select a rendered node, or clear with `None`. Unknown ids are ignored.
    pub fn select(&mut self, id: Option<NodeId>) {
        if let Some(node) = id {
            if !self.reconciler.is_rendered(node) {
                log::debug!("ignoring selection of unrendered {node}");
                return;
            }
        }
        self.reconciler.highlight(id, &mut self.surface);
        if self.config.is_spectator() {
            // watchers get no inspector replies; selection is highlight only
            self.inspector.clear();
            return;
        }
        if let Some(request) = self.inspector.select(id) {
            self.send(request);
        }
    }

    fn deselect(&mut self) {
        self.inspector.clear();
        self.connect_tool.cancel();
        self.reconciler.highlight(None, &mut self.surface);
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.dispatch(Intent::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.dispatch(Intent::Redo)
    }

    pub fn save(&mut self) -> bool {
        self.dispatch(Intent::SaveModel)
    }

    pub fn clear_model(&mut self) -> bool {
        self.dispatch(Intent::ClearModel)
    }

    /// Send inspector edits for the selected node.
    pub fn submit_properties(&mut self, fields: BTreeMap<String, serde_json::Value>) -> bool {
        match self.inspector.submit(fields) {
            Some(intent) => self.dispatch(intent),
            None => false,
        }
    }

    /// Send an intent unless the role or history forbids it. Returns true
    /// if it reached the channel.
    pub fn dispatch(&mut self, intent: Intent) -> bool {
        if self.config.is_spectator() && intent.is_mutating() {
            log::debug!("spectator: dropping {intent:?}");
            return false;
        }
        if !self.history.permits(&intent) {
            log::debug!("history unavailable: dropping {intent:?}");
            return false;
        }
        let request = intent.into_request(self.channel.model_id());
        self.send(request)
    }

    fn send(&mut self, request: Request) -> bool {
        match self.channel.send(request) {
            Ok(()) => true,
            Err(ChannelError::Disconnected) => {
                log::debug!("not sending: disconnected");
                false
            }
            Err(e) => {
                log::warn!("{e}");
                if self.channel.state() == ConnectionState::Disconnected {
                    self.notices.push(Notice::Disconnected);
                }
                false
            }
        }
    }

    // ─── Channel callbacks ───────────────────────────────────────────────

    pub fn on_open(&mut self) {
        if let Err(e) = self.channel.on_open() {
            log::warn!("{e}");
            if matches!(e, ChannelError::Transport(_)) {
                self.notices.push(Notice::Disconnected);
            }
        }
    }

    pub fn on_close(&mut self) {
        if self.channel.on_close() {
            let cancelled = self.move_tool.cancel();
            self.apply(cancelled);
            self.notices.push(Notice::Disconnected);
        }
    }

    /// Handle one inbound frame. Returns the event name if it decoded.
    pub fn on_message(&mut self, text: &str) -> Option<&'static str> {
        let event = self.channel.on_message(text)?;
        let name = event.name();
        self.apply_event(event);
        Some(name)
    }

    pub fn apply_event(&mut self, event: Event) {
        match event {
            Event::UpdateModel { model } => {
                self.apply_snapshot(Model::from_payload(model));
            }
            Event::UpdateUndoRedo { can_undo, can_redo } => {
                self.history = HistoryState { can_undo, can_redo };
            }
            Event::UpdateInspector {
                node_id,
                inspector_html,
            } => {
                self.inspector.on_inspector(node_id, inspector_html);
            }
            Event::UpdateCollaborators { collaborator_ids } => {
                log::info!("{} other collaborator(s)", collaborator_ids.len());
                self.collaborators = collaborator_ids;
            }
            Event::CloseInspector => self.deselect(),
            Event::SavedSuccess => self.notices.push(Notice::Saved),
            Event::CommandRejected { reason } => {
                log::warn!("command rejected: {reason}");
                // drop any optimistic drop position the server refused
                self.reconciler.reconcile(&self.model, &mut self.surface);
                self.notices.push(Notice::CommandRejected { reason });
            }
        }
    }

    /// Replace the authoritative model and reconcile the scene against it.
    pub fn apply_snapshot(&mut self, model: Model) -> ReconcileReport {
        self.model = model;
        let report = self
            .reconciler
            .reconcile(&self.model, &mut self.surface);

        if let Some(id) = self.move_tool.dragging() {
            if report.removed(id) {
                log::debug!("dragged node {id} was removed; cancelling drag");
                let cancelled = self.move_tool.cancel();
                self.apply(cancelled);
            }
        }
        if let Some(id) = self.connect_tool.pending() {
            if report.removed(id) {
                self.connect_tool.cancel();
            }
        }
        let present = self
            .inspector
            .selected()
            .is_some_and(|id| self.reconciler.is_rendered(id));
        if let Some(request) = self.inspector.after_snapshot(present) {
            self.send(request);
        }
        report
    }
}
