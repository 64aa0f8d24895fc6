use std::time::Instant;

use serde_json::{json, Map as JsonMap, Value as JsonValue};
use thiserror::Error;

use crate::registry::{self, EventType, TypeFlags};
use crate::scheduler::ThreadId;
use crate::tree::NodeId;

pub mod keyboard;
pub mod legacy;
pub mod misc;
pub mod mouse;
pub mod mutation;
pub mod text;
pub mod ui;

pub use keyboard::{KeyData, PlatformKeyData};
pub use misc::{ClipboardData, CloseData, CustomData, DragData, PopStateData};
pub use mouse::{MouseButton, MouseData};
pub use mutation::{AttrChange, EditSpan, MutationData};
pub use text::TextData;
pub use ui::{UiData, ViewId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLifecycle {
    Unset,
    Initializing,
    Dispatching,
    Delivered,
}

/// Propagation-control scope. Built-in engine listeners and user-extension
/// listeners live in different groups so that one stopping propagation never
/// starves the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerGroup(pub u32);

impl ListenerGroup {
    pub const DEFAULT: ListenerGroup = ListenerGroup(0);
    pub const EXTENSION: ListenerGroup = ListenerGroup(1);
}

/// A script-side value as seen by the legacy `returnValue` surface.
/// `serde_json::Value` cannot carry NaN, which the coercion rules care
/// about, so this keeps numbers as raw f64.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(JsonValue),
}

impl ScriptValue {
    pub fn truthy(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Bool(value) => *value,
            ScriptValue::Number(value) => *value != 0.0 && !value.is_nan(),
            ScriptValue::String(value) => !value.is_empty(),
            ScriptValue::Object(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    None,
    Ui(UiData),
    Mouse(MouseData),
    Keyboard(KeyData),
    Text(TextData),
    Mutation(MutationData),
    Custom(CustomData),
    Close(CloseData),
    PopState(PopStateData),
    Drag(DragData),
    Clipboard(ClipboardData),
}

impl EventPayload {
    /// Active modifier keys, for the kinds that carry them.
    pub fn modifiers(&self) -> Option<keyboard_types::Modifiers> {
        match self {
            EventPayload::Mouse(data) => Some(data.modifiers),
            EventPayload::Keyboard(data) => Some(data.modifiers),
            EventPayload::Drag(data) => Some(data.mouse.modifiers),
            _ => None,
        }
    }

    pub fn related_target(&self) -> Option<NodeId> {
        match self {
            EventPayload::Mouse(data) => data.related_target,
            EventPayload::Drag(data) => data.mouse.related_target,
            EventPayload::Mutation(data) => data.related_node,
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct GroupStop {
    group: ListenerGroup,
    effective: bool,
}

#[derive(Debug, Clone, Default)]
struct PropagationState {
    stop_requested: bool,
    stop_effective: bool,
    group_stops: Vec<GroupStop>,
    active_group: Option<ListenerGroup>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event has already been dispatched")]
    AlreadyDispatched,
    #[error("custom event type is immutable once set")]
    TypeImmutable,
}

/// One event, owned by the call stack that dispatches it. Listeners only
/// ever see a borrow and must not keep it past their invocation.
pub struct Event {
    known: Option<EventType>,
    custom: Option<String>,
    payload: EventPayload,
    target: Option<NodeId>,
    real_target: Option<NodeId>,
    dispatch_target: Option<NodeId>,
    current_target: Option<NodeId>,
    bubbles: bool,
    cancelable: bool,
    default_prevented: bool,
    return_value: Option<ScriptValue>,
    phase: EventPhase,
    lifecycle: EventLifecycle,
    timestamp: Instant,
    trusted: bool,
    thread: Option<ThreadId>,
    path: Vec<NodeId>,
    propagation: PropagationState,
    bumps_revision: bool,
}

impl Event {
    /// A completely blank event, the state a bare script `new Event()` sits
    /// in before `initEvent`. Dispatching one of these is a caller bug.
    pub fn uninitialized() -> Self {
        Self {
            known: None,
            custom: None,
            payload: EventPayload::None,
            target: None,
            real_target: None,
            dispatch_target: None,
            current_target: None,
            bubbles: false,
            cancelable: false,
            default_prevented: false,
            return_value: None,
            phase: EventPhase::None,
            lifecycle: EventLifecycle::Unset,
            timestamp: Instant::now(),
            trusted: false,
            thread: None,
            path: Vec::new(),
            propagation: PropagationState::default(),
            bumps_revision: false,
        }
    }

    /// An engine-raised event of a registered type. Bubbling and
    /// cancelability come from the registry.
    pub fn trusted(ty: EventType, payload: EventPayload) -> Self {
        let flags = registry::flags(ty);
        let mut event = Self::uninitialized();
        event.known = Some(ty);
        event.payload = payload;
        event.bubbles = flags.contains(TypeFlags::BUBBLES);
        event.cancelable = flags.contains(TypeFlags::CANCELABLE);
        event.trusted = true;
        event.lifecycle = EventLifecycle::Initializing;
        event
    }

    /// A script-constructed event. A recognized constructor string resolves
    /// to its registered type; anything else takes the custom-type path.
    pub fn synthetic(type_name: &str, payload: EventPayload) -> Self {
        let mut event = Self::uninitialized();
        match registry::resolve(type_name, false) {
            Some(ty) => {
                let flags = registry::flags(ty);
                event.known = Some(ty);
                event.bubbles = flags.contains(TypeFlags::BUBBLES);
                event.cancelable = flags.contains(TypeFlags::CANCELABLE);
            }
            None => {
                event.custom = Some(type_name.to_string());
            }
        }
        event.payload = payload;
        event.lifecycle = EventLifecycle::Initializing;
        event
    }

    /// Pre-dispatch override for script-constructed events.
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        if self.thread.is_none() {
            self.bubbles = bubbles;
        }
        self
    }

    /// Pre-dispatch override for script-constructed events.
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        if self.thread.is_none() {
            self.cancelable = cancelable;
        }
        self
    }

    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Legacy `initEvent`. Rejected once the event has been handed to a
    /// dispatch (its thread slot is bound), and a custom type can never be
    /// replaced.
    pub fn init_event(
        &mut self,
        type_name: &str,
        bubbles: bool,
        cancelable: bool,
    ) -> Result<(), EventError> {
        if self.thread.is_some() {
            return Err(EventError::AlreadyDispatched);
        }
        if self.custom.is_some() {
            return Err(EventError::TypeImmutable);
        }
        match registry::resolve(type_name, false) {
            Some(ty) => {
                self.known = Some(ty);
                self.custom = None;
            }
            None => {
                self.known = None;
                self.custom = Some(type_name.to_string());
            }
        }
        self.bubbles = bubbles;
        self.cancelable = cancelable;
        self.lifecycle = EventLifecycle::Initializing;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.known.is_some() || self.custom.is_some()
    }

    pub fn known_type(&self) -> Option<EventType> {
        self.known
    }

    pub fn is_a(&self, ty: EventType) -> bool {
        self.known == Some(ty)
    }

    pub fn type_name(&self) -> &str {
        if let Some(ty) = self.known {
            registry::name(ty)
        } else {
            self.custom.as_deref().unwrap_or("")
        }
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut EventPayload {
        &mut self.payload
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn set_target(&mut self, target: NodeId) {
        self.target = Some(target);
    }

    /// The target legacy surfaces should report: an explicit replacement if
    /// one was installed, otherwise the nominal target. Never mutates the
    /// true target.
    pub fn real_target(&self) -> Option<NodeId> {
        self.real_target.or(self.target)
    }

    pub fn set_real_target(&mut self, target: NodeId) {
        self.real_target = Some(target);
    }

    /// Delivery root when the event is retargeted; falls back to the target.
    pub fn dispatch_target(&self) -> Option<NodeId> {
        self.dispatch_target.or(self.target)
    }

    pub fn set_dispatch_target(&mut self, target: NodeId) {
        self.dispatch_target = Some(target);
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    pub fn lifecycle(&self) -> EventLifecycle {
        self.lifecycle
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn thread(&self) -> Option<ThreadId> {
        self.thread
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    pub fn modifiers(&self) -> Option<keyboard_types::Modifiers> {
        self.payload.modifiers()
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Legacy `returnValue` write: any falsy value marks the default as
    /// prevented, any truthy value (objects included) un-marks it.
    pub fn set_legacy_return_value(&mut self, value: ScriptValue) {
        self.default_prevented = !value.truthy();
        self.return_value = Some(value);
    }

    pub fn legacy_return_value(&self) -> ScriptValue {
        self.return_value
            .clone()
            .unwrap_or(ScriptValue::Bool(!self.default_prevented))
    }

    /// Request that propagation stop. Without an active listener group the
    /// request is global; with one it is scoped to that group so other
    /// groups still traversing the path are unaffected. Immediate requests
    /// also suppress the remaining listeners on the current target; deferred
    /// ones take hold when the engine advances to the next target.
    pub fn stop_propagation(&mut self, immediate: bool) {
        match self.propagation.active_group {
            Some(group) => {
                let stops = &mut self.propagation.group_stops;
                match stops.iter_mut().find(|stop| stop.group == group) {
                    Some(stop) => stop.effective |= immediate,
                    None => stops.push(GroupStop {
                        group,
                        effective: immediate,
                    }),
                }
            }
            None => {
                self.propagation.stop_requested = true;
                if immediate {
                    self.propagation.stop_effective = true;
                }
            }
        }
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation.stop_requested
            || self.propagation.stop_effective
            || !self.propagation.group_stops.is_empty()
    }

    /// The single place where deferred stops, global and per-group, are
    /// promoted to effective. Promotions are never revoked.
    pub(crate) fn set_current_target(&mut self, node: NodeId) {
        if self.propagation.stop_requested {
            self.propagation.stop_effective = true;
        }
        for stop in &mut self.propagation.group_stops {
            stop.effective = true;
        }
        self.current_target = Some(node);
    }

    /// Global stop in force: no listener on any remaining target may run.
    pub(crate) fn halted(&self) -> bool {
        self.propagation.stop_effective
    }

    /// Whether delivery to a listener of `group` is suppressed right now.
    pub(crate) fn suppressed_for(&self, group: ListenerGroup) -> bool {
        if self.propagation.stop_effective {
            return true;
        }
        self.propagation
            .group_stops
            .iter()
            .any(|stop| stop.group == group && stop.effective)
    }

    pub(crate) fn begin_group(&mut self, group: ListenerGroup) {
        self.propagation.active_group = Some(group);
    }

    pub(crate) fn end_group(&mut self) {
        self.propagation.active_group = None;
    }

    pub(crate) fn bind_thread(&mut self, thread: ThreadId) {
        self.thread = Some(thread);
    }

    pub(crate) fn set_phase(&mut self, phase: EventPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_lifecycle(&mut self, lifecycle: EventLifecycle) {
        self.lifecycle = lifecycle;
    }

    pub(crate) fn set_bubbles_forced(&mut self) {
        self.bubbles = true;
    }

    pub(crate) fn set_path(&mut self, path: Vec<NodeId>) {
        self.path = path;
    }

    pub(crate) fn clear_current_target(&mut self) {
        self.current_target = None;
    }

    pub(crate) fn set_bumps_revision(&mut self) {
        self.bumps_revision = true;
    }

    pub(crate) fn bumps_revision(&self) -> bool {
        self.bumps_revision
    }

    /// Flat JSON view of the event, the shape a script bridge would hand to
    /// listeners.
    pub fn detail(&self) -> JsonValue {
        let mut map = JsonMap::new();
        map.insert("type".to_string(), json!(self.type_name()));
        map.insert("bubbles".to_string(), JsonValue::Bool(self.bubbles));
        map.insert("cancelable".to_string(), JsonValue::Bool(self.cancelable));
        map.insert("isTrusted".to_string(), JsonValue::Bool(self.trusted));

        match &self.payload {
            EventPayload::None => {}
            EventPayload::Ui(data) => data.insert_detail(&mut map),
            EventPayload::Mouse(data) => data.insert_detail(&mut map),
            EventPayload::Keyboard(data) => data.insert_detail(&mut map),
            EventPayload::Text(data) => {
                map.insert("data".to_string(), json!(data.data));
            }
            EventPayload::Mutation(data) => data.insert_detail(&mut map),
            EventPayload::Custom(data) => {
                map.insert("detail".to_string(), data.detail.clone());
            }
            EventPayload::Close(data) => {
                map.insert("code".to_string(), json!(data.code));
                map.insert("reason".to_string(), json!(data.reason));
                map.insert("wasClean".to_string(), JsonValue::Bool(data.was_clean));
            }
            EventPayload::PopState(data) => {
                map.insert("state".to_string(), data.state.clone());
            }
            EventPayload::Drag(data) => {
                data.mouse.insert_detail(&mut map);
                map.insert("dataTransfer".to_string(), data.data_transfer.clone());
            }
            EventPayload::Clipboard(data) => {
                map.insert("clipboardData".to_string(), data.data.clone());
            }
        }

        JsonValue::Object(map)
    }
}
