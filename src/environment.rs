use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::dispatch::{self, DispatchError, DispatchOutcome};
use crate::event::{Event, EventPayload, ListenerGroup};
use crate::registry::EventType;
use crate::scheduler::{Scheduler, ScriptThread};
use crate::tree::{Document, NodeId};

/// Key a listener is registered under: a known type or a custom type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Known(EventType),
    Custom(String),
}

impl From<EventType> for TypeKey {
    fn from(ty: EventType) -> Self {
        TypeKey::Known(ty)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        match crate::registry::resolve(name, false) {
            Some(ty) => TypeKey::Known(ty),
            None => TypeKey::Custom(name.to_string()),
        }
    }
}

impl TypeKey {
    pub(crate) fn for_event(event: &Event) -> Self {
        match event.known_type() {
            Some(ty) => TypeKey::Known(ty),
            None => TypeKey::Custom(event.type_name().to_string()),
        }
    }
}

pub type ListenerCallback = Rc<dyn Fn(&Environment, &mut Event) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

pub(crate) struct ListenerEntry {
    id: ListenerId,
    key: TypeKey,
    capture: bool,
    group: ListenerGroup,
    callback: ListenerCallback,
}

impl ListenerEntry {
    pub(crate) fn capture(&self) -> bool {
        self.capture
    }

    pub(crate) fn group(&self) -> ListenerGroup {
        self.group
    }

    pub(crate) fn callback(&self) -> ListenerCallback {
        Rc::clone(&self.callback)
    }
}

/// One record per default-action invocation or mutation-notification send,
/// in the exact order they happened. Observers drain the log; entries are
/// never read back by the engine itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEntry {
    DefaultAction {
        type_name: String,
        target: NodeId,
    },
    Notified {
        ty: EventType,
        target: NodeId,
        payload: EventPayload,
    },
    Activated {
        target: NodeId,
    },
}

/// The listener/dispatch environment: owns the document, the listener
/// registry, and the observation trace, and fronts the scheduler.
pub struct Environment {
    document: Rc<RefCell<Document>>,
    scheduler: Rc<Scheduler>,
    listeners: RefCell<HashMap<NodeId, Vec<ListenerEntry>>>,
    type_counts: RefCell<HashMap<TypeKey, usize>>,
    next_listener_id: Cell<u64>,
    enabled: Cell<bool>,
    trace: RefCell<Vec<TraceEntry>>,
    activation: RefCell<Option<Box<dyn Fn(&Environment, NodeId)>>>,
}

impl Environment {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            document: Rc::new(RefCell::new(Document::new())),
            scheduler: Scheduler::new(),
            listeners: RefCell::new(HashMap::new()),
            type_counts: RefCell::new(HashMap::new()),
            next_listener_id: Cell::new(1),
            enabled: Cell::new(true),
            trace: RefCell::new(Vec::new()),
            activation: RefCell::new(None),
        })
    }

    pub fn document(&self) -> Rc<RefCell<Document>> {
        Rc::clone(&self.document)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn add_listener(
        &self,
        node: NodeId,
        key: impl Into<TypeKey>,
        capture: bool,
        group: ListenerGroup,
        callback: ListenerCallback,
    ) -> ListenerId {
        let key = key.into();
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id.set(id.0 + 1);

        *self.type_counts.borrow_mut().entry(key.clone()).or_insert(0) += 1;
        self.listeners
            .borrow_mut()
            .entry(node)
            .or_default()
            .push(ListenerEntry {
                id,
                key,
                capture,
                group,
                callback,
            });
        id
    }

    pub fn remove_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(&node) else {
            return false;
        };
        let Some(index) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let entry = entries.remove(index);
        drop(listeners);

        let mut counts = self.type_counts.borrow_mut();
        if let Some(count) = counts.get_mut(&entry.key) {
            *count -= 1;
            if *count == 0 {
                counts.remove(&entry.key);
            }
        }
        true
    }

    pub fn has_listener(&self, node: NodeId, key: impl Into<TypeKey>) -> bool {
        let key = key.into();
        self.listeners
            .borrow()
            .get(&node)
            .map(|entries| entries.iter().any(|entry| entry.key == key))
            .unwrap_or(false)
    }

    /// O(1) pre-check: is anything, anywhere, listening for this type?
    pub fn has_any_listener(&self, key: impl Into<TypeKey>) -> bool {
        self.type_counts.borrow().contains_key(&key.into())
    }

    /// Snapshot of the listener callbacks to run on `node` for `event` in
    /// the given phase slot. A snapshot so listeners can add and remove
    /// listeners re-entrantly without invalidating the iteration.
    pub(crate) fn listeners_for(
        &self,
        node: NodeId,
        key: &TypeKey,
        capture: Option<bool>,
    ) -> Vec<(ListenerGroup, ListenerCallback)> {
        self.listeners
            .borrow()
            .get(&node)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.key == *key)
                    .filter(|entry| capture.map_or(true, |wanted| entry.capture() == wanted))
                    .map(|entry| (entry.group(), entry.callback()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deliver an event through the propagation engine. When the caller is a
    /// resumable mutation algorithm, `interrupting` names the script thread
    /// whose blocked state decides whether that algorithm must suspend.
    pub fn send_event(
        &self,
        event: &mut Event,
        interrupting: Option<&ScriptThread>,
    ) -> Result<SendOutcome, DispatchError> {
        let dispatch = dispatch::dispatch_event(self, event)?;
        let thread_blocked = match interrupting {
            Some(thread) => thread.is_blocked(),
            None => self.scheduler.current_thread().is_blocked(),
        };
        Ok(SendOutcome {
            dispatch,
            thread_blocked,
        })
    }

    pub fn set_activation_hook(&self, hook: Box<dyn Fn(&Environment, NodeId)>) {
        *self.activation.borrow_mut() = Some(hook);
    }

    pub(crate) fn run_activation(&self, target: NodeId) {
        self.record(TraceEntry::Activated { target });
        if let Some(hook) = self.activation.borrow().as_ref() {
            hook(self, target);
        }
    }

    pub(crate) fn record(&self, entry: TraceEntry) {
        self.trace.borrow_mut().push(entry);
    }

    /// Drain the observation trace, oldest entry first.
    pub fn drain_trace(&self) -> Vec<TraceEntry> {
        let mut drained = Vec::new();
        std::mem::swap(&mut drained, &mut *self.trace.borrow_mut());
        drained
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SendOutcome {
    pub dispatch: DispatchOutcome,
    /// True when the interrogated script thread is blocked, which obliges a
    /// resumable caller to suspend rather than finish.
    pub thread_blocked: bool,
}
