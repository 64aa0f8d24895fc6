use crate::dispatch::DispatchError;
use crate::environment::{Environment, TraceEntry};
use crate::event::{AttrChange, EditSpan, Event, EventPayload, MutationData};
use crate::registry::EventType;
use crate::scheduler::ScriptThread;
use crate::tree::NodeId;

/// Result of a notification attempt, as seen by the resumable mutation
/// algorithms that raise them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyOutcome {
    pub delivered: bool,
    /// The interrogated script thread is blocked; the caller must suspend.
    pub must_suspend: bool,
}

/// Build a mutation event for `ty` targeted at `target`, or `None` cheaply
/// when the environment is disabled or nothing anywhere listens for it.
pub fn maybe_build(env: &Environment, ty: EventType, target: NodeId) -> Option<Event> {
    if !env.is_enabled() {
        return None;
    }
    if !env.has_any_listener(ty) {
        return None;
    }
    let mut event = Event::trusted(ty, EventPayload::Mutation(MutationData::default()));
    event.set_target(target);
    event.set_bumps_revision();
    Some(event)
}

/// Dispatch a previously built notification; a no-op when `maybe_build`
/// declined to build one.
pub fn send(
    env: &Environment,
    event: Option<Event>,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    let Some(mut event) = event else {
        return Ok(NotifyOutcome::default());
    };
    if let (Some(ty), Some(target)) = (event.known_type(), event.target()) {
        env.record(TraceEntry::Notified {
            ty,
            target,
            payload: event.payload().clone(),
        });
    }
    let outcome = env.send_event(&mut event, interrupting)?;
    Ok(NotifyOutcome {
        delivered: true,
        must_suspend: outcome.thread_blocked,
    })
}

fn send_with_payload(
    env: &Environment,
    ty: EventType,
    target: NodeId,
    data: MutationData,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    let event = maybe_build(env, ty, target).map(|mut event| {
        *event.payload_mut() = EventPayload::Mutation(data);
        event
    });
    send(env, event, interrupting)
}

pub fn subtree_modified(
    env: &Environment,
    target: NodeId,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    send_with_payload(
        env,
        EventType::DomSubtreeModified,
        target,
        MutationData::default(),
        interrupting,
    )
}

pub fn node_inserted(
    env: &Environment,
    node: NodeId,
    parent: NodeId,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    send_with_payload(
        env,
        EventType::DomNodeInserted,
        node,
        MutationData::related(parent),
        interrupting,
    )
}

pub fn node_removed(
    env: &Environment,
    node: NodeId,
    parent: NodeId,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    send_with_payload(
        env,
        EventType::DomNodeRemoved,
        node,
        MutationData::related(parent),
        interrupting,
    )
}

pub fn node_removed_from_document(
    env: &Environment,
    node: NodeId,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    send_with_payload(
        env,
        EventType::DomNodeRemovedFromDocument,
        node,
        MutationData::default(),
        interrupting,
    )
}

pub fn node_inserted_into_document(
    env: &Environment,
    node: NodeId,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    send_with_payload(
        env,
        EventType::DomNodeInsertedIntoDocument,
        node,
        MutationData::default(),
        interrupting,
    )
}

pub fn attribute_modified(
    env: &Environment,
    element: NodeId,
    change: AttrChange,
    name: &str,
    prev: Option<String>,
    new: Option<String>,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    send_with_payload(
        env,
        EventType::DomAttrModified,
        element,
        MutationData::attribute(change, name, prev, new),
        interrupting,
    )
}

pub fn character_data_modified(
    env: &Environment,
    node: NodeId,
    prev: &str,
    new: &str,
    span: EditSpan,
    interrupting: Option<&ScriptThread>,
) -> Result<NotifyOutcome, DispatchError> {
    send_with_payload(
        env,
        EventType::DomCharacterDataModified,
        node,
        MutationData::character_data(prev, new, span),
        interrupting,
    )
}
