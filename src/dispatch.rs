use thiserror::Error;
use tracing::error;

use crate::environment::{Environment, TraceEntry, TypeKey};
use crate::event::{Event, EventLifecycle, EventPayload, EventPhase};
use crate::registry;
use crate::tree::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("event was never given a type")]
    NotInitialized,
    #[error("event has no target")]
    NoTarget,
    #[error("event is already mid-dispatch")]
    Redispatch,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub default_action_ran: bool,
    pub propagation_stopped: bool,
}

/// Drive one event through capture, at-target, and bubble delivery, then the
/// default action. The event is exclusively owned by this call; listeners
/// only see a borrow.
pub fn dispatch_event(
    env: &Environment,
    event: &mut Event,
) -> Result<DispatchOutcome, DispatchError> {
    if !event.is_initialized() {
        return Err(DispatchError::NotInitialized);
    }
    if event.lifecycle() == EventLifecycle::Dispatching {
        return Err(DispatchError::Redispatch);
    }
    let target = event.dispatch_target().ok_or(DispatchError::NoTarget)?;

    event.bind_thread(env.scheduler().current_thread().id());
    event.set_lifecycle(EventLifecycle::Dispatching);

    // The ancestor path is computed once per dispatch and trimmed when it
    // already starts at the target.
    let mut path = env.document().borrow().node_chain(target);
    if path.first() == Some(&target) {
        path.remove(0);
    }
    event.set_path(path.clone());

    if !event.bubbles() {
        if let Some(ty) = event.known_type() {
            let root = env.document().borrow().root();
            if target == root && registry::bubbles_from_document(ty) {
                event.set_bubbles_forced();
            }
        }
    }

    let key = TypeKey::for_event(event);

    event.set_phase(EventPhase::Capturing);
    for &ancestor in path.iter().rev() {
        deliver(env, event, ancestor, &key, Some(true));
        if event.halted() {
            break;
        }
    }

    if !event.halted() {
        event.set_phase(EventPhase::AtTarget);
        deliver(env, event, target, &key, None);
    }

    if event.bubbles() && !event.halted() {
        event.set_phase(EventPhase::Bubbling);
        for &ancestor in path.iter() {
            deliver(env, event, ancestor, &key, Some(false));
            if event.halted() {
                break;
            }
        }
    }

    event.set_phase(EventPhase::None);
    event.clear_current_target();
    event.set_lifecycle(EventLifecycle::Delivered);

    let mut default_action_ran = false;
    if !(event.cancelable() && event.default_prevented()) {
        default_action_ran = true;
        env.record(TraceEntry::DefaultAction {
            type_name: event.type_name().to_string(),
            target,
        });
        run_default_action(env, event);
    }

    if event.bumps_revision() {
        env.document().borrow().bump_revision();
    }

    Ok(DispatchOutcome {
        default_prevented: event.default_prevented(),
        default_action_ran,
        propagation_stopped: event.propagation_stopped(),
    })
}

/// Deliver to one target. `capture` of `None` means the at-target slot,
/// where every listener fires exactly once regardless of its registered
/// phase.
fn deliver(
    env: &Environment,
    event: &mut Event,
    node: NodeId,
    key: &TypeKey,
    capture: Option<bool>,
) {
    event.set_current_target(node);
    if event.halted() {
        return;
    }

    // Snapshot, so listeners can mutate the registry mid-delivery.
    let listeners = env.listeners_for(node, key, capture);
    for (group, callback) in listeners {
        if event.halted() {
            break;
        }
        if event.suppressed_for(group) {
            continue;
        }
        event.begin_group(group);
        let result = callback(env, event);
        event.end_group();
        if let Err(err) = result {
            // Reported through the host's error channel; delivery to the
            // remaining targets continues as if the listener returned.
            error!(
                target = "events",
                error = %err,
                event_type = event.type_name(),
                node,
                "listener callback failed"
            );
        }
    }
}

fn run_default_action(env: &Environment, event: &Event) {
    let result = match event.payload() {
        EventPayload::Keyboard(data) => data.default_action(env, event),
        EventPayload::Mouse(data) => data.default_action(env, event),
        _ => Ok(()),
    };
    if let Err(err) = result {
        error!(
            target = "events",
            error = %err,
            event_type = event.type_name(),
            "default action failed"
        );
    }
}
