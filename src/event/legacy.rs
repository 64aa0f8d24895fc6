use crate::event::{Event, EventPayload, ScriptValue};
use crate::registry::EventType;
use crate::tree::{Document, NodeId};

/// Value produced by the MSIE-compatibility property surface.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyValue {
    Node(Option<NodeId>),
    Bool(bool),
    Value(ScriptValue),
}

/// Text nodes are hidden from the legacy surface: walk up from `node` until
/// something that is not a text node.
pub fn nearest_non_text(doc: &Document, node: NodeId) -> NodeId {
    let mut cursor = node;
    while doc.is_text(cursor) {
        match doc.parent(cursor) {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    cursor
}

fn is_mouse_like(event: &Event) -> bool {
    matches!(
        event.payload(),
        EventPayload::Mouse(_) | EventPayload::Drag(_)
    )
}

/// Redirect a legacy property name to its canonical one before lookup.
/// `toElement`/`fromElement` swap meaning between the enter-like and
/// leave-like mouse subtypes; everything else passes through.
pub fn redirect<'a>(event: &Event, name: &'a str) -> &'a str {
    if !is_mouse_like(event) {
        return name;
    }
    let leaving = matches!(
        event.known_type(),
        Some(EventType::MouseOut) | Some(EventType::DragLeave) | Some(EventType::DragEnd)
    );
    match name {
        "toElement" if leaving => "relatedTarget",
        "toElement" => "target",
        "fromElement" if leaving => "target",
        "fromElement" => "relatedTarget",
        other => other,
    }
}

/// Look up a property through the MSIE-compatibility surface. Node-valued
/// results are retargeted past text nodes; the true target is never
/// mutated.
pub fn property(doc: &Document, event: &Event, name: &str) -> Option<LegacyValue> {
    match redirect(event, name) {
        "srcElement" | "target" => Some(LegacyValue::Node(
            event.real_target().map(|node| nearest_non_text(doc, node)),
        )),
        "relatedTarget" => Some(LegacyValue::Node(
            event
                .payload()
                .related_target()
                .map(|node| nearest_non_text(doc, node)),
        )),
        "returnValue" => Some(LegacyValue::Value(event.legacy_return_value())),
        "cancelBubble" => Some(LegacyValue::Bool(event.propagation_stopped())),
        _ => None,
    }
}
