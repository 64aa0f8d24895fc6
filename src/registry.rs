use bitflags::bitflags;

bitflags! {
    /// Per-type metadata recorded in the static descriptor table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFlags: u16 {
        const BUBBLES = 1 << 0;
        const CANCELABLE = 1 << 1;
        /// Exposed through the legacy `on<event>` property surface.
        const REFLECTED_AS_PROPERTY = 1 << 2;
        /// Carries namespace data on the wire (the DOM mutation family).
        const NAMESPACED = 1 << 3;
        const REFLECTS_ON_ELEMENT = 1 << 4;
        const REFLECTS_ON_DOCUMENT = 1 << 5;
        const REFLECTS_ON_WINDOW = 1 << 6;
    }
}

/// Object kinds that can expose empty `on<event>` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Element,
    Document,
    Window,
}

/// Every event type the engine raises or recognizes by name. Order matches
/// `EVENT_TYPES`, which is indexed by discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum EventType {
    DomActivate,
    DomFocusIn,
    DomFocusOut,
    DomSubtreeModified,
    DomNodeInserted,
    DomNodeRemoved,
    DomNodeRemovedFromDocument,
    DomNodeInsertedIntoDocument,
    DomAttrModified,
    DomCharacterDataModified,
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseOver,
    MouseMove,
    MouseOut,
    ContextMenu,
    KeyDown,
    KeyUp,
    KeyPress,
    TextInput,
    Input,
    Change,
    Select,
    Submit,
    Reset,
    Focus,
    Blur,
    Load,
    Unload,
    Abort,
    Error,
    Resize,
    Scroll,
    Close,
    PopState,
    DragStart,
    Drag,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
    DragEnd,
    Cut,
    Copy,
    Paste,
}

#[derive(Debug, Clone, Copy)]
pub struct EventTypeDescriptor {
    pub ty: EventType,
    pub name: &'static str,
    pub flags: TypeFlags,
}

const fn descriptor(ty: EventType, name: &'static str, flags: TypeFlags) -> EventTypeDescriptor {
    EventTypeDescriptor { ty, name, flags }
}

const BUBBLES: TypeFlags = TypeFlags::BUBBLES;
const CANCELABLE: TypeFlags = TypeFlags::CANCELABLE;
const PROPERTY: TypeFlags = TypeFlags::REFLECTED_AS_PROPERTY;
const NAMESPACED: TypeFlags = TypeFlags::NAMESPACED;
const ON_ELEMENT: TypeFlags = TypeFlags::REFLECTS_ON_ELEMENT;
const ON_DOCUMENT: TypeFlags = TypeFlags::REFLECTS_ON_DOCUMENT;
const ON_WINDOW: TypeFlags = TypeFlags::REFLECTS_ON_WINDOW;

/// Process-wide immutable descriptor table, built at compile time and safe
/// to read from any cooperative context without synchronization.
pub static EVENT_TYPES: &[EventTypeDescriptor] = &[
    descriptor(
        EventType::DomActivate,
        "DOMActivate",
        BUBBLES.union(CANCELABLE),
    ),
    descriptor(EventType::DomFocusIn, "DOMFocusIn", BUBBLES),
    descriptor(EventType::DomFocusOut, "DOMFocusOut", BUBBLES),
    descriptor(
        EventType::DomSubtreeModified,
        "DOMSubtreeModified",
        BUBBLES.union(NAMESPACED),
    ),
    descriptor(
        EventType::DomNodeInserted,
        "DOMNodeInserted",
        BUBBLES.union(NAMESPACED),
    ),
    descriptor(
        EventType::DomNodeRemoved,
        "DOMNodeRemoved",
        BUBBLES.union(NAMESPACED),
    ),
    descriptor(
        EventType::DomNodeRemovedFromDocument,
        "DOMNodeRemovedFromDocument",
        NAMESPACED,
    ),
    descriptor(
        EventType::DomNodeInsertedIntoDocument,
        "DOMNodeInsertedIntoDocument",
        NAMESPACED,
    ),
    descriptor(
        EventType::DomAttrModified,
        "DOMAttrModified",
        BUBBLES.union(NAMESPACED),
    ),
    descriptor(
        EventType::DomCharacterDataModified,
        "DOMCharacterDataModified",
        BUBBLES.union(NAMESPACED),
    ),
    descriptor(
        EventType::Click,
        "click",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::DblClick,
        "dblclick",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::MouseDown,
        "mousedown",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::MouseUp,
        "mouseup",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::MouseOver,
        "mouseover",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::MouseMove,
        "mousemove",
        BUBBLES.union(PROPERTY).union(ON_ELEMENT).union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::MouseOut,
        "mouseout",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::ContextMenu,
        "contextmenu",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::KeyDown,
        "keydown",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::KeyUp,
        "keyup",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::KeyPress,
        "keypress",
        BUBBLES
            .union(CANCELABLE)
            .union(PROPERTY)
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT),
    ),
    descriptor(
        EventType::TextInput,
        "textInput",
        BUBBLES.union(CANCELABLE),
    ),
    descriptor(
        EventType::Input,
        "input",
        BUBBLES.union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Change,
        "change",
        BUBBLES.union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Select,
        "select",
        BUBBLES.union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Submit,
        "submit",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Reset,
        "reset",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Focus,
        "focus",
        PROPERTY.union(ON_ELEMENT).union(ON_WINDOW),
    ),
    descriptor(
        EventType::Blur,
        "blur",
        PROPERTY.union(ON_ELEMENT).union(ON_WINDOW),
    ),
    descriptor(
        EventType::Load,
        "load",
        PROPERTY
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT)
            .union(ON_WINDOW),
    ),
    descriptor(
        EventType::Unload,
        "unload",
        PROPERTY.union(ON_DOCUMENT).union(ON_WINDOW),
    ),
    descriptor(
        EventType::Abort,
        "abort",
        PROPERTY.union(ON_ELEMENT).union(ON_WINDOW),
    ),
    descriptor(
        EventType::Error,
        "error",
        PROPERTY
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT)
            .union(ON_WINDOW),
    ),
    descriptor(
        EventType::Resize,
        "resize",
        PROPERTY.union(ON_WINDOW),
    ),
    descriptor(
        EventType::Scroll,
        "scroll",
        PROPERTY
            .union(ON_ELEMENT)
            .union(ON_DOCUMENT)
            .union(ON_WINDOW),
    ),
    descriptor(EventType::Close, "close", TypeFlags::empty()),
    descriptor(
        EventType::PopState,
        "popstate",
        PROPERTY.union(ON_WINDOW),
    ),
    descriptor(
        EventType::DragStart,
        "dragstart",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Drag,
        "drag",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::DragEnter,
        "dragenter",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::DragOver,
        "dragover",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::DragLeave,
        "dragleave",
        BUBBLES.union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Drop,
        "drop",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::DragEnd,
        "dragend",
        BUBBLES.union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Cut,
        "cut",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Copy,
        "copy",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
    descriptor(
        EventType::Paste,
        "paste",
        BUBBLES.union(CANCELABLE).union(PROPERTY).union(ON_ELEMENT),
    ),
];

/// Non-bubbling types that are forced to bubble when dispatched with the
/// document root as their target, so document-level legacy handlers still
/// see them.
const BUBBLES_FROM_DOCUMENT: &[EventType] = &[
    EventType::Load,
    EventType::Unload,
    EventType::Abort,
    EventType::Error,
    EventType::Scroll,
];

// No registered event name falls outside this range; anything else can be
// rejected without scanning the table.
const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 32;

/// Resolve an event-type string. Constructor-style strings (`as_property ==
/// false`) match canonical names exactly and case-sensitively. Legacy
/// property strings match case-insensitively with an `on` prefix, and only
/// against types reflected as properties.
pub fn resolve(name: &str, as_property: bool) -> Option<EventType> {
    if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN {
        return None;
    }
    if as_property {
        let stripped = strip_on_prefix(name)?;
        EVENT_TYPES
            .iter()
            .find(|entry| {
                entry.flags.contains(TypeFlags::REFLECTED_AS_PROPERTY)
                    && entry.name.eq_ignore_ascii_case(stripped)
            })
            .map(|entry| entry.ty)
    } else {
        EVENT_TYPES
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.ty)
    }
}

fn strip_on_prefix(name: &str) -> Option<&str> {
    let prefix = name.get(..2)?;
    if prefix.eq_ignore_ascii_case("on") && name.len() > 2 {
        Some(&name[2..])
    } else {
        None
    }
}

pub fn flags(ty: EventType) -> TypeFlags {
    EVENT_TYPES[ty as usize].flags
}

pub fn name(ty: EventType) -> &'static str {
    EVENT_TYPES[ty as usize].name
}

/// Whether an empty `on<event>` slot must be visible on the given kind of
/// object even when nothing is listening. Pure API-shape compatibility.
pub fn reflects_on(kind: TargetKind, ty: EventType) -> bool {
    let flags = flags(ty);
    if !flags.contains(TypeFlags::REFLECTED_AS_PROPERTY) {
        return false;
    }
    match kind {
        TargetKind::Element => flags.contains(TypeFlags::REFLECTS_ON_ELEMENT),
        TargetKind::Document => flags.contains(TypeFlags::REFLECTS_ON_DOCUMENT),
        TargetKind::Window => flags.contains(TypeFlags::REFLECTS_ON_WINDOW),
    }
}

pub fn bubbles_from_document(ty: EventType) -> bool {
    BUBBLES_FROM_DOCUMENT.contains(&ty)
}
