use serde_json::Value as JsonValue;

use crate::event::mouse::MouseData;

/// Script-defined event payload, an opaque value threaded through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomData {
    pub detail: JsonValue,
}

impl CustomData {
    pub fn new(detail: JsonValue) -> Self {
        Self { detail }
    }
}

/// History traversal payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopStateData {
    pub state: JsonValue,
}

impl PopStateData {
    pub fn new(state: JsonValue) -> Self {
        Self { state }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseData {
    pub code: u16,
    pub reason: String,
    pub was_clean: bool,
}

/// Drag events extend the mouse payload with a data-transfer value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragData {
    pub mouse: MouseData,
    pub data_transfer: JsonValue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardData {
    pub data: JsonValue,
}
