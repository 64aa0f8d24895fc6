use serde_json::{json, Map as JsonMap, Value as JsonValue};

/// Opaque handle to the view (window) an event was generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewId(pub u32);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiData {
    pub view: Option<ViewId>,
    pub detail: i32,
}

impl UiData {
    pub fn new(view: Option<ViewId>, detail: i32) -> Self {
        Self { view, detail }
    }

    pub(crate) fn insert_detail(&self, map: &mut JsonMap<String, JsonValue>) {
        map.insert("detail".to_string(), json!(self.detail));
        if let Some(view) = self.view {
            map.insert("view".to_string(), json!(view.0));
        }
    }
}
