use anyhow::Result;
use keyboard_types::Modifiers;
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::environment::Environment;
use crate::event::Event;
use crate::registry::EventType;
use crate::tree::NodeId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButton {
    #[default]
    Main,
    Auxiliary,
    Secondary,
    Fourth,
    Fifth,
}

impl MouseButton {
    pub fn code(self) -> i32 {
        match self {
            MouseButton::Main => 0,
            MouseButton::Auxiliary => 1,
            MouseButton::Secondary => 2,
            MouseButton::Fourth => 3,
            MouseButton::Fifth => 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MouseData {
    pub screen_x: f64,
    pub screen_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    pub related_target: Option<NodeId>,
    // Offset coordinates are derived from layout on demand; None means the
    // computation has not happened yet.
    offset: Option<(f64, f64)>,
}

impl MouseData {
    pub fn at(client_x: f64, client_y: f64) -> Self {
        Self {
            screen_x: client_x,
            screen_y: client_y,
            client_x,
            client_y,
            ..Self::default()
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_related_target(mut self, related: NodeId) -> Self {
        self.related_target = Some(related);
        self
    }

    pub fn offset_pending(&self) -> bool {
        self.offset.is_none()
    }

    /// Resolve offset coordinates against the target's content origin.
    pub fn resolve_offset(&mut self, origin: (f64, f64)) {
        self.offset = Some((self.client_x - origin.0, self.client_y - origin.1));
    }

    /// Offset coordinates, falling back to client coordinates while the
    /// layout-dependent computation is still pending.
    pub fn offset_coords(&self) -> (f64, f64) {
        self.offset.unwrap_or((self.client_x, self.client_y))
    }

    /// Activation: a trusted click runs the environment's activation hook on
    /// the target.
    pub(crate) fn default_action(&self, env: &Environment, event: &Event) -> Result<()> {
        if event.is_trusted() && event.is_a(EventType::Click) {
            if let Some(target) = event.target() {
                env.run_activation(target);
            }
        }
        Ok(())
    }

    pub(crate) fn insert_detail(&self, map: &mut JsonMap<String, JsonValue>) {
        map.insert("clientX".to_string(), json!(self.client_x));
        map.insert("clientY".to_string(), json!(self.client_y));
        map.insert("screenX".to_string(), json!(self.screen_x));
        map.insert("screenY".to_string(), json!(self.screen_y));
        let (offset_x, offset_y) = self.offset_coords();
        map.insert("offsetX".to_string(), json!(offset_x));
        map.insert("offsetY".to_string(), json!(offset_y));
        map.insert("button".to_string(), json!(self.button.code()));
        insert_modifier_flags(map, &self.modifiers);
    }
}

pub(crate) fn insert_modifier_flags(map: &mut JsonMap<String, JsonValue>, mods: &Modifiers) {
    map.insert("altKey".to_string(), JsonValue::Bool(mods.alt()));
    map.insert("ctrlKey".to_string(), JsonValue::Bool(mods.ctrl()));
    map.insert("metaKey".to_string(), JsonValue::Bool(mods.meta()));
    map.insert("shiftKey".to_string(), JsonValue::Bool(mods.shift()));
}
