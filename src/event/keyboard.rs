use std::rc::Rc;

use anyhow::Result;
use keyboard_types::{Key, Location, Modifiers};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::dispatch;
use crate::environment::Environment;
use crate::event::mouse::insert_modifier_flags;
use crate::event::{Event, EventPayload};
use crate::registry::EventType;

/// Raw platform key record. Shared between the keydown and the keypress it
/// synthesizes, so it sits behind an `Rc`.
#[derive(Debug, PartialEq, Eq)]
pub struct PlatformKeyData {
    pub scan_code: u32,
    pub text: Option<String>,
    pub auto_repeat: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyData {
    pub key: Key,
    pub key_code: u32,
    pub modifiers: Modifiers,
    pub repeat: bool,
    pub location: Location,
    pub platform: Option<Rc<PlatformKeyData>>,
}

impl Default for KeyData {
    fn default() -> Self {
        Self {
            key: Key::Unidentified,
            key_code: 0,
            modifiers: Modifiers::empty(),
            repeat: false,
            location: Location::Standard,
            platform: None,
        }
    }
}

impl KeyData {
    pub fn character(ch: char) -> Self {
        Self {
            key: Key::Character(ch.to_string()),
            key_code: ch as u32,
            ..Self::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_platform(mut self, platform: Rc<PlatformKeyData>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn location_code(&self) -> i32 {
        match self.location {
            Location::Standard => 0,
            Location::Left => 1,
            Location::Right => 2,
            Location::Numpad => 3,
        }
    }

    /// A trusted keydown synthesizes the matching keypress and dispatches it
    /// to the same target before anything else sees the keystroke.
    pub(crate) fn default_action(&self, env: &Environment, event: &Event) -> Result<()> {
        if !event.is_trusted() || !event.is_a(EventType::KeyDown) {
            return Ok(());
        }
        let Some(target) = event.target() else {
            return Ok(());
        };
        let mut press = Event::trusted(EventType::KeyPress, EventPayload::Keyboard(self.clone()));
        press.set_target(target);
        dispatch::dispatch_event(env, &mut press)?;
        Ok(())
    }

    pub(crate) fn insert_detail(&self, map: &mut JsonMap<String, JsonValue>) {
        insert_modifier_flags(map, &self.modifiers);
        map.insert("key".to_string(), JsonValue::String(key_label(&self.key)));
        map.insert("keyCode".to_string(), json!(self.key_code));
        map.insert("location".to_string(), json!(self.location_code()));
        map.insert("repeat".to_string(), JsonValue::Bool(self.repeat));
    }
}

fn key_label(key: &Key) -> String {
    match key {
        Key::Character(text) => text.clone(),
        other => format!("{other:?}"),
    }
}
