use serde::Serialize;

/// Payload of generated-text events (`textInput` and friends).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextData {
    pub data: String,
}

impl TextData {
    pub fn new(data: &str) -> Self {
        Self {
            data: data.to_string(),
        }
    }
}
