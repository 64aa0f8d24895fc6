use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::tree::NodeId;

/// What happened to an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrChange {
    Modification,
    Addition,
    Removal,
}

/// The character range touched by a character-data edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditSpan {
    pub offset: usize,
    pub removed: usize,
    pub added: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MutationData {
    pub related_node: Option<NodeId>,
    pub attr_name: Option<String>,
    pub prev_value: Option<String>,
    pub new_value: Option<String>,
    pub change: Option<AttrChange>,
    pub span: Option<EditSpan>,
}

impl MutationData {
    pub fn related(node: NodeId) -> Self {
        Self {
            related_node: Some(node),
            ..Self::default()
        }
    }

    pub fn attribute(
        change: AttrChange,
        name: &str,
        prev: Option<String>,
        new: Option<String>,
    ) -> Self {
        Self {
            attr_name: Some(name.to_string()),
            prev_value: prev,
            new_value: new,
            change: Some(change),
            ..Self::default()
        }
    }

    pub fn character_data(prev: &str, new: &str, span: EditSpan) -> Self {
        Self {
            prev_value: Some(prev.to_string()),
            new_value: Some(new.to_string()),
            span: Some(span),
            ..Self::default()
        }
    }

    pub(crate) fn insert_detail(&self, map: &mut JsonMap<String, JsonValue>) {
        if let Some(related) = self.related_node {
            map.insert("relatedNode".to_string(), json!(related));
        }
        if let Some(name) = &self.attr_name {
            map.insert("attrName".to_string(), json!(name));
        }
        if let Some(prev) = &self.prev_value {
            map.insert("prevValue".to_string(), json!(prev));
        }
        if let Some(new) = &self.new_value {
            map.insert("newValue".to_string(), json!(new));
        }
        if let Some(change) = self.change {
            map.insert("attrChange".to_string(), json!(change));
        }
        if let Some(span) = self.span {
            map.insert("span".to_string(), json!(span));
        }
    }
}
