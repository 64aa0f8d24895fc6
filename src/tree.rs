use std::cell::Cell;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text {
        data: String,
    },
}

#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Arena-backed document tree. Node ids are stable for the life of the
/// document; removal detaches a node but never invalidates its id, so event
/// listeners can keep referring to nodes that scripts have already unplugged.
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    revision: Cell<u64>,
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            id: 0,
            parent: None,
            children: Vec::new(),
            data: NodeData::Document,
        };
        Self {
            nodes: vec![root],
            root: 0,
            revision: Cell::new(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeData::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
        })
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.push_node(NodeData::Text {
            data: data.to_string(),
        })
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id < self.nodes.len()
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id).map(|node| &node.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&child| child == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&child| child == id)?;
        siblings.get(index + 1).copied()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text { .. }))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    pub fn is_document(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Document))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text { data } => Some(data.as_str()),
            _ => None,
        }
    }

    pub fn set_text_raw(&mut self, id: NodeId, value: &str) -> bool {
        match self.nodes.get_mut(id).map(|node| &mut node.data) {
            Some(NodeData::Text { data }) => {
                *data = value.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Write an attribute without raising any notification. Returns the
    /// previous value so callers can report the change kind.
    pub fn set_attribute_raw(&mut self, id: NodeId, name: &str, value: &str) -> Option<String> {
        let node = self.nodes.get_mut(id)?;
        match &mut node.data {
            NodeData::Element { attributes, .. } => {
                for (attr, existing) in attributes.iter_mut() {
                    if attr == name {
                        return Some(std::mem::replace(existing, value.to_string()));
                    }
                }
                attributes.push((name.to_string(), value.to_string()));
                None
            }
            _ => None,
        }
    }

    pub fn remove_attribute_raw(&mut self, id: NodeId, name: &str) -> Option<String> {
        let node = self.nodes.get_mut(id)?;
        match &mut node.data {
            NodeData::Element { attributes, .. } => {
                let index = attributes.iter().position(|(attr, _)| attr == name)?;
                Some(attributes.remove(index).1)
            }
            _ => None,
        }
    }

    /// Chain from `id` up to the document root, target first. Mirrors the
    /// propagation chain the dispatch engine walks.
    pub fn node_chain(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            chain.push(node);
            cursor = self.parent(node);
        }
        chain
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Whether the node is connected to the document root.
    pub fn in_document(&self, id: NodeId) -> bool {
        id == self.root || self.is_ancestor(self.root, id)
    }

    /// Preorder traversal of `id` and its descendants.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            for &child in self.children(node).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&child| child != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    /// Splice `node` into `parent`'s child list ahead of `before`, or at the
    /// end when `before` is `None`. Structural validation is the caller's
    /// job; this only performs the edit.
    pub fn splice_before(&mut self, parent: NodeId, node: NodeId, before: Option<NodeId>) -> bool {
        let index = match before {
            Some(anchor) => {
                let Some(index) = self.children(parent).iter().position(|&c| c == anchor) else {
                    return false;
                };
                index
            }
            None => self.children(parent).len(),
        };
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        parent_node.children.insert(index, node);
        if let Some(child_node) = self.nodes.get_mut(node) {
            child_node.parent = Some(parent);
        }
        true
    }

    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn bump_revision(&self) {
        self.revision.set(self.revision.get() + 1);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
