use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::environment::Environment;
use crate::event::{AttrChange, EditSpan};
use crate::notify;
use crate::resume::{Continuation, OpOutcome, OpValue, ResumeError};
use crate::tree::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("offset is out of range")]
    IndexSize,
    #[error("node cannot be placed at this point in the hierarchy")]
    HierarchyRequest,
    #[error("node not found where expected")]
    NotFound,
    #[error("operation applied to the wrong kind of node")]
    WrongNodeKind,
    /// Script that ran during a suspension changed the tree shape the
    /// operation depended on. Always fatal, never retried.
    #[error("tree shape changed while the operation was suspended")]
    StructureInvalidated,
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Resume(#[from] ResumeError),
}

/// Externally stored per-operation state: one variant per operation kind,
/// each holding exactly the operands its next step needs.
pub(crate) enum OpState {
    InsertBefore(InsertBeforeOp),
    RemoveChild(RemoveChildOp),
    ReplaceData(ReplaceDataOp),
    SplitText(SplitTextOp),
    ReplaceWholeText(ReplaceWholeTextOp),
    AttributeWrite(AttributeWriteOp),
}

/// Resume dispatch: route the record back to its operation's step loop.
pub(crate) fn step(env: &Environment, state: OpState) -> Result<OpOutcome, OpError> {
    match state {
        OpState::InsertBefore(op) => step_insert_before(env, op),
        OpState::RemoveChild(op) => step_remove_child(env, op),
        OpState::ReplaceData(op) => step_replace_data(env, op),
        OpState::SplitText(op) => step_split_text(env, op),
        OpState::ReplaceWholeText(op) => step_replace_whole_text(env, op),
        OpState::AttributeWrite(op) => step_attribute_write(env, op),
    }
}

fn suspended(state: OpState) -> Result<OpOutcome, OpError> {
    Ok(OpOutcome::Suspended(Continuation::new(state)))
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

// ---------------------------------------------------------------------------
// insert_before

pub(crate) struct InsertBeforeOp {
    node: NodeId,
    parent: NodeId,
    stage: InsertStage,
}

enum InsertStage {
    NodeInserted,
    IntoDocument { queue: Vec<NodeId>, next: usize },
    SubtreeModified,
    Finished,
}

/// Insert `node` under `parent` ahead of `before` (append when `None`),
/// then raise the insertion notifications. Suspends if a notification
/// leaves the script thread blocked.
pub fn insert_before(
    env: &Environment,
    parent: NodeId,
    node: NodeId,
    before: Option<NodeId>,
) -> Result<OpOutcome, OpError> {
    {
        let doc = env.document();
        let mut doc = doc.borrow_mut();
        if !doc.is_element(parent) && !doc.is_document(parent) {
            return Err(OpError::WrongNodeKind);
        }
        if !doc.contains_node(node) {
            return Err(OpError::NotFound);
        }
        if node == parent || doc.is_ancestor(node, parent) {
            return Err(OpError::HierarchyRequest);
        }
        if let Some(anchor) = before {
            if doc.parent(anchor) != Some(parent) {
                return Err(OpError::NotFound);
            }
        }
        doc.detach(node);
        if !doc.splice_before(parent, node, before) {
            return Err(OpError::NotFound);
        }
    }
    step_insert_before(
        env,
        InsertBeforeOp {
            node,
            parent,
            stage: InsertStage::NodeInserted,
        },
    )
}

fn step_insert_before(env: &Environment, op: InsertBeforeOp) -> Result<OpOutcome, OpError> {
    let InsertBeforeOp {
        node,
        parent,
        mut stage,
    } = op;
    loop {
        stage = match stage {
            InsertStage::NodeInserted => {
                let outcome = notify::node_inserted(env, node, parent, None)?;
                // The descendant list is captured after the insertion event,
                // so listeners that reshape the new subtree are honored.
                let queue = {
                    let doc = env.document();
                    let doc = doc.borrow();
                    if doc.in_document(node) {
                        doc.subtree(node)
                    } else {
                        Vec::new()
                    }
                };
                let next_stage = InsertStage::IntoDocument { queue, next: 0 };
                if outcome.must_suspend {
                    return suspended(OpState::InsertBefore(InsertBeforeOp {
                        node,
                        parent,
                        stage: next_stage,
                    }));
                }
                next_stage
            }
            InsertStage::IntoDocument { queue, mut next } => {
                while next < queue.len() {
                    let descendant = queue[next];
                    next += 1;
                    let outcome = notify::node_inserted_into_document(env, descendant, None)?;
                    if outcome.must_suspend {
                        return suspended(OpState::InsertBefore(InsertBeforeOp {
                            node,
                            parent,
                            stage: InsertStage::IntoDocument { queue, next },
                        }));
                    }
                }
                InsertStage::SubtreeModified
            }
            InsertStage::SubtreeModified => {
                let outcome = notify::subtree_modified(env, parent, None)?;
                if outcome.must_suspend {
                    return suspended(OpState::InsertBefore(InsertBeforeOp {
                        node,
                        parent,
                        stage: InsertStage::Finished,
                    }));
                }
                InsertStage::Finished
            }
            InsertStage::Finished => return Ok(OpOutcome::Complete(OpValue::Node(node))),
        };
    }
}

// ---------------------------------------------------------------------------
// remove_child

pub(crate) struct RemoveChildOp {
    parent: NodeId,
    child: NodeId,
    stage: RemoveStage,
}

enum RemoveStage {
    NodeRemoved,
    FromDocument { queue: Vec<NodeId>, next: usize },
    Detach,
    SubtreeModified,
    Finished,
}

/// Remove `child` from `parent`. The removal notifications fire while the
/// child is still in place, so listeners observe the pre-removal tree.
pub fn remove_child(env: &Environment, parent: NodeId, child: NodeId) -> Result<OpOutcome, OpError> {
    {
        let doc = env.document();
        let doc = doc.borrow();
        if doc.parent(child) != Some(parent) {
            return Err(OpError::NotFound);
        }
    }
    step_remove_child(
        env,
        RemoveChildOp {
            parent,
            child,
            stage: RemoveStage::NodeRemoved,
        },
    )
}

fn step_remove_child(env: &Environment, op: RemoveChildOp) -> Result<OpOutcome, OpError> {
    let RemoveChildOp {
        parent,
        child,
        mut stage,
    } = op;
    loop {
        stage = match stage {
            RemoveStage::NodeRemoved => {
                let outcome = notify::node_removed(env, child, parent, None)?;
                let queue = {
                    let doc = env.document();
                    let doc = doc.borrow();
                    if doc.in_document(child) {
                        doc.subtree(child)
                    } else {
                        Vec::new()
                    }
                };
                let next_stage = RemoveStage::FromDocument { queue, next: 0 };
                if outcome.must_suspend {
                    return suspended(OpState::RemoveChild(RemoveChildOp {
                        parent,
                        child,
                        stage: next_stage,
                    }));
                }
                next_stage
            }
            RemoveStage::FromDocument { queue, mut next } => {
                while next < queue.len() {
                    let descendant = queue[next];
                    next += 1;
                    let outcome = notify::node_removed_from_document(env, descendant, None)?;
                    if outcome.must_suspend {
                        return suspended(OpState::RemoveChild(RemoveChildOp {
                            parent,
                            child,
                            stage: RemoveStage::FromDocument { queue, next },
                        }));
                    }
                }
                RemoveStage::Detach
            }
            RemoveStage::Detach => {
                let doc = env.document();
                let mut doc = doc.borrow_mut();
                // A listener may have detached or reparented the child while
                // the pre-removal notifications ran.
                if doc.parent(child) != Some(parent) {
                    return Err(OpError::NotFound);
                }
                doc.detach(child);
                drop(doc);
                RemoveStage::SubtreeModified
            }
            RemoveStage::SubtreeModified => {
                let outcome = notify::subtree_modified(env, parent, None)?;
                if outcome.must_suspend {
                    return suspended(OpState::RemoveChild(RemoveChildOp {
                        parent,
                        child,
                        stage: RemoveStage::Finished,
                    }));
                }
                RemoveStage::Finished
            }
            RemoveStage::Finished => return Ok(OpOutcome::Complete(OpValue::Node(child))),
        };
    }
}

// ---------------------------------------------------------------------------
// replace_data

pub(crate) struct ReplaceDataOp {
    node: NodeId,
    prev: String,
    new: String,
    span: EditSpan,
    stage: CharDataStage,
}

enum CharDataStage {
    Notify,
    Finished,
}

/// Splice `data` into a text node's content over `count` characters at
/// `offset`, then raise the character-data notification.
pub fn replace_data(
    env: &Environment,
    node: NodeId,
    offset: usize,
    count: usize,
    data: &str,
) -> Result<OpOutcome, OpError> {
    let (prev, new, span) = {
        let doc = env.document();
        let mut doc = doc.borrow_mut();
        let text = doc.text(node).ok_or(OpError::WrongNodeKind)?.to_string();
        let char_len = text.chars().count();
        if offset > char_len {
            return Err(OpError::IndexSize);
        }
        let count = count.min(char_len - offset);
        let start = byte_offset(&text, offset);
        let end = byte_offset(&text, offset + count);
        let mut new = String::with_capacity(text.len() + data.len());
        new.push_str(&text[..start]);
        new.push_str(data);
        new.push_str(&text[end..]);
        doc.set_text_raw(node, &new);
        (
            text,
            new,
            EditSpan {
                offset,
                removed: count,
                added: data.chars().count(),
            },
        )
    };
    step_replace_data(
        env,
        ReplaceDataOp {
            node,
            prev,
            new,
            span,
            stage: CharDataStage::Notify,
        },
    )
}

fn step_replace_data(env: &Environment, op: ReplaceDataOp) -> Result<OpOutcome, OpError> {
    let ReplaceDataOp {
        node,
        prev,
        new,
        span,
        mut stage,
    } = op;
    loop {
        stage = match stage {
            CharDataStage::Notify => {
                let outcome = notify::character_data_modified(env, node, &prev, &new, span, None)?;
                if outcome.must_suspend {
                    return suspended(OpState::ReplaceData(ReplaceDataOp {
                        node,
                        prev,
                        new,
                        span,
                        stage: CharDataStage::Finished,
                    }));
                }
                CharDataStage::Finished
            }
            CharDataStage::Finished => return Ok(OpOutcome::Complete(OpValue::Unit)),
        };
    }
}

// ---------------------------------------------------------------------------
// split_text

pub(crate) struct SplitTextOp {
    node: NodeId,
    tail: NodeId,
    parent: Option<NodeId>,
    offset: usize,
    stage: SplitStage,
}

enum SplitStage {
    Inserting(Box<Continuation>),
    Shorten,
    Shortening(Box<Continuation>),
    Finished,
}

/// Split a text node at a character offset: the tail of its content moves
/// into a new sibling inserted immediately after it, then the original is
/// shortened. Both steps are nested resumable operations; re-entry checks
/// that script run during a suspension left the split site intact.
pub fn split_text(env: &Environment, node: NodeId, offset: usize) -> Result<OpOutcome, OpError> {
    let (tail, parent, before) = {
        let doc = env.document();
        let mut doc = doc.borrow_mut();
        let text = doc.text(node).ok_or(OpError::WrongNodeKind)?.to_string();
        if offset > text.chars().count() {
            return Err(OpError::IndexSize);
        }
        let tail_text = text[byte_offset(&text, offset)..].to_string();
        let tail = doc.create_text(&tail_text);
        (tail, doc.parent(node), doc.next_sibling(node))
    };

    if let Some(parent) = parent {
        match insert_before(env, parent, tail, before)? {
            OpOutcome::Suspended(inner) => {
                return suspended(OpState::SplitText(SplitTextOp {
                    node,
                    tail,
                    parent: Some(parent),
                    offset,
                    stage: SplitStage::Inserting(Box::new(inner)),
                }));
            }
            OpOutcome::Complete(_) => {}
        }
    }

    step_split_text(
        env,
        SplitTextOp {
            node,
            tail,
            parent,
            offset,
            stage: SplitStage::Shorten,
        },
    )
}

fn step_split_text(env: &Environment, op: SplitTextOp) -> Result<OpOutcome, OpError> {
    let SplitTextOp {
        node,
        tail,
        parent,
        offset,
        mut stage,
    } = op;
    loop {
        stage = match stage {
            SplitStage::Inserting(mut inner) => match inner.resume(env)? {
                OpOutcome::Suspended(again) => {
                    return suspended(OpState::SplitText(SplitTextOp {
                        node,
                        tail,
                        parent,
                        offset,
                        stage: SplitStage::Inserting(Box::new(again)),
                    }));
                }
                OpOutcome::Complete(_) => SplitStage::Shorten,
            },
            SplitStage::Shorten => {
                let remaining = {
                    let doc = env.document();
                    let doc = doc.borrow();
                    if let Some(parent) = parent {
                        // Listeners fired by the insertion may have moved or
                        // removed either half of the split.
                        if doc.parent(node) != Some(parent)
                            || doc.parent(tail) != Some(parent)
                            || doc.next_sibling(node) != Some(tail)
                        {
                            return Err(OpError::StructureInvalidated);
                        }
                    }
                    let text = doc.text(node).ok_or(OpError::StructureInvalidated)?;
                    let char_len = text.chars().count();
                    if char_len < offset {
                        return Err(OpError::StructureInvalidated);
                    }
                    char_len - offset
                };
                match replace_data(env, node, offset, remaining, "")? {
                    OpOutcome::Suspended(inner) => {
                        return suspended(OpState::SplitText(SplitTextOp {
                            node,
                            tail,
                            parent,
                            offset,
                            stage: SplitStage::Shortening(Box::new(inner)),
                        }));
                    }
                    OpOutcome::Complete(_) => SplitStage::Finished,
                }
            }
            SplitStage::Shortening(mut inner) => match inner.resume(env)? {
                OpOutcome::Suspended(again) => {
                    return suspended(OpState::SplitText(SplitTextOp {
                        node,
                        tail,
                        parent,
                        offset,
                        stage: SplitStage::Shortening(Box::new(again)),
                    }));
                }
                OpOutcome::Complete(_) => SplitStage::Finished,
            },
            SplitStage::Finished => return Ok(OpOutcome::Complete(OpValue::Node(tail))),
        };
    }
}

// ---------------------------------------------------------------------------
// replace_whole_text

pub(crate) struct ReplaceWholeTextOp {
    node: NodeId,
    content: String,
    targets: Vec<NodeId>,
    next: usize,
    stage: WholeTextStage,
}

enum WholeTextStage {
    SetContent,
    SettingContent(Box<Continuation>),
    RemoveSiblings,
    RemovingSibling(Box<Continuation>),
    RemoveSelf,
    RemovingSelf(Box<Continuation>),
    Finished,
}

/// Replace the text of the whole run of adjacent text nodes around `node`
/// with `content`. The run is gathered previous-sibling-ward first, then
/// forward, stopping at the first non-text sibling in each direction; every
/// node in the run except `node` is removed. Empty content removes `node`
/// too and settles with no node.
pub fn replace_whole_text(
    env: &Environment,
    node: NodeId,
    content: &str,
) -> Result<OpOutcome, OpError> {
    let targets = {
        let doc = env.document();
        let doc = doc.borrow();
        if !doc.is_text(node) {
            return Err(OpError::WrongNodeKind);
        }
        let mut backward = Vec::new();
        let mut cursor = doc.previous_sibling(node);
        while let Some(sibling) = cursor {
            if !doc.is_text(sibling) {
                break;
            }
            backward.push(sibling);
            cursor = doc.previous_sibling(sibling);
        }
        backward.reverse();
        let mut targets = backward;
        cursor = doc.next_sibling(node);
        while let Some(sibling) = cursor {
            if !doc.is_text(sibling) {
                break;
            }
            targets.push(sibling);
            cursor = doc.next_sibling(sibling);
        }
        targets
    };

    step_replace_whole_text(
        env,
        ReplaceWholeTextOp {
            node,
            content: content.to_string(),
            targets,
            next: 0,
            stage: WholeTextStage::SetContent,
        },
    )
}

fn step_replace_whole_text(
    env: &Environment,
    op: ReplaceWholeTextOp,
) -> Result<OpOutcome, OpError> {
    let ReplaceWholeTextOp {
        node,
        content,
        targets,
        mut next,
        mut stage,
    } = op;
    loop {
        stage = match stage {
            WholeTextStage::SetContent => {
                if content.is_empty() {
                    WholeTextStage::RemoveSiblings
                } else {
                    let char_len = {
                        let doc = env.document();
                        let doc = doc.borrow();
                        doc.text(node)
                            .ok_or(OpError::WrongNodeKind)?
                            .chars()
                            .count()
                    };
                    match replace_data(env, node, 0, char_len, &content)? {
                        OpOutcome::Suspended(inner) => {
                            return suspended(OpState::ReplaceWholeText(ReplaceWholeTextOp {
                                node,
                                content,
                                targets,
                                next,
                                stage: WholeTextStage::SettingContent(Box::new(inner)),
                            }));
                        }
                        OpOutcome::Complete(_) => WholeTextStage::RemoveSiblings,
                    }
                }
            }
            WholeTextStage::SettingContent(mut inner) => match inner.resume(env)? {
                OpOutcome::Suspended(again) => {
                    return suspended(OpState::ReplaceWholeText(ReplaceWholeTextOp {
                        node,
                        content,
                        targets,
                        next,
                        stage: WholeTextStage::SettingContent(Box::new(again)),
                    }));
                }
                OpOutcome::Complete(_) => WholeTextStage::RemoveSiblings,
            },
            WholeTextStage::RemoveSiblings => {
                if next < targets.len() {
                    let target = targets[next];
                    next += 1;
                    let parent = env.document().borrow().parent(target);
                    match parent {
                        // A listener already pulled this sibling out of the
                        // run; nothing left to remove.
                        None => WholeTextStage::RemoveSiblings,
                        Some(parent) => match remove_child(env, parent, target)? {
                            OpOutcome::Suspended(inner) => {
                                return suspended(OpState::ReplaceWholeText(ReplaceWholeTextOp {
                                    node,
                                    content,
                                    targets,
                                    next,
                                    stage: WholeTextStage::RemovingSibling(Box::new(inner)),
                                }));
                            }
                            OpOutcome::Complete(_) => WholeTextStage::RemoveSiblings,
                        },
                    }
                } else {
                    WholeTextStage::RemoveSelf
                }
            }
            WholeTextStage::RemovingSibling(mut inner) => match inner.resume(env)? {
                OpOutcome::Suspended(again) => {
                    return suspended(OpState::ReplaceWholeText(ReplaceWholeTextOp {
                        node,
                        content,
                        targets,
                        next,
                        stage: WholeTextStage::RemovingSibling(Box::new(again)),
                    }));
                }
                OpOutcome::Complete(_) => WholeTextStage::RemoveSiblings,
            },
            WholeTextStage::RemoveSelf => {
                if content.is_empty() {
                    let parent = env.document().borrow().parent(node);
                    match parent {
                        None => WholeTextStage::Finished,
                        Some(parent) => match remove_child(env, parent, node)? {
                            OpOutcome::Suspended(inner) => {
                                return suspended(OpState::ReplaceWholeText(ReplaceWholeTextOp {
                                    node,
                                    content,
                                    targets,
                                    next,
                                    stage: WholeTextStage::RemovingSelf(Box::new(inner)),
                                }));
                            }
                            OpOutcome::Complete(_) => WholeTextStage::Finished,
                        },
                    }
                } else {
                    WholeTextStage::Finished
                }
            }
            WholeTextStage::RemovingSelf(mut inner) => match inner.resume(env)? {
                OpOutcome::Suspended(again) => {
                    return suspended(OpState::ReplaceWholeText(ReplaceWholeTextOp {
                        node,
                        content,
                        targets,
                        next,
                        stage: WholeTextStage::RemovingSelf(Box::new(again)),
                    }));
                }
                OpOutcome::Complete(_) => WholeTextStage::Finished,
            },
            WholeTextStage::Finished => {
                let retained = if content.is_empty() { None } else { Some(node) };
                return Ok(OpOutcome::Complete(OpValue::MaybeNode(retained)));
            }
        };
    }
}

// ---------------------------------------------------------------------------
// attribute writes

pub(crate) struct AttributeWriteOp {
    element: NodeId,
    name: String,
    change: AttrChange,
    prev: Option<String>,
    new: Option<String>,
    stage: AttributeStage,
}

enum AttributeStage {
    Notify,
    Finished,
}

/// Write an attribute and raise the attribute-modified notification with
/// the appropriate change kind.
pub fn set_attribute(
    env: &Environment,
    element: NodeId,
    name: &str,
    value: &str,
) -> Result<OpOutcome, OpError> {
    let prev = {
        let doc = env.document();
        let mut doc = doc.borrow_mut();
        if !doc.is_element(element) {
            return Err(OpError::WrongNodeKind);
        }
        doc.set_attribute_raw(element, name, value)
    };
    let change = if prev.is_some() {
        AttrChange::Modification
    } else {
        AttrChange::Addition
    };
    step_attribute_write(
        env,
        AttributeWriteOp {
            element,
            name: name.to_string(),
            change,
            prev,
            new: Some(value.to_string()),
            stage: AttributeStage::Notify,
        },
    )
}

/// Remove an attribute. Removing an absent attribute settles immediately
/// and raises nothing.
pub fn remove_attribute(
    env: &Environment,
    element: NodeId,
    name: &str,
) -> Result<OpOutcome, OpError> {
    let prev = {
        let doc = env.document();
        let mut doc = doc.borrow_mut();
        if !doc.is_element(element) {
            return Err(OpError::WrongNodeKind);
        }
        doc.remove_attribute_raw(element, name)
    };
    let Some(prev) = prev else {
        return Ok(OpOutcome::Complete(OpValue::Unit));
    };
    step_attribute_write(
        env,
        AttributeWriteOp {
            element,
            name: name.to_string(),
            change: AttrChange::Removal,
            prev: Some(prev),
            new: None,
            stage: AttributeStage::Notify,
        },
    )
}

fn step_attribute_write(env: &Environment, op: AttributeWriteOp) -> Result<OpOutcome, OpError> {
    let AttributeWriteOp {
        element,
        name,
        change,
        prev,
        new,
        mut stage,
    } = op;
    loop {
        stage = match stage {
            AttributeStage::Notify => {
                let outcome = notify::attribute_modified(
                    env,
                    element,
                    change,
                    &name,
                    prev.clone(),
                    new.clone(),
                    None,
                )?;
                if outcome.must_suspend {
                    return suspended(OpState::AttributeWrite(AttributeWriteOp {
                        element,
                        name,
                        change,
                        prev,
                        new,
                        stage: AttributeStage::Finished,
                    }));
                }
                AttributeStage::Finished
            }
            AttributeStage::Finished => return Ok(OpOutcome::Complete(OpValue::Unit)),
        };
    }
}
