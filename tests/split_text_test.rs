use std::rc::Rc;

use riptide::ops::{self, OpError};
use riptide::{Environment, EventType, ListenerGroup, NodeId, OpOutcome, OpValue};

fn text_in_div(env: &Environment, content: &str) -> (NodeId, NodeId) {
    let doc = env.document();
    let mut doc = doc.borrow_mut();
    let root = doc.root();
    let parent = doc.create_element("div");
    let node = doc.create_text(content);
    doc.splice_before(root, parent, None);
    doc.splice_before(parent, node, None);
    (parent, node)
}

#[test]
fn split_hello_at_two() {
    let env = Environment::new();
    let (parent, node) = text_in_div(&env, "hello");

    let outcome = ops::split_text(&env, node, 2).expect("split");
    let OpOutcome::Complete(value) = outcome else {
        panic!("nothing was listening, the split must settle synchronously");
    };
    let tail = value.node().expect("tail node");

    let doc = env.document();
    let doc = doc.borrow();
    assert_eq!(doc.text(node), Some("he"));
    assert_eq!(doc.text(tail), Some("llo"));
    assert_eq!(doc.children(parent), &[node, tail]);
    assert_eq!(doc.next_sibling(node), Some(tail));
}

#[test]
fn split_at_ends_and_out_of_range() {
    let env = Environment::new();
    let (_parent, node) = text_in_div(&env, "hi");

    // Offset equal to the length is legal and yields an empty tail.
    let outcome = ops::split_text(&env, node, 2).expect("split at end");
    let tail = outcome.complete_value().and_then(OpValue::node).unwrap();
    assert_eq!(env.document().borrow().text(tail), Some(""));

    let env = Environment::new();
    let (_parent, node) = text_in_div(&env, "hi");
    assert!(matches!(
        ops::split_text(&env, node, 3),
        Err(OpError::IndexSize)
    ));
}

#[test]
fn split_of_non_text_node_is_rejected() {
    let env = Environment::new();
    let (parent, _node) = text_in_div(&env, "hello");
    assert!(matches!(
        ops::split_text(&env, parent, 1),
        Err(OpError::WrongNodeKind)
    ));
}

#[test]
fn parentless_split_skips_insertion() {
    let env = Environment::new();
    let node = env.document().borrow_mut().create_text("abcd");

    let outcome = ops::split_text(&env, node, 1).expect("split");
    let tail = outcome.complete_value().and_then(OpValue::node).unwrap();

    let doc = env.document();
    let doc = doc.borrow();
    assert_eq!(doc.text(node), Some("a"));
    assert_eq!(doc.text(tail), Some("bcd"));
    assert_eq!(doc.parent(tail), None);
}

#[test]
fn listener_removing_original_mid_split_invalidates_the_operation() {
    let env = Environment::new();
    let (parent, node) = text_in_div(&env, "hello");

    // The insertion of the tail raises DOMNodeInserted, which bubbles to
    // the parent; this listener rips the original node out of the tree
    // before the shorten step runs.
    env.add_listener(
        parent,
        EventType::DomNodeInserted,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(move |env, _event| {
            env.document().borrow_mut().detach(node);
            Ok(())
        }),
    );

    assert!(matches!(
        ops::split_text(&env, node, 2),
        Err(OpError::StructureInvalidated)
    ));
}

#[test]
fn suspended_split_reports_invalidation_on_resume() {
    let env = Environment::new();
    let (parent, node) = text_in_div(&env, "hello");

    // The insertion listener both blocks the script thread (forcing the
    // split to suspend after step one) and removes the original node.
    env.add_listener(
        parent,
        EventType::DomNodeInserted,
        true,
        ListenerGroup::DEFAULT,
        Rc::new(move |env, _event| {
            env.document().borrow_mut().detach(node);
            env.scheduler().current_thread().block();
            Ok(())
        }),
    );

    let outcome = ops::split_text(&env, node, 2).expect("split suspends, not errors");
    let OpOutcome::Suspended(mut continuation) = outcome else {
        panic!("blocked thread must force a suspension");
    };

    env.scheduler().current_thread().unblock();
    assert!(matches!(
        continuation.resume(&env),
        Err(OpError::StructureInvalidated)
    ));
}

#[test]
fn suspended_split_completes_when_tree_is_untouched() {
    let env = Environment::new();
    let (parent, node) = text_in_div(&env, "hello");

    env.add_listener(
        parent,
        EventType::DomNodeInserted,
        true,
        ListenerGroup::DEFAULT,
        Rc::new(|env, _event| {
            env.scheduler().current_thread().block();
            Ok(())
        }),
    );

    let outcome = ops::split_text(&env, node, 2).expect("split");
    let OpOutcome::Suspended(mut continuation) = outcome else {
        panic!("blocked thread must force a suspension");
    };

    env.scheduler().current_thread().unblock();
    let resumed = continuation.resume(&env).expect("resume");
    let OpOutcome::Complete(value) = resumed else {
        panic!("nothing blocks the remaining steps");
    };
    let tail = value.node().expect("tail");

    let doc = env.document();
    let doc = doc.borrow();
    assert_eq!(doc.text(node), Some("he"));
    assert_eq!(doc.text(tail), Some("llo"));
    assert_eq!(doc.next_sibling(node), Some(tail));
}
