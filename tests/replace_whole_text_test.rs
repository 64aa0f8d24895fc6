use std::rc::Rc;

use riptide::ops::{self, OpError};
use riptide::{Environment, EventType, ListenerGroup, NodeId, OpOutcome, OpValue, TraceEntry};

/// Children of the parent: <span> "aa" "bb" "cc" "dd" <span> "ee".
/// The whole-text run around "cc" is aa..dd; "ee" sits past an element and
/// is out of reach.
fn mixed_run(env: &Environment) -> (NodeId, Vec<NodeId>) {
    let doc = env.document();
    let mut doc = doc.borrow_mut();
    let root = doc.root();
    let parent = doc.create_element("p");
    doc.splice_before(root, parent, None);

    let leading_span = doc.create_element("span");
    let aa = doc.create_text("aa");
    let bb = doc.create_text("bb");
    let cc = doc.create_text("cc");
    let dd = doc.create_text("dd");
    let trailing_span = doc.create_element("span");
    let ee = doc.create_text("ee");
    for node in [leading_span, aa, bb, cc, dd, trailing_span, ee] {
        doc.splice_before(parent, node, None);
    }
    (parent, vec![leading_span, aa, bb, cc, dd, trailing_span, ee])
}

#[test]
fn visits_run_in_document_order_and_stops_at_elements() {
    let env = Environment::new();
    let (parent, nodes) = mixed_run(&env);
    let &[leading_span, aa, bb, cc, dd, trailing_span, ee] = nodes.as_slice() else {
        panic!("expected seven children");
    };

    // A removal listener anywhere turns on the notification path so the
    // trace records the order siblings are visited in.
    env.add_listener(
        parent,
        EventType::DomNodeRemoved,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(|_, _| Ok(())),
    );

    let outcome = ops::replace_whole_text(&env, cc, "merged").expect("replace");
    let OpOutcome::Complete(OpValue::MaybeNode(Some(retained))) = outcome else {
        panic!("content was non-empty, the node must be retained");
    };
    assert_eq!(retained, cc);

    let doc = env.document();
    {
        let doc = doc.borrow();
        assert_eq!(doc.text(cc), Some("merged"));
        assert_eq!(
            doc.children(parent),
            &[leading_span, cc, trailing_span, ee],
            "run siblings removed, bounded by the first non-text in each direction"
        );
    }

    let removed_order: Vec<NodeId> = env
        .drain_trace()
        .into_iter()
        .filter_map(|entry| match entry {
            TraceEntry::Notified {
                ty: EventType::DomNodeRemoved,
                target,
                ..
            } => Some(target),
            _ => None,
        })
        .collect();
    assert_eq!(
        removed_order,
        vec![aa, bb, dd],
        "previous-sibling-ward first, then forward"
    );
}

#[test]
fn empty_content_removes_the_node_itself() {
    let env = Environment::new();
    let (parent, nodes) = mixed_run(&env);
    let cc = nodes[3];

    let outcome = ops::replace_whole_text(&env, cc, "").expect("replace");
    let OpOutcome::Complete(OpValue::MaybeNode(retained)) = outcome else {
        panic!("replace settles synchronously without listeners");
    };
    assert_eq!(retained, None);

    let doc = env.document();
    let doc = doc.borrow();
    assert!(
        !doc.children(parent).contains(&cc),
        "empty content removes the node too"
    );
}

#[test]
fn lone_text_node_just_rewrites() {
    let env = Environment::new();
    let node = {
        let doc = env.document();
        let mut doc = doc.borrow_mut();
        let root = doc.root();
        let parent = doc.create_element("p");
        let node = doc.create_text("old");
        doc.splice_before(root, parent, None);
        doc.splice_before(parent, node, None);
        node
    };

    let outcome = ops::replace_whole_text(&env, node, "new").expect("replace");
    assert!(matches!(
        outcome,
        OpOutcome::Complete(OpValue::MaybeNode(Some(n))) if n == node
    ));
    assert_eq!(env.document().borrow().text(node), Some("new"));
}

#[test]
fn rejects_non_text_nodes() {
    let env = Environment::new();
    let (parent, _nodes) = mixed_run(&env);
    assert!(matches!(
        ops::replace_whole_text(&env, parent, "x"),
        Err(OpError::WrongNodeKind)
    ));
}

#[test]
fn suspension_mid_run_resumes_with_the_remaining_siblings() {
    let env = Environment::new();
    let (parent, nodes) = mixed_run(&env);
    let &[_, aa, bb, cc, dd, ..] = nodes.as_slice() else {
        panic!("expected seven children");
    };

    // Block the thread while the first sibling removal notifies, forcing
    // the operation to suspend partway through the run.
    env.add_listener(
        parent,
        EventType::DomNodeRemoved,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(move |env, event| {
            if event.target() == Some(aa) {
                env.scheduler().current_thread().block();
            }
            Ok(())
        }),
    );

    let outcome = ops::replace_whole_text(&env, cc, "merged").expect("replace");
    let OpOutcome::Suspended(continuation) = outcome else {
        panic!("blocked thread must force a suspension");
    };

    env.scheduler().current_thread().unblock();
    let settled = riptide::drive(&env, OpOutcome::Suspended(continuation)).expect("drive");
    let OpOutcome::Complete(OpValue::MaybeNode(Some(retained))) = settled else {
        panic!("drive must settle once the thread is unblocked");
    };
    assert_eq!(retained, cc);

    let doc = env.document();
    let doc = doc.borrow();
    assert_eq!(doc.text(cc), Some("merged"));
    assert!(!doc.children(parent).contains(&bb));
    assert!(!doc.children(parent).contains(&dd));
}
