use std::rc::Rc;

use riptide::ops::{self, OpError};
use riptide::{
    drive, Environment, EventType, ListenerGroup, NodeId, OpOutcome, OpValue, ResumeError,
};

fn element_under_root(env: &Environment, tag: &str) -> NodeId {
    let doc = env.document();
    let mut doc = doc.borrow_mut();
    let root = doc.root();
    let el = doc.create_element(tag);
    doc.splice_before(root, el, None);
    el
}

#[test]
fn operations_settle_synchronously_when_nothing_blocks() {
    let env = Environment::new();
    let el = element_under_root(&env, "div");
    let outcome = ops::set_attribute(&env, el, "class", "box").expect("set");
    assert!(matches!(
        outcome,
        OpOutcome::Complete(OpValue::Unit)
    ));
    assert_eq!(
        env.document().borrow().attribute(el, "class"),
        Some("box")
    );
}

#[test]
fn blocked_thread_forces_suspension_and_resume_finishes() {
    let env = Environment::new();
    let el = element_under_root(&env, "div");

    env.add_listener(
        el,
        EventType::DomAttrModified,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(|env, _event| {
            env.scheduler().current_thread().block();
            Ok(())
        }),
    );

    let outcome = ops::set_attribute(&env, el, "class", "box").expect("set");
    let OpOutcome::Suspended(mut continuation) = outcome else {
        panic!("blocked thread must force a suspension");
    };

    // The attribute write itself already happened; only the operation's
    // completion is outstanding.
    assert_eq!(env.document().borrow().attribute(el, "class"), Some("box"));

    env.scheduler().current_thread().unblock();
    let resumed = continuation.resume(&env).expect("resume");
    assert!(matches!(resumed, OpOutcome::Complete(OpValue::Unit)));
}

#[test]
fn double_resume_is_rejected_not_replayed() {
    let env = Environment::new();
    let el = element_under_root(&env, "div");

    env.add_listener(
        el,
        EventType::DomAttrModified,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(|env, _event| {
            env.scheduler().current_thread().block();
            Ok(())
        }),
    );

    let outcome = ops::set_attribute(&env, el, "id", "first").expect("set");
    let OpOutcome::Suspended(mut continuation) = outcome else {
        panic!("blocked thread must force a suspension");
    };
    env.scheduler().current_thread().unblock();

    continuation.resume(&env).expect("first resume");
    assert!(matches!(
        continuation.resume(&env),
        Err(OpError::Resume(ResumeError::StaleContinuation))
    ));

    // The side effect was applied exactly once.
    assert_eq!(env.document().borrow().attribute(el, "id"), Some("first"));
    let notified = env
        .drain_trace()
        .iter()
        .filter(|entry| matches!(entry, riptide::TraceEntry::Notified { .. }))
        .count();
    assert_eq!(notified, 1, "one attribute notification, never replayed");
}

#[test]
fn drive_hands_back_the_continuation_while_still_blocked() {
    let env = Environment::new();
    let el = element_under_root(&env, "div");

    env.add_listener(
        el,
        EventType::DomAttrModified,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(|env, _event| {
            env.scheduler().current_thread().block();
            Ok(())
        }),
    );

    let outcome = ops::set_attribute(&env, el, "class", "box").expect("set");
    assert!(outcome.is_suspended());

    // Still blocked: the trampoline refuses to spin and yields the record.
    let parked = drive(&env, outcome).expect("drive");
    let OpOutcome::Suspended(parked) = parked else {
        panic!("drive must not settle a blocked operation");
    };

    env.scheduler().current_thread().unblock();
    let settled = drive(&env, OpOutcome::Suspended(parked)).expect("drive");
    assert!(matches!(settled, OpOutcome::Complete(OpValue::Unit)));
}

#[test]
fn nested_suspensions_propagate_through_insert_before() {
    let env = Environment::new();
    let parent = element_under_root(&env, "ul");
    let child = env.document().borrow_mut().create_element("li");

    // Both the insertion and the subtree notifications block in turn: the
    // operation must suspend twice and settle on the third leg.
    env.add_listener(
        parent,
        EventType::DomNodeInserted,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(|env, _event| {
            env.scheduler().current_thread().block();
            Ok(())
        }),
    );
    env.add_listener(
        parent,
        EventType::DomSubtreeModified,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(|env, _event| {
            env.scheduler().current_thread().block();
            Ok(())
        }),
    );

    let outcome = ops::insert_before(&env, parent, child, None).expect("insert");
    let OpOutcome::Suspended(mut continuation) = outcome else {
        panic!("first notification blocks");
    };

    env.scheduler().current_thread().unblock();
    let second = continuation.resume(&env).expect("resume");
    let OpOutcome::Suspended(mut continuation) = second else {
        panic!("subtree notification blocks again");
    };

    env.scheduler().current_thread().unblock();
    let settled = continuation.resume(&env).expect("resume");
    assert!(matches!(
        settled,
        OpOutcome::Complete(OpValue::Node(node)) if node == child
    ));
    assert_eq!(env.document().borrow().parent(child), Some(parent));
}

#[test]
fn remove_child_revalidates_after_pre_removal_notifications() {
    let env = Environment::new();
    let parent = element_under_root(&env, "div");
    let child = {
        let doc = env.document();
        let mut doc = doc.borrow_mut();
        let child = doc.create_element("span");
        doc.splice_before(parent, child, None);
        child
    };

    // The pre-removal notification moves the child away; the detach step
    // must notice instead of detaching blindly.
    env.add_listener(
        child,
        EventType::DomNodeRemoved,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(move |env, _event| {
            env.document().borrow_mut().detach(child);
            Ok(())
        }),
    );

    assert!(matches!(
        ops::remove_child(&env, parent, child),
        Err(OpError::NotFound)
    ));
}

#[test]
fn send_event_interrogates_the_named_interrupting_thread() {
    let env = Environment::new();
    let el = element_under_root(&env, "div");
    env.add_listener(
        el,
        EventType::Click,
        false,
        ListenerGroup::DEFAULT,
        Rc::new(|_, _| Ok(())),
    );

    let other = env.scheduler().spawn();
    other.block();

    let mut event = riptide::Event::trusted(EventType::Click, riptide::EventPayload::None);
    event.set_target(el);
    let outcome = env
        .send_event(&mut event, Some(&other))
        .expect("send");
    assert!(
        outcome.thread_blocked,
        "the named thread is blocked even though the current one is not"
    );

    let mut event = riptide::Event::trusted(EventType::Click, riptide::EventPayload::None);
    event.set_target(el);
    let outcome = env.send_event(&mut event, None).expect("send");
    assert!(!outcome.thread_blocked);
}

#[test]
fn structural_validation_runs_before_any_edit() {
    let env = Environment::new();
    let parent = element_under_root(&env, "div");
    let child = env.document().borrow_mut().create_element("span");

    // Not a child yet.
    assert!(matches!(
        ops::remove_child(&env, parent, child),
        Err(OpError::NotFound)
    ));

    env.document().borrow_mut().splice_before(parent, child, None);

    // Inserting an ancestor under its own descendant is a cycle.
    assert!(matches!(
        ops::insert_before(&env, child, parent, None),
        Err(OpError::HierarchyRequest)
    ));

    // The anchor must be a child of the parent.
    let stranger = env.document().borrow_mut().create_element("b");
    let node = env.document().borrow_mut().create_element("i");
    assert!(matches!(
        ops::insert_before(&env, parent, node, Some(stranger)),
        Err(OpError::NotFound),
    ));
}
